//! Configuración del proyecto
//!
//! Este módulo contiene la configuración de base de datos, variables de entorno
//! y del solver externo.

pub mod database;
pub mod environment;
pub mod solver;

pub use database::DatabaseConfig;
pub use environment::*;
pub use solver::SolverConfig;
