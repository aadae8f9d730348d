//! Backend de submissions VRP
//!
//! Ciclo de vida de las submissions, ejecución del solver externo,
//! interpretación de su salida y cobro de créditos por tiempo de ejecución.

pub mod config;
pub mod database;
pub mod dto;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod state;
pub mod utils;

pub use state::AppState;
