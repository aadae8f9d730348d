//! Modelos del sistema
//!
//! Este módulo contiene los modelos de datos tipados que usa el núcleo;
//! las filas de PostgreSQL se convierten a ellos en los repositorios.

pub mod context;
pub mod submission;

pub use context::RequestContext;
pub use submission::*;
