//! Middleware del sistema
//!
//! Este módulo contiene el middleware de CORS y la extracción del contexto
//! de cada request.

pub mod cors;
pub mod request_context;

pub use cors::*;
