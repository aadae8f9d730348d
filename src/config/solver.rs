//! Configuración del solver externo

use std::path::PathBuf;
use std::time::Duration;

/// Binario del solver y techo de tiempo por ejecución
#[derive(Debug, Clone)]
pub struct SolverConfig {
    pub binary: PathBuf,
    pub timeout: Duration,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("./vrp_solver"),
            timeout: Duration::from_secs(300), // 5 minutos
        }
    }
}
