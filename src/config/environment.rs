//! Configuración de variables de entorno
//!
//! Este módulo maneja la configuración del entorno y variables de configuración.

use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use super::solver::SolverConfig;

/// Configuración del entorno
#[derive(Debug, Clone)]
pub struct EnvironmentConfig {
    pub environment: String,
    pub port: u16,
    pub host: String,
    pub log_level: tracing::Level,
    pub cors_origins: Vec<String>,
    pub datasets_dir: PathBuf,
    pub solver: SolverConfig,
}

impl EnvironmentConfig {
    /// Leer la configuración desde el entorno, con valores por defecto
    pub fn from_env() -> Result<Self> {
        let timeout_secs: u64 = env_or("SOLVER_TIMEOUT_SECS", 300)?;

        Ok(Self {
            environment: env_or("ENVIRONMENT", "development".to_string())?,
            port: env_or("PORT", 8000)?,
            host: env_or("HOST", "0.0.0.0".to_string())?,
            log_level: env_or("LOG_LEVEL", tracing::Level::INFO)?,
            cors_origins: env::var("CORS_ORIGINS")
                .map(|origins| {
                    origins
                        .split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
            datasets_dir: env_or("DATASETS_DIR", PathBuf::from("datasets"))?,
            solver: SolverConfig {
                binary: env_or("SOLVER_BINARY", PathBuf::from("./vrp_solver"))?,
                timeout: Duration::from_secs(timeout_secs),
            },
        })
    }

    /// Verificar si estamos en modo desarrollo
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    /// Obtener la URL del servidor
    pub fn server_url(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            port: 8000,
            host: "0.0.0.0".to_string(),
            log_level: tracing::Level::INFO,
            cors_origins: Vec::new(),
            datasets_dir: PathBuf::from("datasets"),
            solver: SolverConfig::default(),
        }
    }
}

/// Leer una variable de entorno o devolver el valor por defecto si no existe
fn env_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("{}", e))
            .with_context(|| format!("{} must be a valid value, got '{}'", key, raw)),
        Err(_) => Ok(default),
    }
}
