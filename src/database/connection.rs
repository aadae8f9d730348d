//! Conexión y migraciones de PostgreSQL
//!
//! El pool se construye desde `DatabaseConfig`; aquí viven las utilidades
//! que se ejecutan una sola vez al arrancar.

use sqlx::PgPool;
use tracing::info;

use crate::config::DatabaseConfig;

/// Crear el pool y aplicar las migraciones pendientes
pub async fn connect_and_migrate(config: &DatabaseConfig) -> anyhow::Result<PgPool> {
    info!("🗄️ Conectando a {}", mask_database_url(&config.url));

    let pool = config.create_pool().await?;
    run_migrations(&pool).await?;

    Ok(pool)
}

/// Ejecutar migraciones de la base de datos
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await?;
    info!("✅ Migraciones aplicadas");
    Ok(())
}

/// Enmascara las credenciales de la URL para poder loguearla
pub fn mask_database_url(url: &str) -> String {
    let Some(at_pos) = url.rfind('@') else {
        return url.to_string();
    };
    let Some(scheme_end) = url.find("://") else {
        return url.to_string();
    };
    if scheme_end + 3 > at_pos {
        return url.to_string();
    }

    format!("{}***:***@{}", &url[..scheme_end + 3], &url[at_pos + 1..])
}
