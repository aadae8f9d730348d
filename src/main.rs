use anyhow::Result;
use dotenvy::dotenv;
use std::net::SocketAddr;
use tokio::signal;
use tracing::{error, info, warn};

use vrp_submissions::config::{DatabaseConfig, EnvironmentConfig};
use vrp_submissions::database::connect_and_migrate;
use vrp_submissions::routes::create_router;
use vrp_submissions::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Cargar variables de entorno
    dotenv().ok();

    let config = EnvironmentConfig::from_env()?;

    // Configurar logging
    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .init();

    info!("🚚 VRP Submissions - API");
    info!("================================================");
    info!("🌍 Entorno: {}", config.environment);
    info!(
        "🧮 Solver: {} (timeout {}s)",
        config.solver.binary.display(),
        config.solver.timeout.as_secs()
    );
    info!("📂 Datasets: {}", config.datasets_dir.display());

    if !config.solver.binary.exists() {
        warn!(
            "⚠️ El binario del solver no existe todavía: {}",
            config.solver.binary.display()
        );
    }

    // Inicializar base de datos
    let db_config = DatabaseConfig::from_env()?;
    let pool = match connect_and_migrate(&db_config).await {
        Ok(pool) => pool,
        Err(e) => {
            error!("❌ Error conectando a la base de datos: {}", e);
            return Err(anyhow::anyhow!("Error de base de datos: {}", e));
        }
    };

    let addr: SocketAddr = config.server_url().parse()?;
    let app = create_router(AppState::new(pool, config));

    info!("🌐 Servidor iniciando en http://{}", addr);
    info!("🔍 Endpoints disponibles:");
    info!("   GET    /health - Health check");
    info!("📋 Submissions:");
    info!("   POST   /api/submissions - Crear submission");
    info!("   GET    /api/submissions - Listar submissions");
    info!("   GET    /api/submissions/:id - Obtener submission");
    info!("   PUT    /api/submissions/:id/parameters - Actualizar parámetros");
    info!("   POST   /api/submissions/:id/run - Ejecutar solver");
    info!("   DELETE /api/submissions/:id - Eliminar submission");
    info!("💳 Cuenta:");
    info!("   GET    /api/account/credits - Consultar créditos");
    info!("   POST   /api/account/credits - Recargar créditos");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("❌ Servidor terminó con error: {}", e);
        return Err(e.into());
    }

    info!("👋 Servidor terminado");
    Ok(())
}

/// Señal de apagado graceful
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("❌ No se pudo instalar el handler de Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("❌ No se pudo instalar el handler de SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("🛑 Señal Ctrl+C recibida, apagando servidor...");
        },
        _ = terminate => {
            info!("🛑 Señal de terminación recibida, apagando servidor...");
        },
    }
}
