//! Rutas HTTP
//!
//! Capa fina sobre los servicios; toda la lógica vive en `services`.

pub mod account_routes;
pub mod submission_routes;

use axum::{response::Json, routing::get, Router};
use serde_json::json;
use tower_http::trace::TraceLayer;

use crate::middleware::cors::cors_for;
use crate::state::AppState;

pub fn create_router(state: AppState) -> Router {
    let cors = cors_for(&state.config);

    Router::new()
        .route("/health", get(health_check))
        .nest("/api/submissions", submission_routes::create_submission_router())
        .nest("/api/account", account_routes::create_account_router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Endpoint de salud simple
async fn health_check() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
