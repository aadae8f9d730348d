//! Extracción del contexto de la request
//!
//! La autenticación la hace el proxy que está delante; aquí solo se leen las
//! cabeceras que deja (`x-account-id`, `x-account-admin`).

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use crate::models::RequestContext;
use crate::utils::errors::AppError;

pub const ACCOUNT_ID_HEADER: &str = "x-account-id";
pub const ACCOUNT_ADMIN_HEADER: &str = "x-account-admin";

#[async_trait]
impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let account_id = parts
            .headers
            .get(ACCOUNT_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized("Cabecera x-account-id requerida".to_string()))
            .and_then(|value| {
                Uuid::parse_str(value.trim())
                    .map_err(|_| AppError::Unauthorized("x-account-id inválido".to_string()))
            })?;

        let is_admin = parts
            .headers
            .get(ACCOUNT_ADMIN_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(|value| matches!(value.trim(), "true" | "1"))
            .unwrap_or(false);

        Ok(RequestContext {
            account_id,
            is_admin,
        })
    }
}
