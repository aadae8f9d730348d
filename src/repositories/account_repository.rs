use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::AccountLedger;
use crate::utils::errors::{not_found_error, AppError, AppResult};

/// Saldo de créditos sobre la tabla users
pub struct PgAccountLedger {
    pool: PgPool,
}

impl PgAccountLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccountLedger for PgAccountLedger {
    async fn get_balance(&self, owner_id: Uuid) -> AppResult<i64> {
        let balance: Option<(i64,)> = sqlx::query_as("SELECT credits FROM users WHERE id = $1")
            .bind(owner_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::Persistence(format!("Error reading credits: {}", e)))?;

        balance
            .map(|(credits,)| credits)
            .ok_or_else(|| not_found_error("Account", &owner_id.to_string()))
    }

    async fn apply_delta(&self, owner_id: Uuid, delta: i64) -> AppResult<i64> {
        // Incremento atómico en SQL
        let balance: Option<(i64,)> = sqlx::query_as(
            "UPDATE users SET credits = credits + $2 WHERE id = $1 RETURNING credits",
        )
        .bind(owner_id)
        .bind(delta)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Persistence(format!("Error updating credits: {}", e)))?;

        balance
            .map(|(credits,)| credits)
            .ok_or_else(|| not_found_error("Account", &owner_id.to_string()))
    }
}
