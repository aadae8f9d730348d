//! Servicio de créditos de cuenta

use std::sync::Arc;
use tracing::info;

use crate::models::RequestContext;
use crate::repositories::AccountLedger;
use crate::utils::errors::{validation_error, AppResult};

pub struct AccountService {
    ledger: Arc<dyn AccountLedger>,
}

impl AccountService {
    pub fn new(ledger: Arc<dyn AccountLedger>) -> Self {
        Self { ledger }
    }

    pub async fn balance(&self, ctx: &RequestContext) -> AppResult<i64> {
        self.ledger.get_balance(ctx.account_id).await
    }

    /// Recargar créditos; solo cantidades positivas
    pub async fn add_credits(&self, ctx: &RequestContext, amount: i64) -> AppResult<i64> {
        if amount <= 0 {
            return Err(validation_error("amount", "amount must be a positive number of credits"));
        }

        let balance = self.ledger.apply_delta(ctx.account_id, amount).await?;
        info!("💰 {} créditos añadidos a {} (saldo {})", amount, ctx.account_id, balance);
        Ok(balance)
    }
}
