//! Repositorios en memoria
//!
//! Implementaciones sin base de datos para desarrollo local y tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{AccountLedger, SubmissionStore};
use crate::models::{Submission, SubmissionUpdate};
use crate::utils::errors::{not_found_error, AppResult};

#[derive(Clone, Default)]
pub struct InMemorySubmissionStore {
    submissions: Arc<RwLock<HashMap<Uuid, Submission>>>,
    updates: Arc<AtomicUsize>,
}

impl InMemorySubmissionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Número de llamadas a `update` que llegaron a escribir
    pub fn update_count(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }

    fn sorted(mut submissions: Vec<Submission>) -> Vec<Submission> {
        submissions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        submissions
    }
}

#[async_trait]
impl SubmissionStore for InMemorySubmissionStore {
    async fn get(&self, id: Uuid) -> AppResult<Option<Submission>> {
        Ok(self.submissions.read().await.get(&id).cloned())
    }

    async fn create(&self, owner_id: Uuid) -> AppResult<Uuid> {
        let id = Uuid::new_v4();
        self.submissions
            .write()
            .await
            .insert(id, Submission::new(id, owner_id));
        Ok(id)
    }

    async fn update(&self, id: Uuid, update: SubmissionUpdate) -> AppResult<Submission> {
        let mut submissions = self.submissions.write().await;
        let submission = submissions
            .get_mut(&id)
            .ok_or_else(|| not_found_error("Submission", &id.to_string()))?;

        submission.apply(update);
        self.updates.fetch_add(1, Ordering::SeqCst);
        Ok(submission.clone())
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        Ok(self.submissions.write().await.remove(&id).is_some())
    }

    async fn list_by_owner(&self, owner_id: Uuid) -> AppResult<Vec<Submission>> {
        let submissions = self.submissions.read().await;
        Ok(Self::sorted(
            submissions
                .values()
                .filter(|s| s.owner_id == owner_id)
                .cloned()
                .collect(),
        ))
    }

    async fn list_all(&self) -> AppResult<Vec<Submission>> {
        let submissions = self.submissions.read().await;
        Ok(Self::sorted(submissions.values().cloned().collect()))
    }
}

/// Las cuentas desconocidas empiezan con saldo 0
#[derive(Clone, Default)]
pub struct InMemoryAccountLedger {
    balances: Arc<RwLock<HashMap<Uuid, i64>>>,
}

impl InMemoryAccountLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_balance(&self, owner_id: Uuid, credits: i64) {
        self.balances.write().await.insert(owner_id, credits);
    }
}

#[async_trait]
impl AccountLedger for InMemoryAccountLedger {
    async fn get_balance(&self, owner_id: Uuid) -> AppResult<i64> {
        Ok(self
            .balances
            .read()
            .await
            .get(&owner_id)
            .copied()
            .unwrap_or(0))
    }

    async fn apply_delta(&self, owner_id: Uuid, delta: i64) -> AppResult<i64> {
        let mut balances = self.balances.write().await;
        let balance = balances.entry(owner_id).or_insert(0);
        *balance = balance.saturating_add(delta);
        Ok(*balance)
    }
}
