//! Repositorios
//!
//! Interfaces estrechas que consume el núcleo (submissions y saldo de créditos)
//! y sus implementaciones sobre PostgreSQL y en memoria.

pub mod account_repository;
pub mod memory;
pub mod submission_repository;

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{Submission, SubmissionUpdate};
use crate::utils::errors::AppResult;

pub use account_repository::PgAccountLedger;
pub use memory::{InMemoryAccountLedger, InMemorySubmissionStore};
pub use submission_repository::PgSubmissionStore;

/// Persistencia de submissions
#[async_trait]
pub trait SubmissionStore: Send + Sync {
    async fn get(&self, id: Uuid) -> AppResult<Option<Submission>>;

    /// Crea una submission vacía en NotReady y devuelve su id
    async fn create(&self, owner_id: Uuid) -> AppResult<Uuid>;

    /// Aplica la actualización en una sola escritura; `NotFound` si no existe
    async fn update(&self, id: Uuid, update: SubmissionUpdate) -> AppResult<Submission>;

    /// Devuelve `false` si no había nada que borrar
    async fn delete(&self, id: Uuid) -> AppResult<bool>;

    async fn list_by_owner(&self, owner_id: Uuid) -> AppResult<Vec<Submission>>;

    async fn list_all(&self) -> AppResult<Vec<Submission>>;
}

/// Saldo de créditos de cada cuenta
#[async_trait]
pub trait AccountLedger: Send + Sync {
    async fn get_balance(&self, owner_id: Uuid) -> AppResult<i64>;

    /// Suma `delta` (negativo para cobrar) y devuelve el saldo resultante
    async fn apply_delta(&self, owner_id: Uuid, delta: i64) -> AppResult<i64>;
}
