//! Shared application state
//!
//! Este módulo define el estado compartido de la aplicación que se pasa
//! a través del router de Axum.

use sqlx::PgPool;
use std::sync::Arc;

use crate::config::environment::EnvironmentConfig;
use crate::repositories::{AccountLedger, PgAccountLedger, PgSubmissionStore, SubmissionStore};
use crate::services::{
    AccountService, DatasetResolver, DirectoryDatasetResolver, ProcessRunner, SolverRunner,
    SubmissionService,
};

#[derive(Clone)]
pub struct AppState {
    pub config: EnvironmentConfig,
    pub submissions: Arc<SubmissionService>,
    pub accounts: Arc<AccountService>,
}

impl AppState {
    /// Estado de producción: PostgreSQL, solver real y datasets en disco
    pub fn new(pool: PgPool, config: EnvironmentConfig) -> Self {
        let store: Arc<dyn SubmissionStore> = Arc::new(PgSubmissionStore::new(pool.clone()));
        let ledger: Arc<dyn AccountLedger> = Arc::new(PgAccountLedger::new(pool));
        let runner: Arc<dyn SolverRunner> = Arc::new(ProcessRunner::new(config.solver.clone()));
        let datasets: Arc<dyn DatasetResolver> =
            Arc::new(DirectoryDatasetResolver::new(config.datasets_dir.clone()));

        Self::from_parts(config, store, ledger, runner, datasets)
    }

    pub fn from_parts(
        config: EnvironmentConfig,
        store: Arc<dyn SubmissionStore>,
        ledger: Arc<dyn AccountLedger>,
        runner: Arc<dyn SolverRunner>,
        datasets: Arc<dyn DatasetResolver>,
    ) -> Self {
        Self {
            config,
            submissions: Arc::new(SubmissionService::new(
                store,
                Arc::clone(&ledger),
                runner,
                datasets,
            )),
            accounts: Arc::new(AccountService::new(ledger)),
        }
    }
}
