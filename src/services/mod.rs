//! Services module
//!
//! Este módulo contiene la lógica de negocio: el ciclo de vida de las
//! submissions, la ejecución del solver externo, el parser de su salida
//! y la facturación de créditos.

pub mod account_service;
pub mod billing;
pub mod dataset_resolver;
pub mod output_parser;
pub mod run_registry;
pub mod solver_runner;
pub mod submission_service;

pub use account_service::AccountService;
pub use dataset_resolver::{DatasetResolver, DirectoryDatasetResolver};
pub use output_parser::{parse_solver_output, SolverReport};
pub use solver_runner::{ProcessError, ProcessRunner, SolverInvocation, SolverOutput, SolverRunner};
pub use submission_service::SubmissionService;
