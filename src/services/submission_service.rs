//! Ciclo de vida de las submissions
//!
//! NotReady -> Ready por edición de parámetros (y de vuelta si se borra uno),
//! Ready -> Executed solo a través de `run`. Cada operación de escritura toma un
//! permiso del `RunRegistry`, así que para una misma submission hay como mucho
//! un escritor a la vez.

use std::sync::Arc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;
use validator::ValidationErrors;

use super::billing::credits_for;
use super::dataset_resolver::DatasetResolver;
use super::output_parser::parse_solver_output;
use super::run_registry::{RunPermit, RunRegistry};
use super::solver_runner::{SolverInvocation, SolverRunner};
use crate::models::{
    ExecutionResult, LocationsSelector, ParameterUpdate, RequestContext, Submission,
    SubmissionParameters, SubmissionStatus, SubmissionUpdate,
};
use crate::repositories::{AccountLedger, SubmissionStore};
use crate::utils::errors::{forbidden_error, not_found_error, state_error, AppError, AppResult};
use crate::utils::validation::{validate_enum, validate_length, validate_range};

const MAX_NAME_LENGTH: usize = 200;

pub struct SubmissionService {
    store: Arc<dyn SubmissionStore>,
    ledger: Arc<dyn AccountLedger>,
    runner: Arc<dyn SolverRunner>,
    datasets: Arc<dyn DatasetResolver>,
    in_flight: RunRegistry,
}

impl SubmissionService {
    pub fn new(
        store: Arc<dyn SubmissionStore>,
        ledger: Arc<dyn AccountLedger>,
        runner: Arc<dyn SolverRunner>,
        datasets: Arc<dyn DatasetResolver>,
    ) -> Self {
        Self {
            store,
            ledger,
            runner,
            datasets,
            in_flight: RunRegistry::new(),
        }
    }

    /// Crear una submission vacía para la cuenta que llama
    pub async fn create(&self, ctx: &RequestContext) -> AppResult<Submission> {
        let id = self.store.create(ctx.account_id).await?;
        info!("🆕 Submission {} creada por {}", id, ctx.account_id);

        self.store
            .get(id)
            .await?
            .ok_or_else(|| not_found_error("Submission", &id.to_string()))
    }

    pub async fn get(&self, ctx: &RequestContext, id: Uuid) -> AppResult<Submission> {
        self.load_authorized(ctx, id, "view submission").await
    }

    /// Los administradores ven todas; el resto, solo las propias
    pub async fn list(&self, ctx: &RequestContext) -> AppResult<Vec<Submission>> {
        if ctx.is_admin {
            self.store.list_all().await
        } else {
            self.store.list_by_owner(ctx.account_id).await
        }
    }

    /// Editar parámetros y recalcular NotReady <-> Ready
    pub async fn set_parameters(
        &self,
        ctx: &RequestContext,
        id: Uuid,
        update: ParameterUpdate,
    ) -> AppResult<Submission> {
        let _permit = self.acquire(id)?;
        let submission = self.load_authorized(ctx, id, "edit submission").await?;

        if submission.status == SubmissionStatus::Executed {
            return Err(state_error(format!(
                "Submission {} was already executed; its parameters are frozen",
                id
            )));
        }

        let (name, parameters) = apply_parameter_update(&submission, update)?;
        let status = parameters.readiness();

        if status != submission.status {
            info!(
                "🔄 Submission {}: {:?} -> {:?}",
                id, submission.status, status
            );
        }

        self.store
            .update(
                id,
                SubmissionUpdate::Parameters {
                    name,
                    parameters,
                    status,
                },
            )
            .await
    }

    /// Ejecutar el solver sobre una submission Ready.
    ///
    /// Cualquier resultado del proceso (éxito, salida distinta de cero, timeout)
    /// queda registrado y la submission pasa a Executed. La ejecución corre en
    /// su propia tarea: si quien llama abandona la espera, el resultado se
    /// guarda igualmente.
    pub async fn run(&self, ctx: &RequestContext, id: Uuid) -> AppResult<Submission> {
        let permit = self.acquire(id)?;
        let submission = self.load_authorized(ctx, id, "run submission").await?;

        if submission.status != SubmissionStatus::Ready {
            return Err(state_error(format!(
                "Submission {} is {:?}; only ready submissions can run",
                id, submission.status
            )));
        }

        let params = submission.parameters.ready().ok_or_else(|| {
            AppError::Internal(format!("Submission {} is ready without parameters", id))
        })?;

        let invocation = SolverInvocation {
            dataset_path: self.datasets.path_for(params.locations_selector)?,
            num_vehicles: params.num_vehicles,
            depot: params.depot,
            max_distance: params.max_distance,
        };

        info!(
            "🚀 Ejecutando submission {} ({} vehículos, depot {}, distancia máxima {})",
            id, params.num_vehicles, params.depot, params.max_distance
        );

        let execution = RunExecution {
            store: Arc::clone(&self.store),
            ledger: Arc::clone(&self.ledger),
            runner: Arc::clone(&self.runner),
            owner_id: submission.owner_id,
            invocation,
            permit,
        };

        tokio::spawn(execution.execute()).await.map_err(|e| {
            error!("❌ Tarea de ejecución de {} abortada: {}", id, e);
            AppError::Internal(format!("Run of submission {} did not complete", id))
        })?
    }

    /// Borrar en cualquier estado; no toca el saldo
    pub async fn delete(&self, ctx: &RequestContext, id: Uuid) -> AppResult<()> {
        let _permit = self.acquire(id)?;
        self.load_authorized(ctx, id, "delete submission").await?;

        if !self.store.delete(id).await? {
            return Err(not_found_error("Submission", &id.to_string()));
        }
        info!("🗑️ Submission {} eliminada por {}", id, ctx.account_id);
        Ok(())
    }

    pub fn is_running(&self, id: Uuid) -> bool {
        self.in_flight.is_active(id)
    }

    fn acquire(&self, id: Uuid) -> AppResult<RunPermit> {
        let permit = self
            .in_flight
            .try_acquire(id)
            .ok_or_else(|| state_error(format!("Submission {} has an operation in progress", id)))?;
        debug!("🔒 Submission {} bloqueada para escritura", permit.id());
        Ok(permit)
    }

    async fn load_authorized(
        &self,
        ctx: &RequestContext,
        id: Uuid,
        operation: &str,
    ) -> AppResult<Submission> {
        let submission = self
            .store
            .get(id)
            .await?
            .ok_or_else(|| not_found_error("Submission", &id.to_string()))?;

        if !ctx.can_access(submission.owner_id) {
            return Err(forbidden_error(operation, "submission belongs to another account"));
        }
        Ok(submission)
    }
}

/// Una ejecución ya autorizada; mantiene el permiso hasta guardar el cobro
struct RunExecution {
    store: Arc<dyn SubmissionStore>,
    ledger: Arc<dyn AccountLedger>,
    runner: Arc<dyn SolverRunner>,
    owner_id: Uuid,
    invocation: SolverInvocation,
    permit: RunPermit,
}

impl RunExecution {
    async fn execute(self) -> AppResult<Submission> {
        let id = self.permit.id();

        let result = match self.runner.run(&self.invocation).await {
            Ok(output) if output.success => {
                let report = parse_solver_output(&output.stdout);
                info!(
                    "✅ Submission {}: objetivo {:?}, {} rutas",
                    id,
                    report.objective,
                    report.routes.len()
                );
                ExecutionResult {
                    success: true,
                    objective_value: report.objective,
                    routes: report.routes,
                    raw_result_text: output.stdout,
                    execution_time: output.duration.as_secs_f64(),
                    credits_charged: credits_for(output.duration),
                }
            }
            Ok(output) => {
                warn!(
                    "❌ Submission {}: solver terminó con código {:?}",
                    id, output.exit_code
                );
                ExecutionResult {
                    success: false,
                    objective_value: None,
                    routes: Vec::new(),
                    raw_result_text: output.diagnostic().to_string(),
                    execution_time: output.duration.as_secs_f64(),
                    credits_charged: credits_for(output.duration),
                }
            }
            Err(e) => {
                error!("❌ Submission {}: {}", id, e);
                ExecutionResult {
                    success: false,
                    objective_value: None,
                    routes: Vec::new(),
                    raw_result_text: e.to_string(),
                    execution_time: e.elapsed().as_secs_f64(),
                    credits_charged: credits_for(e.elapsed()),
                }
            }
        };

        let credits = result.credits_charged;
        let executed = self
            .store
            .update(id, SubmissionUpdate::Execution(result))
            .await?;

        if credits > 0 {
            let delta = i64::try_from(credits).map(|c| -c).unwrap_or(i64::MIN);
            let balance = self.ledger.apply_delta(self.owner_id, delta).await?;
            info!(
                "💳 {} créditos cobrados a {} (saldo {})",
                credits, self.owner_id, balance
            );
        }

        Ok(executed)
    }
}

/// Validar la edición completa y devolver nombre y parámetros resultantes.
///
/// Si algún campo es inválido no se aplica ninguno.
fn apply_parameter_update(
    submission: &Submission,
    update: ParameterUpdate,
) -> AppResult<(String, SubmissionParameters)> {
    let mut errors = ValidationErrors::new();
    let mut parameters = submission.parameters.clone();

    let max = i64::from(u32::MAX);

    if let Some(value) = update.num_vehicles {
        parameters.num_vehicles = checked_u32(&mut errors, "num_vehicles", value, 1, max);
    }
    if let Some(value) = update.depot {
        parameters.depot = checked_u32(&mut errors, "depot", value, 0, max);
    }
    if let Some(value) = update.max_distance {
        parameters.max_distance = checked_u32(&mut errors, "max_distance", value, 1, max);
    }
    if let Some(value) = update.locations_selector {
        parameters.locations_selector = value.and_then(|v| {
            match validate_enum(v, &LocationsSelector::ALLOWED) {
                Ok(()) => LocationsSelector::try_from(v).ok(),
                Err(e) => {
                    errors.add("locations_selector", e);
                    None
                }
            }
        });
    }

    let name = match update.name {
        Some(name) => {
            let name = name.trim().to_string();
            if let Err(e) = validate_length(&name, 0, MAX_NAME_LENGTH) {
                errors.add("name", e);
            }
            name
        }
        None => submission.name.clone(),
    };

    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }
    Ok((name, parameters))
}

fn checked_u32(
    errors: &mut ValidationErrors,
    field: &'static str,
    value: Option<i64>,
    min: i64,
    max: i64,
) -> Option<u32> {
    let value = value?;
    match validate_range(value, min, max) {
        Ok(()) => u32::try_from(value).ok(),
        Err(e) => {
            errors.add(field, e);
            None
        }
    }
}
