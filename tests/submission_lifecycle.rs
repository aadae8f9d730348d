use async_trait::async_trait;
use parking_lot::Mutex;
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use uuid::Uuid;

use vrp_submissions::models::{
    LocationsSelector, ParameterUpdate, RequestContext, RouteResult, SubmissionStatus,
};
use vrp_submissions::repositories::{AccountLedger, InMemoryAccountLedger, InMemorySubmissionStore};
use vrp_submissions::services::{
    DatasetResolver, DirectoryDatasetResolver, ProcessError, SolverInvocation, SolverOutput,
    SolverRunner, SubmissionService,
};
use vrp_submissions::utils::errors::{AppError, AppResult};

const SCENARIO_STDOUT: &str =
    "Objective: 100\nRoute for vehicle 0:\n 0 -> 1 -> 2 -> 0\nDistance of the route: 50m\n";

#[derive(Clone)]
enum Outcome {
    Exited {
        code: i32,
        stdout: String,
        stderr: String,
        duration: Duration,
    },
    TimedOut {
        limit: Duration,
        elapsed: Duration,
    },
    SpawnFailed,
}

/// Runner que devuelve siempre el mismo resultado y cuenta las llamadas
struct ScriptedRunner {
    outcome: Outcome,
    calls: AtomicUsize,
    last: Mutex<Option<SolverInvocation>>,
}

impl ScriptedRunner {
    fn new(outcome: Outcome) -> Arc<Self> {
        Arc::new(Self {
            outcome,
            calls: AtomicUsize::new(0),
            last: Mutex::new(None),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

fn resolve(outcome: &Outcome) -> Result<SolverOutput, ProcessError> {
    match outcome.clone() {
        Outcome::Exited {
            code,
            stdout,
            stderr,
            duration,
        } => Ok(SolverOutput {
            success: code == 0,
            exit_code: Some(code),
            stdout,
            stderr,
            duration,
        }),
        Outcome::TimedOut { limit, elapsed } => Err(ProcessError::Timeout { limit, elapsed }),
        Outcome::SpawnFailed => Err(ProcessError::Spawn {
            binary: "./missing_solver".to_string(),
            source: io::Error::new(io::ErrorKind::NotFound, "No such file or directory"),
        }),
    }
}

#[async_trait]
impl SolverRunner for ScriptedRunner {
    async fn run(&self, invocation: &SolverInvocation) -> Result<SolverOutput, ProcessError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last.lock() = Some(invocation.clone());
        resolve(&self.outcome)
    }
}

/// Runner que se queda bloqueado hasta que el test lo libera
struct GatedRunner {
    started: Notify,
    release: Notify,
    calls: AtomicUsize,
}

#[async_trait]
impl SolverRunner for GatedRunner {
    async fn run(&self, _invocation: &SolverInvocation) -> Result<SolverOutput, ProcessError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.started.notify_one();
        self.release.notified().await;
        Ok(SolverOutput {
            success: true,
            exit_code: Some(0),
            stdout: SCENARIO_STDOUT.to_string(),
            stderr: String::new(),
            duration: Duration::from_millis(1500),
        })
    }
}

struct StaticDatasets(PathBuf);

impl DatasetResolver for StaticDatasets {
    fn path_for(&self, selector: LocationsSelector) -> AppResult<PathBuf> {
        Ok(self.0.join(DirectoryDatasetResolver::file_name(selector)))
    }
}

struct Harness {
    service: Arc<SubmissionService>,
    store: InMemorySubmissionStore,
    ledger: InMemoryAccountLedger,
}

fn harness(runner: Arc<dyn SolverRunner>) -> Harness {
    let store = InMemorySubmissionStore::new();
    let ledger = InMemoryAccountLedger::new();
    let service = SubmissionService::new(
        Arc::new(store.clone()),
        Arc::new(ledger.clone()),
        runner,
        Arc::new(StaticDatasets(PathBuf::from("/data"))),
    );

    Harness {
        service: Arc::new(service),
        store,
        ledger,
    }
}

fn full_parameters() -> ParameterUpdate {
    ParameterUpdate {
        num_vehicles: Some(Some(2)),
        depot: Some(Some(0)),
        max_distance: Some(Some(3000)),
        locations_selector: Some(Some(1)),
        name: None,
    }
}

async fn ready_submission(h: &Harness, ctx: &RequestContext) -> Uuid {
    let submission = h.service.create(ctx).await.unwrap();
    let updated = h
        .service
        .set_parameters(ctx, submission.id, full_parameters())
        .await
        .unwrap();
    assert_eq!(updated.status, SubmissionStatus::Ready);
    submission.id
}

fn exited(code: i32, stdout: &str, stderr: &str, duration: Duration) -> Outcome {
    Outcome::Exited {
        code,
        stdout: stdout.to_string(),
        stderr: stderr.to_string(),
        duration,
    }
}

#[tokio::test]
async fn test_new_submission_is_not_ready() {
    let h = harness(ScriptedRunner::new(Outcome::SpawnFailed));
    let ctx = RequestContext::user(Uuid::new_v4());

    let submission = h.service.create(&ctx).await.unwrap();

    assert_eq!(submission.status, SubmissionStatus::NotReady);
    assert_eq!(submission.owner_id, ctx.account_id);
    assert!(submission.result.is_none());
    assert!(submission.parameters.num_vehicles.is_none());
}

#[tokio::test]
async fn test_parameters_move_between_not_ready_and_ready() {
    let h = harness(ScriptedRunner::new(Outcome::SpawnFailed));
    let ctx = RequestContext::user(Uuid::new_v4());
    let submission = h.service.create(&ctx).await.unwrap();

    let partial = h
        .service
        .set_parameters(
            &ctx,
            submission.id,
            ParameterUpdate {
                num_vehicles: Some(Some(2)),
                depot: Some(Some(0)),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(partial.status, SubmissionStatus::NotReady);

    let ready = h
        .service
        .set_parameters(
            &ctx,
            submission.id,
            ParameterUpdate {
                max_distance: Some(Some(3000)),
                locations_selector: Some(Some(3)),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(ready.status, SubmissionStatus::Ready);
    assert_eq!(ready.parameters.locations_selector, Some(LocationsSelector::Large));

    let cleared = h
        .service
        .set_parameters(
            &ctx,
            submission.id,
            ParameterUpdate {
                max_distance: Some(None),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(cleared.status, SubmissionStatus::NotReady);
    assert_eq!(cleared.parameters.max_distance, None);
    assert_eq!(cleared.parameters.num_vehicles, Some(2));
}

#[tokio::test]
async fn test_invalid_parameters_leave_submission_unchanged() {
    let h = harness(ScriptedRunner::new(Outcome::SpawnFailed));
    let ctx = RequestContext::user(Uuid::new_v4());
    let id = ready_submission(&h, &ctx).await;
    let writes = h.store.update_count();

    let result = h
        .service
        .set_parameters(
            &ctx,
            id,
            ParameterUpdate {
                num_vehicles: Some(Some(5)),
                locations_selector: Some(Some(7)),
                ..Default::default()
            },
        )
        .await;

    assert!(matches!(result, Err(AppError::Validation(_))));
    assert_eq!(h.store.update_count(), writes);

    let current = h.service.get(&ctx, id).await.unwrap();
    assert_eq!(current.status, SubmissionStatus::Ready);
    assert_eq!(current.parameters.num_vehicles, Some(2));
    assert_eq!(current.parameters.locations_selector, Some(LocationsSelector::Small));
}

#[tokio::test]
async fn test_run_requires_ready_submission() {
    let runner = ScriptedRunner::new(exited(0, SCENARIO_STDOUT, "", Duration::from_secs(1)));
    let h = harness(runner.clone());
    let ctx = RequestContext::user(Uuid::new_v4());
    let submission = h.service.create(&ctx).await.unwrap();

    let result = h.service.run(&ctx, submission.id).await;

    assert!(matches!(result, Err(AppError::InvalidState(_))));
    assert_eq!(runner.calls(), 0);
    assert_eq!(h.store.update_count(), 0);
}

#[tokio::test]
async fn test_successful_run_records_routes_and_bills_owner() {
    let runner = ScriptedRunner::new(exited(
        0,
        SCENARIO_STDOUT,
        "",
        Duration::from_millis(2700),
    ));
    let h = harness(runner.clone());
    let ctx = RequestContext::user(Uuid::new_v4());
    h.ledger.set_balance(ctx.account_id, 10).await;
    let id = ready_submission(&h, &ctx).await;

    let executed = h.service.run(&ctx, id).await.unwrap();

    assert_eq!(executed.status, SubmissionStatus::Executed);
    let result = executed.result.expect("executed submission has a result");
    assert!(result.success);
    assert_eq!(result.objective_value, Some(100));
    assert_eq!(
        result.routes,
        vec![RouteResult {
            vehicle_id: 0,
            visited: vec![0, 1, 2, 0],
            distance: Some(50),
        }]
    );
    assert_eq!(result.raw_result_text, SCENARIO_STDOUT);
    assert!((result.execution_time - 2.7).abs() < 1e-9);
    assert_eq!(result.credits_charged, 2);

    // Una escritura para los parámetros y otra para el resultado
    assert_eq!(h.store.update_count(), 2);
    assert_eq!(h.ledger.get_balance(ctx.account_id).await.unwrap(), 8);

    let invocation = runner.last.lock().clone().unwrap();
    assert_eq!(
        invocation.args(),
        vec!["/data/locations_small.json", "2", "0", "3000"]
    );
}

#[tokio::test]
async fn test_failed_run_is_recorded_and_billed() {
    let runner = ScriptedRunner::new(exited(1, "", "infeasible", Duration::from_millis(1200)));
    let h = harness(runner.clone());
    let ctx = RequestContext::user(Uuid::new_v4());
    let id = ready_submission(&h, &ctx).await;

    let executed = h.service.run(&ctx, id).await.unwrap();

    assert_eq!(executed.status, SubmissionStatus::Executed);
    let result = executed.result.unwrap();
    assert!(!result.success);
    assert!(result.raw_result_text.contains("infeasible"));
    assert!(result.routes.is_empty());
    assert_eq!(result.objective_value, None);
    assert_eq!(result.credits_charged, 1);
    assert_eq!(h.ledger.get_balance(ctx.account_id).await.unwrap(), -1);
}

#[tokio::test]
async fn test_failed_run_without_stderr_keeps_stdout() {
    let runner = ScriptedRunner::new(exited(2, "bad depot index", "", Duration::ZERO));
    let h = harness(runner);
    let ctx = RequestContext::user(Uuid::new_v4());
    let id = ready_submission(&h, &ctx).await;

    let result = h.service.run(&ctx, id).await.unwrap().result.unwrap();

    assert!(!result.success);
    assert_eq!(result.raw_result_text, "bad depot index");
    assert_eq!(result.credits_charged, 0);
}

#[tokio::test]
async fn test_timeout_is_recorded_as_failure() {
    let runner = ScriptedRunner::new(Outcome::TimedOut {
        limit: Duration::from_secs(5),
        elapsed: Duration::from_millis(5020),
    });
    let h = harness(runner);
    let ctx = RequestContext::user(Uuid::new_v4());
    h.ledger.set_balance(ctx.account_id, 20).await;
    let id = ready_submission(&h, &ctx).await;

    let executed = h.service.run(&ctx, id).await.unwrap();

    assert_eq!(executed.status, SubmissionStatus::Executed);
    let result = executed.result.unwrap();
    assert!(!result.success);
    assert!(result.raw_result_text.contains("timed out"));
    assert_eq!(result.credits_charged, 5);
    assert_eq!(h.ledger.get_balance(ctx.account_id).await.unwrap(), 15);
}

#[tokio::test]
async fn test_spawn_failure_is_recorded_without_charge() {
    let runner = ScriptedRunner::new(Outcome::SpawnFailed);
    let h = harness(runner);
    let ctx = RequestContext::user(Uuid::new_v4());
    h.ledger.set_balance(ctx.account_id, 3).await;
    let id = ready_submission(&h, &ctx).await;

    let result = h.service.run(&ctx, id).await.unwrap().result.unwrap();

    assert!(!result.success);
    assert!(result.raw_result_text.contains("failed to start solver"));
    assert_eq!(result.credits_charged, 0);
    assert_eq!(h.ledger.get_balance(ctx.account_id).await.unwrap(), 3);
}

#[tokio::test]
async fn test_executed_submission_is_frozen() {
    let runner = ScriptedRunner::new(exited(0, SCENARIO_STDOUT, "", Duration::from_secs(1)));
    let h = harness(runner.clone());
    let ctx = RequestContext::user(Uuid::new_v4());
    let id = ready_submission(&h, &ctx).await;
    h.service.run(&ctx, id).await.unwrap();

    let rerun = h.service.run(&ctx, id).await;
    assert!(matches!(rerun, Err(AppError::InvalidState(_))));
    assert_eq!(runner.calls(), 1);

    let edit = h.service.set_parameters(&ctx, id, full_parameters()).await;
    assert!(matches!(edit, Err(AppError::InvalidState(_))));

    let current = h.service.get(&ctx, id).await.unwrap();
    assert_eq!(current.status, SubmissionStatus::Executed);
    assert_eq!(h.ledger.get_balance(ctx.account_id).await.unwrap(), -1);
}

#[tokio::test]
async fn test_concurrent_runs_spawn_once() {
    let runner = Arc::new(GatedRunner {
        started: Notify::new(),
        release: Notify::new(),
        calls: AtomicUsize::new(0),
    });
    let h = harness(runner.clone());
    let ctx = RequestContext::user(Uuid::new_v4());
    let id = ready_submission(&h, &ctx).await;

    let service = Arc::clone(&h.service);
    let first = tokio::spawn(async move { service.run(&ctx, id).await });

    runner.started.notified().await;
    assert!(h.service.is_running(id));

    let second = h.service.run(&ctx, id).await;
    assert!(matches!(second, Err(AppError::InvalidState(_))));

    let delete = h.service.delete(&ctx, id).await;
    assert!(matches!(delete, Err(AppError::InvalidState(_))));

    runner.release.notify_one();
    let executed = first.await.unwrap().unwrap();

    assert_eq!(executed.status, SubmissionStatus::Executed);
    assert_eq!(runner.calls.load(Ordering::SeqCst), 1);
    assert!(!h.service.is_running(id));
    assert_eq!(h.ledger.get_balance(ctx.account_id).await.unwrap(), -1);
}

#[tokio::test]
async fn test_other_accounts_cannot_touch_submission() {
    let runner = ScriptedRunner::new(exited(0, SCENARIO_STDOUT, "", Duration::from_secs(1)));
    let h = harness(runner.clone());
    let owner = RequestContext::user(Uuid::new_v4());
    let stranger = RequestContext::user(Uuid::new_v4());
    let id = ready_submission(&h, &owner).await;

    assert!(matches!(
        h.service.get(&stranger, id).await,
        Err(AppError::Forbidden(_))
    ));
    assert!(matches!(
        h.service.run(&stranger, id).await,
        Err(AppError::Forbidden(_))
    ));
    assert!(matches!(
        h.service.delete(&stranger, id).await,
        Err(AppError::Forbidden(_))
    ));
    assert_eq!(runner.calls(), 0);

    let admin = RequestContext::admin(Uuid::new_v4());
    let seen = h.service.get(&admin, id).await.unwrap();
    assert_eq!(seen.owner_id, owner.account_id);
}

#[tokio::test]
async fn test_list_is_scoped_to_owner_unless_admin() {
    let h = harness(ScriptedRunner::new(Outcome::SpawnFailed));
    let alice = RequestContext::user(Uuid::new_v4());
    let bob = RequestContext::user(Uuid::new_v4());

    h.service.create(&alice).await.unwrap();
    h.service.create(&alice).await.unwrap();
    h.service.create(&bob).await.unwrap();

    let own = h.service.list(&alice).await.unwrap();
    assert_eq!(own.len(), 2);
    assert!(own.iter().all(|s| s.owner_id == alice.account_id));

    let all = h
        .service
        .list(&RequestContext::admin(Uuid::new_v4()))
        .await
        .unwrap();
    assert_eq!(all.len(), 3);
}

#[tokio::test]
async fn test_delete_removes_submission() {
    let runner = ScriptedRunner::new(exited(0, SCENARIO_STDOUT, "", Duration::from_secs(3)));
    let h = harness(runner);
    let ctx = RequestContext::user(Uuid::new_v4());
    let id = ready_submission(&h, &ctx).await;
    h.service.run(&ctx, id).await.unwrap();

    h.service.delete(&ctx, id).await.unwrap();

    assert!(matches!(
        h.service.get(&ctx, id).await,
        Err(AppError::NotFound(_))
    ));
    assert!(matches!(
        h.service.delete(&ctx, id).await,
        Err(AppError::NotFound(_))
    ));
    // Borrar no devuelve créditos
    assert_eq!(h.ledger.get_balance(ctx.account_id).await.unwrap(), -3);
}

#[tokio::test]
async fn test_unknown_submission_is_not_found() {
    let h = harness(ScriptedRunner::new(Outcome::SpawnFailed));
    let ctx = RequestContext::user(Uuid::new_v4());

    assert!(matches!(
        h.service.run(&ctx, Uuid::new_v4()).await,
        Err(AppError::NotFound(_))
    ));
    assert!(matches!(
        h.service
            .set_parameters(&ctx, Uuid::new_v4(), full_parameters())
            .await,
        Err(AppError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_abandoned_run_is_still_recorded() {
    let runner = Arc::new(GatedRunner {
        started: Notify::new(),
        release: Notify::new(),
        calls: AtomicUsize::new(0),
    });
    let h = harness(runner.clone());
    let ctx = RequestContext::user(Uuid::new_v4());
    h.ledger.set_balance(ctx.account_id, 4).await;
    let id = ready_submission(&h, &ctx).await;

    // El cliente se va a mitad de la ejecución
    let service = Arc::clone(&h.service);
    let request = tokio::spawn(async move { service.run(&ctx, id).await });
    runner.started.notified().await;
    request.abort();
    assert!(request.await.unwrap_err().is_cancelled());

    assert!(h.service.is_running(id));
    let rerun = h.service.run(&ctx, id).await;
    assert!(matches!(rerun, Err(AppError::InvalidState(_))));

    runner.release.notify_one();

    let executed = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let current = h.service.get(&ctx, id).await.unwrap();
            if current.status == SubmissionStatus::Executed && !h.service.is_running(id) {
                return current;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("abandoned run never reached Executed");

    let result = executed.result.unwrap();
    assert!(result.success);
    assert_eq!(result.objective_value, Some(100));
    assert_eq!(result.credits_charged, 1);
    assert_eq!(runner.calls.load(Ordering::SeqCst), 1);
    assert_eq!(h.ledger.get_balance(ctx.account_id).await.unwrap(), 3);
}
