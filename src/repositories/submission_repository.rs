use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use super::SubmissionStore;
use crate::models::{
    ExecutionResult, LocationsSelector, RouteResult, Submission, SubmissionParameters,
    SubmissionStatus, SubmissionUpdate,
};
use crate::utils::errors::{not_found_error, AppError, AppResult};

// Fila tal cual sale de la tabla vrp_submissions
#[derive(Debug, sqlx::FromRow)]
pub struct SubmissionRow {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub num_vehicles: Option<i64>,
    pub depot: Option<i64>,
    pub max_distance: Option<i64>,
    pub locations_selector: Option<i16>,
    pub status: SubmissionStatus,
    pub success: Option<bool>,
    pub objective_value: Option<i64>,
    pub routes: Option<Json<Vec<RouteResult>>>,
    pub raw_result_text: Option<String>,
    pub execution_time: Option<f64>,
    pub credits_charged: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn column_u32(id: Uuid, column: &str, value: Option<i64>) -> AppResult<Option<u32>> {
    value
        .map(|v| {
            u32::try_from(v).map_err(|_| {
                AppError::Persistence(format!(
                    "Submission {} has out of range {}: {}",
                    id, column, v
                ))
            })
        })
        .transpose()
}

impl TryFrom<SubmissionRow> for Submission {
    type Error = AppError;

    fn try_from(row: SubmissionRow) -> Result<Self, Self::Error> {
        let parameters = SubmissionParameters {
            num_vehicles: column_u32(row.id, "num_vehicles", row.num_vehicles)?,
            depot: column_u32(row.id, "depot", row.depot)?,
            max_distance: column_u32(row.id, "max_distance", row.max_distance)?,
            locations_selector: row
                .locations_selector
                .map(LocationsSelector::try_from)
                .transpose()
                .map_err(|e| AppError::Persistence(format!("Submission {}: {}", row.id, e)))?,
        };

        if row.status == SubmissionStatus::Ready && !parameters.is_complete() {
            return Err(AppError::Persistence(format!(
                "Submission {} is ready with incomplete parameters",
                row.id
            )));
        }

        let result = match (row.status, row.success, row.raw_result_text) {
            (SubmissionStatus::Executed, Some(success), Some(raw_result_text)) => {
                Some(ExecutionResult {
                    success,
                    objective_value: row.objective_value,
                    routes: if success {
                        row.routes.map(|routes| routes.0).unwrap_or_default()
                    } else {
                        Vec::new()
                    },
                    raw_result_text,
                    execution_time: row.execution_time.unwrap_or(0.0).max(0.0),
                    credits_charged: row
                        .credits_charged
                        .and_then(|c| u64::try_from(c).ok())
                        .unwrap_or(0),
                })
            }
            (SubmissionStatus::Executed, _, _) => {
                return Err(AppError::Persistence(format!(
                    "Submission {} is executed without a recorded result",
                    row.id
                )));
            }
            _ => None,
        };

        Ok(Submission {
            id: row.id,
            owner_id: row.owner_id,
            name: row.name,
            parameters,
            status: row.status,
            result,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

pub struct PgSubmissionStore {
    pool: PgPool,
}

impl PgSubmissionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn convert_all(rows: Vec<SubmissionRow>) -> AppResult<Vec<Submission>> {
        rows.into_iter().map(Submission::try_from).collect()
    }
}

#[async_trait]
impl SubmissionStore for PgSubmissionStore {
    async fn get(&self, id: Uuid) -> AppResult<Option<Submission>> {
        let row = sqlx::query_as::<_, SubmissionRow>("SELECT * FROM vrp_submissions WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::Persistence(format!("Error finding submission: {}", e)))?;

        row.map(Submission::try_from).transpose()
    }

    async fn create(&self, owner_id: Uuid) -> AppResult<Uuid> {
        let id = Uuid::new_v4();
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO vrp_submissions (id, owner_id, name, status, created_at, updated_at)
            VALUES ($1, $2, '', $3, $4, $4)
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .bind(SubmissionStatus::NotReady)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Persistence(format!("Error creating submission: {}", e)))?;

        Ok(id)
    }

    async fn update(&self, id: Uuid, update: SubmissionUpdate) -> AppResult<Submission> {
        let now = Utc::now();

        let row = match update {
            SubmissionUpdate::Parameters {
                name,
                parameters,
                status,
            } => {
                sqlx::query_as::<_, SubmissionRow>(
                    r#"
                    UPDATE vrp_submissions
                    SET name = $2, num_vehicles = $3, depot = $4, max_distance = $5,
                        locations_selector = $6, status = $7, updated_at = $8
                    WHERE id = $1
                    RETURNING *
                    "#,
                )
                .bind(id)
                .bind(name)
                .bind(parameters.num_vehicles.map(i64::from))
                .bind(parameters.depot.map(i64::from))
                .bind(parameters.max_distance.map(i64::from))
                .bind(parameters.locations_selector.map(LocationsSelector::value))
                .bind(status)
                .bind(now)
                .fetch_optional(&self.pool)
                .await
            }
            SubmissionUpdate::Execution(result) => {
                sqlx::query_as::<_, SubmissionRow>(
                    r#"
                    UPDATE vrp_submissions
                    SET status = $2, success = $3, objective_value = $4, routes = $5,
                        raw_result_text = $6, execution_time = $7, credits_charged = $8,
                        updated_at = $9
                    WHERE id = $1
                    RETURNING *
                    "#,
                )
                .bind(id)
                .bind(SubmissionStatus::Executed)
                .bind(result.success)
                .bind(result.objective_value)
                .bind(Json(result.routes))
                .bind(result.raw_result_text)
                .bind(result.execution_time)
                .bind(i64::try_from(result.credits_charged).unwrap_or(i64::MAX))
                .bind(now)
                .fetch_optional(&self.pool)
                .await
            }
        }
        .map_err(|e| AppError::Persistence(format!("Error updating submission: {}", e)))?;

        row.ok_or_else(|| not_found_error("Submission", &id.to_string()))?
            .try_into()
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM vrp_submissions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Persistence(format!("Error deleting submission: {}", e)))?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_by_owner(&self, owner_id: Uuid) -> AppResult<Vec<Submission>> {
        let rows = sqlx::query_as::<_, SubmissionRow>(
            "SELECT * FROM vrp_submissions WHERE owner_id = $1 ORDER BY created_at DESC",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Persistence(format!("Error listing submissions: {}", e)))?;

        Self::convert_all(rows)
    }

    async fn list_all(&self) -> AppResult<Vec<Submission>> {
        let rows = sqlx::query_as::<_, SubmissionRow>(
            "SELECT * FROM vrp_submissions ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Persistence(format!("Error listing submissions: {}", e)))?;

        Self::convert_all(rows)
    }
}
