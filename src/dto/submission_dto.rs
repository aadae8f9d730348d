use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::{
    ExecutionResult, LocationsSelector, RouteResult, Submission, SubmissionStatus,
};

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: Option<String>,
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
        }
    }

    pub fn success_with_message(data: T, message: String) -> Self {
        Self {
            success: true,
            message: Some(message),
            data: Some(data),
        }
    }
}

/// Resultado de ejecución tal como se expone en la API
#[derive(Debug, Serialize, Deserialize)]
pub struct ExecutionResponse {
    pub success: bool,
    pub objective_value: Option<i64>,
    pub routes: Vec<RouteResult>,
    pub raw_result_text: String,
    pub execution_time: f64,
    pub credits_charged: u64,
}

impl From<ExecutionResult> for ExecutionResponse {
    fn from(result: ExecutionResult) -> Self {
        Self {
            success: result.success,
            objective_value: result.objective_value,
            routes: result.routes,
            raw_result_text: result.raw_result_text,
            execution_time: result.execution_time,
            credits_charged: result.credits_charged,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SubmissionResponse {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub status: SubmissionStatus,
    pub num_vehicles: Option<u32>,
    pub depot: Option<u32>,
    pub max_distance: Option<u32>,
    pub locations_selector: Option<LocationsSelector>,
    pub result: Option<ExecutionResponse>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Submission> for SubmissionResponse {
    fn from(submission: Submission) -> Self {
        Self {
            id: submission.id,
            owner_id: submission.owner_id,
            name: submission.name,
            status: submission.status,
            num_vehicles: submission.parameters.num_vehicles,
            depot: submission.parameters.depot,
            max_distance: submission.parameters.max_distance,
            locations_selector: submission.parameters.locations_selector,
            result: submission.result.map(ExecutionResponse::from),
            created_at: submission.created_at,
            updated_at: submission.updated_at,
        }
    }
}

/// Request para recargar créditos
#[derive(Debug, Deserialize, Validate)]
pub struct AddCreditsRequest {
    #[validate(range(min = 1))]
    pub amount: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreditsResponse {
    pub credits: i64,
}
