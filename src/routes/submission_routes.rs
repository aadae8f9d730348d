use axum::{
    extract::{rejection::JsonRejection, Path, State},
    routing::{get, post, put},
    Json, Router,
};
use uuid::Uuid;

use crate::dto::{ApiResponse, SubmissionResponse};
use crate::models::{ParameterUpdate, RequestContext};
use crate::state::AppState;
use crate::utils::errors::{validation_error, AppError};

pub fn create_submission_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_submission).get(list_submissions))
        .route("/:id", get(get_submission).delete(delete_submission))
        .route("/:id/parameters", put(update_parameters))
        .route("/:id/run", post(run_submission))
}

async fn create_submission(
    State(state): State<AppState>,
    ctx: RequestContext,
) -> Result<Json<ApiResponse<SubmissionResponse>>, AppError> {
    let submission = state.submissions.create(&ctx).await?;
    Ok(Json(ApiResponse::success_with_message(
        submission.into(),
        "Submission creada exitosamente".to_string(),
    )))
}

async fn list_submissions(
    State(state): State<AppState>,
    ctx: RequestContext,
) -> Result<Json<Vec<SubmissionResponse>>, AppError> {
    let submissions = state.submissions.list(&ctx).await?;
    Ok(Json(submissions.into_iter().map(Into::into).collect()))
}

async fn get_submission(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<SubmissionResponse>>, AppError> {
    let submission = state.submissions.get(&ctx, id).await?;
    Ok(Json(ApiResponse::success(submission.into())))
}

async fn update_parameters(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<Uuid>,
    payload: Result<Json<ParameterUpdate>, JsonRejection>,
) -> Result<Json<ApiResponse<SubmissionResponse>>, AppError> {
    // Un valor no entero llega aquí como error de deserialización
    let Json(update) = payload.map_err(|e| validation_error("parameters", e.body_text()))?;

    let submission = state.submissions.set_parameters(&ctx, id, update).await?;
    Ok(Json(ApiResponse::success_with_message(
        submission.into(),
        "Parámetros actualizados exitosamente".to_string(),
    )))
}

async fn run_submission(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<SubmissionResponse>>, AppError> {
    let submission = state.submissions.run(&ctx, id).await?;
    let message = match &submission.result {
        Some(result) if result.success => "Submission ejecutada exitosamente",
        _ => "Submission ejecutada con errores",
    };
    Ok(Json(ApiResponse::success_with_message(
        submission.into(),
        message.to_string(),
    )))
}

async fn delete_submission(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    state.submissions.delete(&ctx, id).await?;
    Ok(Json(serde_json::json!({
        "success": true,
        "message": "Submission eliminada exitosamente"
    })))
}
