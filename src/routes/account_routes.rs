use axum::{extract::State, routing::get, Json, Router};
use validator::Validate;

use crate::dto::{AddCreditsRequest, ApiResponse, CreditsResponse};
use crate::models::RequestContext;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_account_router() -> Router<AppState> {
    Router::new().route("/credits", get(get_credits).post(add_credits))
}

async fn get_credits(
    State(state): State<AppState>,
    ctx: RequestContext,
) -> Result<Json<CreditsResponse>, AppError> {
    let credits = state.accounts.balance(&ctx).await?;
    Ok(Json(CreditsResponse { credits }))
}

async fn add_credits(
    State(state): State<AppState>,
    ctx: RequestContext,
    Json(request): Json<AddCreditsRequest>,
) -> Result<Json<ApiResponse<CreditsResponse>>, AppError> {
    request.validate()?;

    let credits = state.accounts.add_credits(&ctx, request.amount).await?;
    Ok(Json(ApiResponse::success_with_message(
        CreditsResponse { credits },
        format!("Créditos actualizados. Nuevo saldo: {}", credits),
    )))
}
