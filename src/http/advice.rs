use super::{created, success, ApiError, ApiResult, AppState};
use crate::models::AdviceRequest;
use crate::store::Visibility;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use tracing::info;

/// Approved entries, newest first.
pub async fn list(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    Ok(success(state.store.list_advice(Visibility::Public).await?))
}

/// New entries wait for approval before they are listed.
pub async fn create(
    State(state): State<AppState>,
    payload: Result<Json<AdviceRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(request) = payload?;
    let advice = request.validate().map_err(ApiError::validation)?;
    let advice = state.store.create_advice(advice).await?;
    info!("Stored advice {} from {} (pending approval)", advice.id, advice.name);
    Ok(created(advice))
}
