use super::{success, ApiError, ApiResult, AppState};
use crate::models::FaqRequest;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;
use tracing::info;

pub async fn list(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    Ok(success(state.store.list_faqs().await?))
}

/// Partial update; omitted fields keep their value.
pub async fn update(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<FaqRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Path(id) = id?;
    let Json(request) = payload?;
    let patch = request.validate_patch().map_err(ApiError::validation)?;

    let faq = state
        .store
        .update_faq(id, patch)
        .await?
        .ok_or_else(|| ApiError::not_found("FAQ not found"))?;
    info!("Updated FAQ {}", id);
    Ok(success(faq))
}

pub async fn remove(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<impl IntoResponse> {
    let Path(id) = id?;
    if !state.store.delete_faq(id).await? {
        return Err(ApiError::not_found("FAQ not found"));
    }
    info!("Deleted FAQ {}", id);
    Ok(success(json!({ "id": id })))
}
