use super::{success, ApiResult, AppState};
use axum::extract::State;
use axum::response::IntoResponse;

pub async fn list(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    Ok(success(state.store.list_projects().await?))
}
