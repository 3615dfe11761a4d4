use super::{success, ApiError, ApiResult, AppState};
use crate::store::Visibility;
use axum::extract::{Path, State};
use axum::response::IntoResponse;

/// Published posts, newest first.
pub async fn list(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    Ok(success(state.store.list_posts(Visibility::Public).await?))
}

/// Drafts are indistinguishable from missing posts.
pub async fn show(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let post = state
        .store
        .get_post(&slug, Visibility::Public)
        .await?
        .ok_or_else(|| ApiError::not_found("Post not found"))?;
    Ok(success(post))
}
