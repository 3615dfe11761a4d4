use super::{success, ApiResult, AppState};
use crate::mailer::{deliver, is_milestone, milestone_notification};
use axum::extract::State;
use axum::response::IntoResponse;
use serde::Serialize;
use tracing::info;

#[derive(Debug, Serialize)]
struct VisitorCount {
    count: i64,
}

pub async fn count(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let count = state.store.visitor_count().await?;
    Ok(success(VisitorCount { count }))
}

/// Every hundredth visitor triggers a milestone email to the admin.
pub async fn increment(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let count = state.store.increment_visitors().await?;

    if is_milestone(count) {
        info!("Visitor milestone reached: {}", count);
        if let Some(admin_email) = &state.config.admin_email {
            deliver(
                state.mailer.as_ref(),
                milestone_notification(admin_email, count),
            )
            .await;
        }
    }

    Ok(success(VisitorCount { count }))
}
