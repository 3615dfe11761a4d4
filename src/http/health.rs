use super::{success, AppState};
use axum::extract::State;
use axum::response::IntoResponse;
use serde_json::json;

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    success(json!({
        "healthy": true,
        "environment": state.config.environment.as_str(),
        "uptime_secs": state.started_at.elapsed().as_secs(),
    }))
}
