use super::{created, success, ApiError, ApiResult, AppState};
use crate::mailer::{contact_notification, deliver};
use crate::models::ContactRequest;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use tracing::info;

/// `POST /api/contact`: store the message and notify the admin by email.
pub async fn create(
    State(state): State<AppState>,
    payload: Result<Json<ContactRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(request) = payload?;
    let contact = request.validate().map_err(ApiError::validation)?;
    let contact = state.store.create_contact(contact).await?;
    info!("Stored contact message {} from {}", contact.id, contact.email);

    match &state.config.admin_email {
        Some(admin_email) => {
            deliver(
                state.mailer.as_ref(),
                contact_notification(admin_email, &contact),
            )
            .await;
        }
        None => info!("ADMIN_EMAIL not set; skipping contact notification"),
    }

    Ok(created(contact))
}

/// `GET /api/contact` (admin)
pub async fn list(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    Ok(success(state.store.list_contacts().await?))
}
