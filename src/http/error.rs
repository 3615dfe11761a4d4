//! Response envelopes and the API error type.
//!
//! Every response body is either
//! `{"status":"success","data":...}` or
//! `{"status":"error","error":"...","errors":[...],"details":"..."}`.

use crate::models::FieldError;
use crate::store::StoreError;
use axum::body::{to_bytes, Body};
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::Request;
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::Value;
use tracing::{error, warn};

const ERROR_BODY_LIMIT: usize = 64 * 1024;

#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    status: &'static str,
    data: T,
}

pub fn success<T: Serialize>(data: T) -> Json<Envelope<T>> {
    Json(Envelope {
        status: "success",
        data,
    })
}

pub fn created<T: Serialize>(data: T) -> (StatusCode, Json<Envelope<T>>) {
    (StatusCode::CREATED, success(data))
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    status: &'static str,
    error: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<&'a [FieldError]>,
}

/// Internal error chain, carried as a response extension so the
/// development-only middleware can expose it.
#[derive(Debug, Clone)]
struct ErrorDetails(String);

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
    errors: Option<Vec<FieldError>>,
    details: Option<String>,
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            errors: None,
            details: None,
        }
    }

    pub fn validation(errors: Vec<FieldError>) -> Self {
        Self {
            errors: Some(errors),
            ..Self::new(StatusCode::BAD_REQUEST, "Validation failed")
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "Unauthorized")
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }

    /// Generic 500; the cause is logged and only surfaced in development.
    pub fn internal(cause: &(dyn std::error::Error + 'static)) -> Self {
        let mut details = cause.to_string();
        let mut source = cause.source();
        while let Some(inner) = source {
            details.push_str(": ");
            details.push_str(&inner.to_string());
            source = inner.source();
        }
        Self {
            details: Some(details),
            ..Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Conflict(message) => ApiError::conflict(message),
            StoreError::Database(ref inner) => ApiError::internal(inner),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::bad_request(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::bad_request(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let Some(details) = &self.details {
            error!("Request failed: {}", details);
        }

        let body = ErrorBody {
            status: "error",
            error: &self.message,
            errors: self.errors.as_deref(),
        };
        let mut response = (self.status, Json(body)).into_response();
        if let Some(details) = self.details {
            response.extensions_mut().insert(ErrorDetails(details));
        }
        response
    }
}

/// Development middleware: copies the error chain of failed responses into
/// the `details` field of the error envelope.
pub async fn expose_error_details(request: Request, next: Next) -> Response {
    let response = next.run(request).await;
    let Some(ErrorDetails(details)) = response.extensions().get::<ErrorDetails>().cloned() else {
        return response;
    };

    let (mut parts, body) = response.into_parts();
    let bytes = match to_bytes(body, ERROR_BODY_LIMIT).await {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!("Could not buffer error body: {}", e);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let mut value: Value = match serde_json::from_slice(&bytes) {
        Ok(value) => value,
        Err(_) => return Response::from_parts(parts, Body::from(bytes)),
    };
    if let Some(object) = value.as_object_mut() {
        object.insert("details".to_string(), Value::String(details));
    }

    let body = value.to_string();
    parts.headers.remove(axum::http::header::CONTENT_LENGTH);
    Response::from_parts(parts, Body::from(body))
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_validation_envelope() {
        let response = ApiError::validation(vec![FieldError {
            field: "email",
            message: "email is required".to_string(),
        }])
        .into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["status"], "error");
        assert_eq!(body["error"], "Validation failed");
        assert_eq!(body["errors"][0]["field"], "email");
        assert!(body.get("details").is_none());
    }

    #[tokio::test]
    async fn test_internal_hides_cause_in_body() {
        let cause = std::io::Error::new(std::io::ErrorKind::Other, "disk on fire");
        let response = ApiError::internal(&cause).into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response.extensions().get::<ErrorDetails>().is_some());
        let body = body_json(response).await;
        assert_eq!(body["error"], "Internal server error");
        assert!(body.get("details").is_none());
        assert!(body.get("errors").is_none());
    }

    #[tokio::test]
    async fn test_conflict_from_store() {
        let err: ApiError = StoreError::Conflict("slug taken".to_string()).into();
        assert_eq!(err.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_success_envelope() {
        let response = created(serde_json::json!({"id": 1})).into_response();
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = body_json(response).await;
        assert_eq!(body["status"], "success");
        assert_eq!(body["data"]["id"], 1);
    }
}
