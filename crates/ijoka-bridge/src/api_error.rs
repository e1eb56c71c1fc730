//! HTTP error mapping (spec.md §6/§7), same shape as the teacher's
//! `at-bridge::api_error::ApiError` -- a unified enum implementing
//! `IntoResponse`, built from whatever the handler's `Result` carries.

use axum::{http::StatusCode, response::IntoResponse, response::Response, Json};
use ijoka_core::CoreError;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Unavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Error taxonomy mapping (spec.md §7): validation/claim/cycle errors are
/// the caller's fault (400), missing entities are 404, a store that can't
/// be reached is 503, anything else is an opaque 500.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        let message = err.to_string();
        match err {
            CoreError::Validation(_) => ApiError::BadRequest(message),
            CoreError::NotFound(m) => ApiError::NotFound(m),
            CoreError::ClaimConflict { .. } => ApiError::BadRequest(message),
            CoreError::CycleError(m) => ApiError::BadRequest(m),
            CoreError::StoreTransient(m) | CoreError::StoreUnavailable(m) => ApiError::Unavailable(m),
            CoreError::Internal(m) => ApiError::Internal(m),
        }
    }
}
