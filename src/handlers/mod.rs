use axum::{http::StatusCode, Json};
use tracing::error;

use crate::error::CoreError;
use crate::models::error::ErrorResponse;

pub mod deals;
pub mod price_history;
pub mod token;
pub mod tracker;

pub type ApiError = (StatusCode, Json<ErrorResponse>);

pub fn status_for(err: &CoreError) -> StatusCode {
    match err {
        CoreError::NotFound { .. } => StatusCode::NOT_FOUND,
        CoreError::Validation(_) => StatusCode::BAD_REQUEST,
        CoreError::InvalidTransition { .. }
        | CoreError::InsufficientBalance { .. }
        | CoreError::Conflict(_) => StatusCode::CONFLICT,
        CoreError::Timeout(_) => StatusCode::SERVICE_UNAVAILABLE,
        CoreError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Maps a ledger error onto the response the API returns for it.
pub fn api_error(err: CoreError) -> ApiError {
    let status = status_for(&err);
    if status.is_server_error() {
        error!(error = %err, code = err.code(), "Request failed");
    }
    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
            code: Some(err.code().to_string()),
        }),
    )
}

pub(crate) fn bad_request(message: String) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: message,
            code: Some("VALIDATION_ERROR".to_string()),
        }),
    )
}
