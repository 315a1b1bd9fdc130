use axum::{
    Json,
    extract::rejection::BytesRejection,
    http::StatusCode,
    response::IntoResponse,
};
use tracing::warn;

use crate::webhook::RecordError;

/// Error type for the HTTP API.
///
/// Every error becomes a JSON body with a single `error` field:
///
/// ```json
/// {
///     "error": "No JSON data received"
/// }
/// ```
#[derive(Debug, thiserror::Error, strum::AsRefStr)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum AppError {
    #[error("No JSON data received")]
    NoJsonData,

    #[error("Request body exceeds the size limit")]
    PayloadTooLarge,

    #[error("Failed to read request body: {0}")]
    BodyUnreadable(String),

    #[error("{0}")]
    Internal(String),
}

impl AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NoJsonData | AppError::BodyUnreadable(_) => StatusCode::BAD_REQUEST,
            AppError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Converts errors into HTTP responses.
impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        // Error code is the enum variant name in SCREAMING_SNAKE_CASE, used for logs only.
        let error_code = self.as_ref();
        let message = self.to_string();
        let status_code = self.status_code();
        let json = serde_json::json!({ "error": message });

        warn!("Returning error {error_code}: {message}");
        (status_code, Json(json)).into_response()
    }
}

/// Converts record construction errors into application errors.
impl From<RecordError> for AppError {
    fn from(error: RecordError) -> Self {
        AppError::Internal(error.to_string())
    }
}

/// Converts body extraction failures into application errors.
impl From<BytesRejection> for AppError {
    fn from(rejection: BytesRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::PayloadTooLarge
        } else {
            AppError::BodyUnreadable(rejection.body_text())
        }
    }
}
