//! HTTP error responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

/// Errors returned by the notepad endpoint before the stream starts.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The requested file does not exist.
    #[error("File not found: {0}")]
    NotFound(String),

    /// A query parameter failed validation.
    #[error("{0}")]
    InvalidParam(String),

    /// The file exists but could not be read.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::InvalidParam(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// JSON error response body.
#[derive(Serialize)]
struct ErrorBody {
    detail: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "notepad request failed");
        } else {
            tracing::debug!(error = %self, "notepad request rejected");
        }
        let body = ErrorBody {
            detail: self.to_string(),
        };
        (status, axum::Json(body)).into_response()
    }
}
