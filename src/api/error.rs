//! Unified API error handling with structured responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error};

/// API error type with structured responses.
#[derive(Debug, Error)]
pub enum ApiError {
    /// No valid session accompanied the request.
    #[error("authentication required")]
    Unauthenticated,

    /// The session is valid but the user holds none of the required roles.
    #[error("insufficient role")]
    Forbidden,

    #[error("not found: {0}")]
    NotFound(String),

    /// A write against the backing store failed. Read-path storage
    /// failures never reach this type; they degrade to [`ApiError::Unauthenticated`]
    /// or a null user at the boundary that observed them.
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "UNAUTHENTICATED",
            Self::Forbidden => "FORBIDDEN",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Storage(_) => "INTERNAL_ERROR",
        }
    }
}

/// Structured error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: &'static str,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.error_code();

        // Storage failures keep their detail in the logs; the client only
        // ever sees a generic message.
        let message = match &self {
            ApiError::Storage(err) => {
                error!(error = ?err, "request failed against the backing store");
                "internal error".to_string()
            }
            other => {
                debug!(error_code = code, "request rejected: {}", other);
                other.to_string()
            }
        };

        let body = ErrorResponse {
            error: message,
            code,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
