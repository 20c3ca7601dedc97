//! API error types.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use eventide_core::error::RepositoryError;
use eventide_ordering::OrderError;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// Startup and runtime errors for the API server.
#[derive(Debug, Error)]
pub enum AppError {
    /// An environment variable is invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// The order repository could not be assembled.
    #[error("wiring error: {0}")]
    Wiring(#[from] eventide_ordering::wiring::WiringError),

    /// Network binding or I/O error.
    #[error("server error: {0}")]
    Server(#[from] std::io::Error),
}

/// JSON body returned for error responses.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Machine-readable error code.
    pub error: &'static str,
    /// Human-readable error message.
    pub message: String,
}

/// HTTP-layer wrapper around `OrderError` that implements `IntoResponse`.
#[derive(Debug)]
pub struct ApiError(pub OrderError);

impl From<OrderError> for ApiError {
    fn from(err: OrderError) -> Self {
        Self(err)
    }
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match &self.0 {
            OrderError::Validation(_) => (StatusCode::BAD_REQUEST, "validation_error"),
            OrderError::Repository(err) => match err {
                RepositoryError::AggregateNotFound { .. } => {
                    (StatusCode::NOT_FOUND, "aggregate_not_found")
                }
                RepositoryError::ConcurrencyViolation { .. } => {
                    (StatusCode::CONFLICT, "concurrency_violation")
                }
                RepositoryError::Unauthorized => (StatusCode::FORBIDDEN, "unauthorized"),
                RepositoryError::RepositoryUnavailable => {
                    (StatusCode::SERVICE_UNAVAILABLE, "repository_unavailable")
                }
                RepositoryError::NoConfiguredEventHandler { .. }
                | RepositoryError::Unexpected(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "internal_error")
                }
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code) = self.status_and_code();
        if status.is_server_error() {
            error!(error = %self.0, status = status.as_u16(), "request failed");
        }

        let body = ErrorBody {
            error: error_code,
            message: self.0.to_string(),
        };

        (status, Json(body)).into_response()
    }
}
