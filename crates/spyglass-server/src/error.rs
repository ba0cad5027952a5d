//! Error types for the dashboard server.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use spyglass_watch::WatchError;
use thiserror::Error;

/// Result type alias for dashboard operations.
pub type DashboardResult<T> = Result<T, DashboardError>;

/// Errors that can occur in the dashboard server.
#[derive(Debug, Error)]
pub enum DashboardError {
    /// Failed to bind to the specified address.
    #[error("failed to bind to {0}: {1}")]
    BindFailed(std::net::SocketAddr, std::io::Error),

    /// Too many concurrent watch connections.
    #[error("too many watch connections: {0} active, limit is {1}")]
    TooManyConnections(usize, usize),

    /// The watch engine refused or lost the stream.
    #[error("watch error: {0}")]
    Watch(#[from] WatchError),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

/// JSON error response body.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
}

impl IntoResponse for DashboardError {
    fn into_response(self) -> Response {
        let (status, error_type) = match &self {
            Self::TooManyConnections(_, _) => {
                (StatusCode::SERVICE_UNAVAILABLE, "too_many_connections")
            }
            Self::Watch(WatchError::SchedulerShutdown) => {
                (StatusCode::SERVICE_UNAVAILABLE, "shutting_down")
            }
            Self::Watch(_) => (StatusCode::INTERNAL_SERVER_ERROR, "watch_error"),
            Self::BindFailed(_, _) | Self::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error")
            }
        };

        let body = ErrorResponse {
            error: error_type.to_string(),
            message: self.to_string(),
        };

        let json = serde_json::to_string(&body).unwrap_or_else(|_| {
            r#"{"error":"internal_error","message":"failed to serialize error"}"#.to_string()
        });

        (status, [("content-type", "application/json")], json).into_response()
    }
}
