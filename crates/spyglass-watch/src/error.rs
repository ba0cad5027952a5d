//! Error types for the watch engine.

use thiserror::Error;

/// Result type alias for watch engine operations.
pub type WatchResult<T> = Result<T, WatchError>;

/// Errors that can occur in the watch engine.
#[derive(Debug, Error)]
pub enum WatchError {
    /// The underlying watch connection failed or could not be established.
    #[error("watch connection failed: {0}")]
    Connection(String),

    /// A payload could not be serialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The shared scheduler has been shut down; no new watches are accepted.
    #[error("watch scheduler is shut down")]
    SchedulerShutdown,
}
