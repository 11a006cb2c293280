//! Error taxonomy shared by every layer.

use thiserror::Error;

/// Common result type for task operations
pub type TaskResult<T> = Result<T, TaskError>;

/// Errors surfaced to the initiating UI action.
///
/// `Display` output is what ends up in the status banner, so messages are
/// plain sentences without codes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaskError {
    /// Rejected at the input boundary, before any remote call.
    #[error("{0}")]
    Validation(String),
    /// Bad credentials, unconfirmed account, sign-up conflict.
    #[error("{0}")]
    Auth(String),
    /// Network or service failure.
    #[error("Request failed: {0}")]
    Remote(String),
    /// Row missing or not visible to the current principal.
    #[error("Task not found: {0}")]
    NotFound(String),
    /// The backend no longer accepts the access token.
    #[error("Your session has expired. Please sign in again.")]
    SessionExpired,
    #[error("Configuration error: {0}")]
    Config(String),
}

impl TaskError {
    pub fn validation(msg: impl Into<String>) -> Self {
        TaskError::Validation(msg.into())
    }

    pub fn remote(msg: impl Into<String>) -> Self {
        TaskError::Remote(msg.into())
    }

    /// Whether this error means the session must be torn down
    pub fn is_session_expired(&self) -> bool {
        matches!(self, TaskError::SessionExpired)
    }
}
