use thiserror::Error;

use crate::session::SessionStatus;

/// Errors from session endpoint operations (hydration, diff batches, assignment).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("session not found")]
    NotFound,

    #[error("session is {0} and can no longer be edited")]
    NotEditable(SessionStatus),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("storage error: {0}")]
    StorageError(String),

    #[error("transport error: {0}")]
    Transport(String),
}

/// Errors raised by the draft store.
#[derive(Debug, Error)]
pub enum DraftError {
    /// `save` was called before any baseline was loaded. Indicates a caller bug.
    #[error("no session loaded in draft store")]
    NotLoaded,

    #[error("a save is already in flight")]
    SaveInProgress,

    #[error("no save in flight")]
    NoSaveInFlight,

    /// The endpoint rejected the batch. Pending diffs are kept for retry.
    #[error("save failed: {0}")]
    Persist(#[from] SessionError),
}

/// Errors from repository operations (used by trait definitions in skillcheck-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),

    /// The session was closed before the write transaction started.
    #[error("session is {0} and can no longer be edited")]
    NotEditable(SessionStatus),
}

impl From<RepositoryError> for SessionError {
    fn from(e: RepositoryError) -> Self {
        match e {
            RepositoryError::NotFound => SessionError::NotFound,
            RepositoryError::Conflict(msg) => SessionError::Conflict(msg),
            RepositoryError::NotEditable(status) => SessionError::NotEditable(status),
            other => SessionError::StorageError(other.to_string()),
        }
    }
}
