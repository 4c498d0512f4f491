//! Error types for notebook sessions.

use std::path::PathBuf;

use moonbook_core::CellId;
use moonbook_sync::SyncError;

/// Session error type.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// IO error.
    #[error("IO error at {path}: {message}")]
    Io { path: PathBuf, message: String },

    /// Notebook could not be decoded or encoded.
    #[error("Notebook error: {0}")]
    Sync(#[from] SyncError),

    /// Cell not found.
    #[error("Cell not found: {0}")]
    CellNotFound(CellId),

    /// No interpreter is attached to the session.
    #[error("No interpreter attached to this session")]
    InterpreterUnavailable,

    /// The session has no file to save to.
    #[error("Notebook has no path; use save_as")]
    NoPath,
}

impl SessionError {
    pub(crate) fn io(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            message: err.to_string(),
        }
    }
}

/// Result type for session operations.
pub type SessionResult<T> = Result<T, SessionError>;
