//! src/error.rs
//! ============================================================================
//! # `AppError`: Unified Error Type for the Browser Core
//!
//! Every fallible operation in the crate returns `AppResult<T>`. Call sites
//! that follow the best-effort rules (listing, search, per-item delete/move)
//! collapse these errors into empty lists or failure counts; the variants
//! exist for diagnostics and logging.

use std::{
    io::{self, ErrorKind},
    path::PathBuf,
};
use thiserror::Error;

/// Convenient alias carrying the unified error type.
pub type AppResult<T> = Result<T, AppError>;

/// Unified error type for all browser operations.
#[derive(Debug, Error)]
pub enum AppError {
    /// Standard IO error, auto-converted from `io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Permissions error for file/directory access.
    #[error("Permission denied: {0:?}")]
    PermissionDenied(PathBuf),

    /// Requested file or directory does not exist.
    #[error("File or directory not found: {0:?}")]
    NotFound(PathBuf),

    /// TOML parsing error (config or preferences).
    #[error("Config parse error: {0}")]
    Config(#[from] toml::de::Error),

    /// TOML serialization error.
    #[error("Config serialize error: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    /// Config or preference file I/O error with path.
    #[error("Failed to access config file {path:?}: {source}")]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// File operation specific errors
    #[error("File operation '{operation}' failed on {path:?}: {reason}")]
    FileOperationFailed {
        operation: String, // "create_directory", "delete", "move", ...
        path: PathBuf,
        reason: String,
    },

    /// Input validation errors
    #[error("Invalid input: {field} - {message}")]
    InvalidInput { field: String, message: String },

    /// A background worker panicked or was aborted.
    #[error("Task {request_id} failed: {reason}")]
    TaskFailed { request_id: u64, reason: String },

    /// Any other error, with description.
    #[error("Unexpected error: {0}")]
    Other(String),
}

impl AppError {
    /// Classify an io error against the path it happened on.
    pub fn from_io<P: Into<PathBuf>>(path: P, err: io::Error) -> Self {
        match err.kind() {
            ErrorKind::PermissionDenied => Self::PermissionDenied(path.into()),
            ErrorKind::NotFound => Self::NotFound(path.into()),
            _ => Self::Io(err),
        }
    }

    /// Create a file operation failure error
    pub fn file_operation_failed<S1, P, S2>(operation: S1, path: P, reason: S2) -> Self
    where
        S1: Into<String>,
        P: Into<PathBuf>,
        S2: Into<String>,
    {
        Self::FileOperationFailed {
            operation: operation.into(),
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create an input validation error
    pub fn invalid_input<S1: Into<String>, S2: Into<String>>(field: S1, message: S2) -> Self {
        Self::InvalidInput {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a task failure error
    pub fn task_failed<S: Into<String>>(request_id: u64, reason: S) -> Self {
        Self::TaskFailed {
            request_id,
            reason: reason.into(),
        }
    }

    #[must_use]
    pub const fn is_permission_denied(&self) -> bool {
        matches!(self, Self::PermissionDenied(_))
    }
}

// Allow conversion from `anyhow::Error` as fallback.
impl From<anyhow::Error> for AppError {
    fn from(e: anyhow::Error) -> Self {
        Self::Other(e.to_string())
    }
}
