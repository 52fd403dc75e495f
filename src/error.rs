// Centralized error handling module
// One error type for every sync, transfer and matcher operation

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for sync operations.
///
/// Remote-side variants are produced by [`Session`](crate::fs::Session)
/// implementations; callers that tolerate a specific failure match on the
/// variant at the call site.
#[derive(Error, Debug)]
pub enum SyncError {
    /// Remote store unreachable or unknown host.
    #[error("Cannot connect to {host}: {reason}")]
    ConnectFailure { host: String, reason: String },

    /// Remote store rejected the credentials.
    #[error("Login rejected for user {user}")]
    AuthFailure { user: String },

    #[error("Remote path not found: {path}")]
    RemoteNotFound { path: String },

    /// Generic remote refusal.
    #[error("Remote refused {path}: {reason}")]
    RemotePermission { path: String, reason: String },

    #[error("Remote path already exists: {path}")]
    RemoteExists { path: String },

    #[error("I/O error while {operation} {}: {source}", path.display())]
    LocalIo {
        path: PathBuf,
        operation: String,
        #[source]
        source: io::Error,
    },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Supplied path is not an absolute path: {}", path.display())]
    NotAbsolutePath { path: PathBuf },
}

pub type Result<T> = std::result::Result<T, SyncError>;

impl SyncError {
    /// Create a LocalIo error with context about the operation and path
    pub fn local_io(err: io::Error, operation: &str, path: impl Into<PathBuf>) -> Self {
        SyncError::LocalIo {
            path: path.into(),
            operation: operation.to_string(),
            source: err,
        }
    }

    /// Errors a pull may step over for a single file when asked to.
    pub fn is_per_file(&self) -> bool {
        matches!(
            self,
            SyncError::RemotePermission { .. } | SyncError::RemoteNotFound { .. }
        )
    }

    /// Errors an idempotent mkdir treats as success.
    pub fn is_existing_dir(&self) -> bool {
        matches!(
            self,
            SyncError::RemoteExists { .. } | SyncError::RemotePermission { .. }
        )
    }
}
