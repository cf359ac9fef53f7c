//! Error types for sportmatch-core

use thiserror::Error;

/// Result type alias using sportmatch-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in sportmatch-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Database error
    #[error("Database error: {0}")]
    Database(String),

    /// libSQL error
    #[error("libSQL error: {0}")]
    LibSql(#[from] libsql::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Record not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Caller is not allowed to act on the record
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Write rejected because it conflicts with existing state
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Blob/object storage error
    #[error("Storage error: {0}")]
    Storage(String),
}

impl Error {
    /// Whether the error means the requested record does not exist.
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
