//! Error types for dashboard-store.

use std::path::PathBuf;

use rusqlite::ErrorCode;

/// Result type for dashboard-store operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in dashboard-store.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Database error from SQLite.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Failed to create database directory.
    #[error("Failed to create database directory {path}: {source}")]
    CreateDirectory {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Timestamp cannot be represented as i64 Unix nanoseconds.
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    /// Aggregation bucket width is zero, negative, or too large.
    #[error("Invalid bucket width: {0}")]
    InvalidBucketWidth(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether the error is SQLite reporting a lock held by another writer
    /// after the busy timeout ran out.
    ///
    /// These failures are transient; the caller may retry later.
    pub fn is_busy(&self) -> bool {
        match self {
            Error::Database(rusqlite::Error::SqliteFailure(e, _)) => matches!(
                e.code,
                ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked
            ),
            _ => false,
        }
    }
}
