//! Error types for dashboard-core.
//!
//! # Error Classification
//!
//! | Error | Kind | Retry? |
//! |-------|------|--------|
//! | [`Error::InvalidArgument`] | [`ErrorKind::InvalidArgument`] | No, fix the input |
//! | [`Error::LockTimeout`] | [`ErrorKind::NotAvailable`] | Yes, later |
//! | [`Error::Store`] with a bad bucket width | [`ErrorKind::InvalidArgument`] | No |
//! | [`Error::Store`] with an out-of-range timestamp | [`ErrorKind::InvalidArgument`] | No |
//! | [`Error::Store`] otherwise | [`ErrorKind::NotAvailable`] | Yes, later |
//!
//! Nothing in this crate retries on its own; the caller decides.
//!
//! An empty store is not an error: it shows up as `None` from
//! [`Dashboard::last_updated`](crate::Dashboard::last_updated) and as empty
//! collections everywhere else.

use std::time::Duration;

use thiserror::Error;

/// Errors returned by the dashboard operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Caller input outside the domain, such as a non-positive interval.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Another request held the store longer than the configured wait.
    #[error("Store busy: lock not acquired within {0:?}")]
    LockTimeout(Duration),

    /// The underlying store failed.
    #[error(transparent)]
    Store(#[from] dashboard_store::Error),
}

/// Coarse classification used to map errors onto responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed or out-of-domain input. Never retried.
    InvalidArgument,
    /// Storage unreachable or lock wait exceeded. Retryable.
    NotAvailable,
}

impl Error {
    /// Classify the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Error::Store(
                dashboard_store::Error::InvalidBucketWidth(_)
                | dashboard_store::Error::InvalidTimestamp(_),
            ) => ErrorKind::InvalidArgument,
            Error::LockTimeout(_) | Error::Store(_) => ErrorKind::NotAvailable,
        }
    }

    /// Whether the operation may succeed if tried again later.
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::NotAvailable
    }
}

/// Result type alias using dashboard-core's Error type.
pub type Result<T> = std::result::Result<T, Error>;
