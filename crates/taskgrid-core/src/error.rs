//! # Design
//!
//! - Constant-message errors for session persistence.
//! - Capture the operation and path so failures are reproducible in tests.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for session persistence.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors produced while reading or writing durable session state.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Filesystem access failed.
    #[error("session storage io failure")]
    Io {
        /// Operation that triggered the failure.
        operation: &'static str,
        /// File involved in the failure.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
    /// Stored session payload could not be encoded or decoded.
    #[error("session storage json failure")]
    Json {
        /// Operation that triggered the failure.
        operation: &'static str,
        /// File involved in the failure.
        path: PathBuf,
        /// Underlying serde error.
        source: serde_json::Error,
    },
}

impl StorageError {
    /// IO failure for `path` during `operation`.
    #[must_use]
    pub fn io(operation: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }

    /// Encoding failure for `path` during `operation`.
    #[must_use]
    pub fn json(
        operation: &'static str,
        path: impl Into<PathBuf>,
        source: serde_json::Error,
    ) -> Self {
        Self::Json {
            operation,
            path: path.into(),
            source,
        }
    }
}
