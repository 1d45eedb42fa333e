//! # Design
//!
//! - Stores wrap client and storage failures without re-classifying them.
//! - `WorkerNotFound` is a store-level condition: the fleet list succeeded but
//!   did not contain the requested worker.

use taskgrid_client::{ApiError, ErrorKind};
use taskgrid_core::StorageError;
use thiserror::Error;

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors returned by store actions.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backend call failed.
    #[error("api request failed")]
    Api {
        /// Classified client error.
        #[from]
        source: ApiError,
    },
    /// The fleet list did not contain the requested worker.
    #[error("worker not found")]
    WorkerNotFound {
        /// Requested worker.
        worker_id: String,
    },
    /// The backend accepted the credentials but returned no token.
    #[error("session token missing")]
    MissingToken {
        /// Operation that expected a token.
        operation: &'static str,
    },
    /// Session persistence failed.
    #[error("session storage failed")]
    Storage {
        /// Underlying storage error.
        #[from]
        source: StorageError,
    },
}

impl StoreError {
    /// Failure category, reusing the client taxonomy.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Api { source } => source.kind(),
            Self::WorkerNotFound { .. } => ErrorKind::NotFound,
            Self::MissingToken { .. } | Self::Storage { .. } => ErrorKind::Internal,
        }
    }

    /// Underlying client error, when the failure came from the backend.
    #[must_use]
    pub const fn api(&self) -> Option<&ApiError> {
        match self {
            Self::Api { source } => Some(source),
            _ => None,
        }
    }

    /// Whether the failure was a session expiry already reported by the auth store.
    #[must_use]
    pub const fn is_session_expired(&self) -> bool {
        matches!(
            self,
            Self::Api {
                source: ApiError::SessionExpired { .. }
            }
        )
    }

    /// Operator-facing text.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Api { source } => source.user_message(),
            Self::WorkerNotFound { .. } => "Worker does not exist".to_string(),
            Self::MissingToken { .. } => {
                "The server did not return a session, please try again".to_string()
            }
            Self::Storage { .. } => "Failed to save the session locally".to_string(),
        }
    }

    /// Text for a caller-driven action: the backend message when present,
    /// otherwise `fallback`.
    #[must_use]
    pub fn action_message(&self, fallback: &str) -> String {
        self.api()
            .and_then(ApiError::backend_message)
            .map_or_else(|| fallback.to_string(), str::to_string)
    }
}
