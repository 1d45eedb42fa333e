//! Durable session persistence contract.
//!
//! The HTTP layer reads from a [`SessionStore`] before every request to attach
//! the bearer token; the auth store writes to it on login and logout. Both run
//! on the same logical task, and implementations must make a completed
//! `save`/`clear` visible to the very next `load`.

use serde::{Deserialize, Serialize};

use crate::error::StorageResult;

/// Session fields persisted across restarts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredSession {
    /// Bearer token.
    pub token: String,
    /// Name shown in the console header.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// Organisation of the signed-in user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    /// Signed-in user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

impl StoredSession {
    /// Session holding only a token.
    #[must_use]
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            display_name: None,
            client_id: None,
            user_id: None,
        }
    }

    /// Whether the token carries usable credentials.
    #[must_use]
    pub fn has_token(&self) -> bool {
        !self.token.trim().is_empty()
    }
}

/// Durable storage for the signed-in session.
pub trait SessionStore: Send + Sync {
    /// Read the persisted session, if any.
    ///
    /// # Errors
    ///
    /// Returns an error when the backing storage cannot be read.
    fn load(&self) -> StorageResult<Option<StoredSession>>;

    /// Persist the session, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns an error when the backing storage cannot be written.
    fn save(&self, session: &StoredSession) -> StorageResult<()>;

    /// Remove every persisted session field.
    ///
    /// # Errors
    ///
    /// Returns an error when the backing storage cannot be written.
    fn clear(&self) -> StorageResult<()>;
}
