//! Durable session stores.
//!
//! Layout: `local.rs` (same-origin JSON document), `cookie.rs` (shared cookie
//! jar), and [`DualSessionStore`] which keeps both in step.

pub mod cookie;
pub mod local;

use std::path::Path;

use taskgrid_core::{SessionStore, StorageResult, StoredSession};

pub use self::cookie::{CookieSessionStore, CookieSettings};
pub use self::local::LocalSessionStore;

/// Writes to both the local document and the cookie jar.
///
/// Reads prefer the cookie jar for the token and display name so a login made
/// by a sibling application wins; organisation and user identifiers only live
/// in the local document.
#[derive(Debug, Clone)]
pub struct DualSessionStore {
    local: LocalSessionStore,
    cookies: CookieSessionStore,
}

impl DualSessionStore {
    /// Combine two stores.
    #[must_use]
    pub const fn new(local: LocalSessionStore, cookies: CookieSessionStore) -> Self {
        Self { local, cookies }
    }

    /// Both stores rooted in `dir`.
    #[must_use]
    pub fn in_dir(dir: impl AsRef<Path>, settings: CookieSettings) -> Self {
        let dir = dir.as_ref();
        Self::new(
            LocalSessionStore::in_dir(dir),
            CookieSessionStore::in_dir(dir, settings),
        )
    }
}

impl SessionStore for DualSessionStore {
    fn load(&self) -> StorageResult<Option<StoredSession>> {
        let cookie = self.cookies.load()?;
        let local = self.local.load()?;
        let (token, display_name) = match (&cookie, &local) {
            (Some(cookie), local) => (
                cookie.token.clone(),
                cookie
                    .display_name
                    .clone()
                    .or_else(|| local.as_ref().and_then(|s| s.display_name.clone())),
            ),
            (None, Some(local)) => (local.token.clone(), local.display_name.clone()),
            (None, None) => return Ok(None),
        };
        let (client_id, user_id) = local
            .map(|session| (session.client_id, session.user_id))
            .unwrap_or_default();
        Ok(Some(StoredSession {
            token,
            display_name,
            client_id,
            user_id,
        }))
    }

    fn save(&self, session: &StoredSession) -> StorageResult<()> {
        self.local.save(session)?;
        self.cookies.save(session)
    }

    fn clear(&self) -> StorageResult<()> {
        let local = self.local.clear();
        let cookies = self.cookies.clear();
        local.and(cookies)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cookie_token_wins_and_ids_come_from_local() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let store = DualSessionStore::in_dir(dir.path(), CookieSettings::default());
        store.save(&StoredSession {
            token: "local-token".to_string(),
            display_name: Some("Ada".to_string()),
            client_id: Some("c-1".to_string()),
            user_id: Some("u-1".to_string()),
        })?;

        let sibling = CookieSessionStore::in_dir(dir.path(), CookieSettings::default());
        sibling.save(&StoredSession::with_token("sibling-token"))?;

        let loaded = store.load()?.ok_or_else(|| anyhow::anyhow!("session missing"))?;
        assert_eq!(loaded.token, "sibling-token");
        assert_eq!(loaded.display_name.as_deref(), Some("Ada"));
        assert_eq!(loaded.client_id.as_deref(), Some("c-1"));
        assert_eq!(loaded.user_id.as_deref(), Some("u-1"));
        Ok(())
    }

    #[test]
    fn clear_empties_both_stores() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let store = DualSessionStore::in_dir(dir.path(), CookieSettings::default());
        store.save(&StoredSession::with_token("tok"))?;
        store.clear()?;
        assert_eq!(store.load()?, None);
        Ok(())
    }
}
