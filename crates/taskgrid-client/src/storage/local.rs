//! Same-origin session store: one JSON document on disk.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use taskgrid_core::{SessionStore, StorageError, StorageResult, StoredSession};
use tracing::debug;

/// File name used inside the session directory.
pub const SESSION_FILE: &str = "session.json";

/// Persists the full [`StoredSession`] as `session.json`.
#[derive(Debug, Clone)]
pub struct LocalSessionStore {
    path: PathBuf,
}

impl LocalSessionStore {
    /// Store backed by `session.json` inside `dir`.
    #[must_use]
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(SESSION_FILE),
        }
    }

    /// Location of the session document.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStore for LocalSessionStore {
    fn load(&self) -> StorageResult<Option<StoredSession>> {
        let raw = match fs::read(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(StorageError::io("local.load", &self.path, err)),
        };
        let session: StoredSession = serde_json::from_slice(&raw)
            .map_err(|err| StorageError::json("local.load", &self.path, err))?;
        Ok(session.has_token().then_some(session))
    }

    fn save(&self, session: &StoredSession) -> StorageResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .map_err(|err| StorageError::io("local.create_dir", parent, err))?;
        }
        let payload = serde_json::to_vec_pretty(session)
            .map_err(|err| StorageError::json("local.save", &self.path, err))?;
        fs::write(&self.path, payload)
            .map_err(|err| StorageError::io("local.save", &self.path, err))?;
        debug!(path = %self.path.display(), "session saved");
        Ok(())
    }

    fn clear(&self) -> StorageResult<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(StorageError::io("local.clear", &self.path, err)),
        }
    }
}
