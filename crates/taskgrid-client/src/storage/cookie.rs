//! Cookie-jar session store shared with sibling applications.
//!
//! The jar is a text file of `Set-Cookie` lines. A sibling console on a related
//! domain reads the same `token` and `displayName` cookies, so logout writes
//! expired removal cookies instead of deleting the file.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use cookie::{Cookie, SameSite};
use taskgrid_core::{SessionStore, StorageError, StorageResult, StoredSession};
use time::{Duration, OffsetDateTime};

/// File name used inside the session directory.
pub const COOKIE_JAR_FILE: &str = "cookies.txt";
/// Cookie holding the bearer token.
pub const TOKEN_COOKIE: &str = "token";
/// Cookie holding the display name.
pub const DISPLAY_NAME_COOKIE: &str = "displayName";
/// Default cookie lifetime.
pub const DEFAULT_COOKIE_TTL_DAYS: u32 = 7;

/// Cookie attributes applied to every written cookie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieSettings {
    /// Shared parent domain (for example `.example.com`); host-only when absent.
    pub domain: Option<String>,
    /// Lifetime in days.
    pub ttl_days: u32,
}

impl Default for CookieSettings {
    fn default() -> Self {
        Self {
            domain: None,
            ttl_days: DEFAULT_COOKIE_TTL_DAYS,
        }
    }
}

/// Persists `token` and `displayName` cookies to a jar file.
#[derive(Debug, Clone)]
pub struct CookieSessionStore {
    path: PathBuf,
    settings: CookieSettings,
}

impl CookieSessionStore {
    /// Store backed by `cookies.txt` inside `dir`.
    #[must_use]
    pub fn in_dir(dir: impl AsRef<Path>, settings: CookieSettings) -> Self {
        Self {
            path: dir.as_ref().join(COOKIE_JAR_FILE),
            settings,
        }
    }

    /// Location of the jar file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn live_cookie(&self, name: &'static str, value: &str) -> Cookie<'static> {
        let ttl = Duration::days(i64::from(self.settings.ttl_days));
        let mut builder = Cookie::build((name, value.to_string()))
            .path("/")
            .max_age(ttl)
            .expires(OffsetDateTime::now_utc() + ttl)
            .same_site(SameSite::Lax)
            .secure(true);
        if let Some(domain) = &self.settings.domain {
            builder = builder.domain(domain.clone());
        }
        builder.build()
    }

    fn removal_cookie(&self, name: &'static str) -> Cookie<'static> {
        let mut builder = Cookie::build((name, ""))
            .path("/")
            .max_age(Duration::ZERO)
            .expires(OffsetDateTime::UNIX_EPOCH);
        if let Some(domain) = &self.settings.domain {
            builder = builder.domain(domain.clone());
        }
        builder.build()
    }

    fn write_jar(&self, cookies: &[Cookie<'static>]) -> StorageResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .map_err(|err| StorageError::io("cookie.create_dir", parent, err))?;
        }
        let mut jar = String::new();
        for cookie in cookies {
            jar.push_str(&cookie.encoded().to_string());
            jar.push('\n');
        }
        fs::write(&self.path, jar).map_err(|err| StorageError::io("cookie.save", &self.path, err))
    }

    fn read_jar(&self) -> StorageResult<Vec<Cookie<'static>>> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(StorageError::io("cookie.load", &self.path, err)),
        };
        let now = OffsetDateTime::now_utc();
        Ok(raw
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .filter_map(|line| Cookie::parse_encoded(line.to_string()).ok())
            .filter(|cookie| is_live(cookie, now))
            .collect())
    }
}

fn is_live(cookie: &Cookie<'_>, now: OffsetDateTime) -> bool {
    if cookie.value().is_empty() {
        return false;
    }
    if cookie.max_age().is_some_and(|age| age <= Duration::ZERO) {
        return false;
    }
    cookie
        .expires_datetime()
        .is_none_or(|expires| expires > now)
}

impl SessionStore for CookieSessionStore {
    fn load(&self) -> StorageResult<Option<StoredSession>> {
        let cookies = self.read_jar()?;
        let value_of = |name: &str| {
            cookies
                .iter()
                .find(|cookie| cookie.name() == name)
                .map(|cookie| cookie.value().to_string())
        };
        Ok(value_of(TOKEN_COOKIE).map(|token| StoredSession {
            token,
            display_name: value_of(DISPLAY_NAME_COOKIE),
            client_id: None,
            user_id: None,
        }))
    }

    fn save(&self, session: &StoredSession) -> StorageResult<()> {
        let display = match session.display_name.as_deref() {
            Some(name) if !name.is_empty() => self.live_cookie(DISPLAY_NAME_COOKIE, name),
            _ => self.removal_cookie(DISPLAY_NAME_COOKIE),
        };
        self.write_jar(&[self.live_cookie(TOKEN_COOKIE, &session.token), display])
    }

    fn clear(&self) -> StorageResult<()> {
        self.write_jar(&[
            self.removal_cookie(TOKEN_COOKIE),
            self.removal_cookie(DISPLAY_NAME_COOKIE),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(dir: &Path) -> CookieSessionStore {
        CookieSessionStore::in_dir(
            dir,
            CookieSettings {
                domain: Some(".example.com".to_string()),
                ttl_days: 7,
            },
        )
    }

    #[test]
    fn saved_cookies_carry_shared_attributes() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let store = store(dir.path());
        let mut session = StoredSession::with_token("tok-9");
        session.display_name = Some("Grace Hopper".to_string());
        store.save(&session)?;

        let jar = fs::read_to_string(store.path())?;
        let token_line = jar
            .lines()
            .find(|line| line.starts_with("token="))
            .ok_or_else(|| anyhow::anyhow!("token cookie missing"))?;
        assert!(token_line.contains("Domain="));
        assert!(token_line.contains("example.com"));
        assert!(token_line.contains("Path=/"));
        assert!(token_line.contains("SameSite=Lax"));
        assert!(token_line.contains("Secure"));
        assert!(token_line.contains("Max-Age=604800"));

        let loaded = store.load()?.ok_or_else(|| anyhow::anyhow!("session missing"))?;
        assert_eq!(loaded.token, "tok-9");
        assert_eq!(loaded.display_name.as_deref(), Some("Grace Hopper"));
        Ok(())
    }

    #[test]
    fn clear_leaves_removal_cookies_behind() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let store = store(dir.path());
        store.save(&StoredSession::with_token("tok"))?;
        store.clear()?;
        assert!(store.path().exists());
        assert_eq!(store.load()?, None);
        Ok(())
    }

    #[test]
    fn expired_cookies_are_ignored() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let store = store(dir.path());
        fs::write(
            store.path(),
            "token=stale; Path=/; Expires=Thu, 01 Jan 2015 00:00:00 GMT\n",
        )?;
        assert_eq!(store.load()?, None);
        Ok(())
    }
}
