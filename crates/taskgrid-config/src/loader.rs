//! Environment overlay.
//!
//! # Design
//! - `from_lookup` takes the variable source as a closure so tests never touch
//!   the process environment; `from_env` is the thin production wrapper.
//! - Blank variables are treated as unset.

use std::path::PathBuf;
use std::time::Duration;

use taskgrid_telemetry::LogFormat;
use tracing::debug;

use crate::error::{ConfigError, ConfigResult};
use crate::model::ConsoleConfig;
use crate::validate::{parse_api_url, validate};

/// API base URL override.
pub const ENV_API_URL: &str = "TASKGRID_API_URL";
/// Request timeout override, in seconds.
pub const ENV_HTTP_TIMEOUT_SECS: &str = "TASKGRID_HTTP_TIMEOUT_SECS";
/// Fleet poll cadence override, in milliseconds.
pub const ENV_WORKER_POLL_MS: &str = "TASKGRID_WORKER_POLL_MS";
/// Worker detail poll cadence override, in milliseconds.
pub const ENV_WORKER_DETAIL_POLL_MS: &str = "TASKGRID_WORKER_DETAIL_POLL_MS";
/// Task detail poll cadence override, in milliseconds.
pub const ENV_TASK_POLL_MS: &str = "TASKGRID_TASK_POLL_MS";
/// Task list poll cadence override, in milliseconds.
pub const ENV_TASK_LIST_POLL_MS: &str = "TASKGRID_TASK_LIST_POLL_MS";
/// Session directory override.
pub const ENV_SESSION_DIR: &str = "TASKGRID_SESSION_DIR";
/// Shared cookie domain.
pub const ENV_COOKIE_DOMAIN: &str = "TASKGRID_COOKIE_DOMAIN";
/// Shared cookie lifetime override, in days.
pub const ENV_COOKIE_TTL_DAYS: &str = "TASKGRID_COOKIE_TTL_DAYS";
/// Log level override.
pub const ENV_LOG_LEVEL: &str = "TASKGRID_LOG_LEVEL";
/// Log format override (`json` or `pretty`).
pub const ENV_LOG_FORMAT: &str = "TASKGRID_LOG_FORMAT";

impl ConsoleConfig {
    /// Load defaults overlaid with the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error when a variable fails to parse or validate.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load defaults overlaid with variables supplied by `lookup`.
    ///
    /// # Errors
    ///
    /// Returns an error when a variable fails to parse or validate.
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let config_home = get("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| get("HOME").map(|home| PathBuf::from(home).join(".config")));
        let mut config = Self::with_config_home(config_home)?;

        if let Some(raw) = get(ENV_API_URL) {
            config.api_base_url = parse_api_url("api_base_url", &raw)?;
        }
        if let Some(raw) = get(ENV_HTTP_TIMEOUT_SECS) {
            config.request_timeout = Duration::from_secs(parse_number("request_timeout", &raw)?);
        }
        if let Some(raw) = get(ENV_WORKER_POLL_MS) {
            config.worker_poll_interval = parse_millis("worker_poll_interval", &raw)?;
        }
        if let Some(raw) = get(ENV_WORKER_DETAIL_POLL_MS) {
            config.worker_detail_poll_interval =
                parse_millis("worker_detail_poll_interval", &raw)?;
        }
        if let Some(raw) = get(ENV_TASK_POLL_MS) {
            config.task_poll_interval = parse_millis("task_poll_interval", &raw)?;
        }
        if let Some(raw) = get(ENV_TASK_LIST_POLL_MS) {
            config.task_list_poll_interval = parse_millis("task_list_poll_interval", &raw)?;
        }
        if let Some(raw) = get(ENV_SESSION_DIR) {
            config.session_dir = PathBuf::from(raw);
        }
        config.cookie_domain = get(ENV_COOKIE_DOMAIN);
        if let Some(raw) = get(ENV_COOKIE_TTL_DAYS) {
            config.cookie_ttl_days = parse_number("cookie_ttl_days", &raw)?;
        }
        if let Some(raw) = get(ENV_LOG_LEVEL) {
            config.log_level = raw;
        }
        if let Some(raw) = get(ENV_LOG_FORMAT) {
            config.log_format = raw.parse::<LogFormat>().map_err(|_| {
                ConfigError::invalid("log_format", Some(raw.clone()), "must be json or pretty")
            })?;
        }

        validate(&config)?;
        debug!(
            api = %config.api_base_url,
            session_dir = %config.session_dir.display(),
            "console configuration loaded"
        );
        Ok(config)
    }
}

fn parse_number<T: std::str::FromStr>(field: &'static str, raw: &str) -> ConfigResult<T> {
    raw.parse::<T>().map_err(|_| {
        ConfigError::invalid(
            field,
            Some(raw.to_string()),
            "must be a non-negative integer",
        )
    })
}

fn parse_millis(field: &'static str, raw: &str) -> ConfigResult<Duration> {
    parse_number::<u64>(field, raw).map(Duration::from_millis)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> ConfigResult<ConsoleConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
            .collect();
        ConsoleConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn overrides_apply_on_top_of_defaults() -> ConfigResult<()> {
        let config = load(&[
            (ENV_API_URL, "https://grid.example.com/api"),
            (ENV_HTTP_TIMEOUT_SECS, "30"),
            (ENV_TASK_POLL_MS, "1500"),
            (ENV_SESSION_DIR, "/var/lib/taskgrid"),
            (ENV_COOKIE_DOMAIN, ".example.com"),
            (ENV_COOKIE_TTL_DAYS, "14"),
            (ENV_LOG_FORMAT, "json"),
        ])?;
        assert_eq!(config.api_base_url.as_str(), "https://grid.example.com/api");
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.task_poll_interval, Duration::from_millis(1500));
        assert_eq!(config.worker_poll_interval, Duration::from_secs(5));
        assert_eq!(config.session_dir, PathBuf::from("/var/lib/taskgrid"));
        assert_eq!(config.cookie_domain.as_deref(), Some(".example.com"));
        assert_eq!(config.cookie_ttl_days, 14);
        assert_eq!(config.log_format, LogFormat::Json);
        Ok(())
    }

    #[test]
    fn blank_values_are_ignored() -> ConfigResult<()> {
        let config = load(&[(ENV_API_URL, "  "), (ENV_COOKIE_DOMAIN, "")])?;
        assert_eq!(config.api_base_url.as_str(), "http://localhost:8080/api");
        assert_eq!(config.cookie_domain, None);
        Ok(())
    }

    #[test]
    fn session_dir_follows_config_home() -> ConfigResult<()> {
        let xdg = load(&[("XDG_CONFIG_HOME", "/cfg"), ("HOME", "/home/ops")])?;
        assert_eq!(xdg.session_dir, PathBuf::from("/cfg/taskgrid"));
        let home = load(&[("HOME", "/home/ops")])?;
        assert_eq!(home.session_dir, PathBuf::from("/home/ops/.config/taskgrid"));
        Ok(())
    }

    #[test]
    fn malformed_values_name_the_field() {
        let err = load(&[(ENV_WORKER_POLL_MS, "fast")]);
        assert!(matches!(
            err,
            Err(ConfigError::InvalidField {
                field: "worker_poll_interval",
                ..
            })
        ));
        let err = load(&[(ENV_WORKER_POLL_MS, "100")]);
        assert!(matches!(
            err,
            Err(ConfigError::InvalidField {
                field: "worker_poll_interval",
                ..
            })
        ));
        assert!(load(&[(ENV_LOG_FORMAT, "xml")]).is_err());
        assert!(load(&[(ENV_HTTP_TIMEOUT_SECS, "0")]).is_err());
    }
}
