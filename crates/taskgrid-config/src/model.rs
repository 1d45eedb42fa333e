//! Typed console configuration.

use std::path::PathBuf;
use std::time::Duration;

use taskgrid_telemetry::LogFormat;
use url::Url;

use crate::defaults;
use crate::error::{ConfigError, ConfigResult};

/// Settings shared by every console command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleConfig {
    /// Backend API base, including the `/api` prefix.
    pub api_base_url: Url,
    /// Per-request timeout.
    pub request_timeout: Duration,
    /// Fleet list poll cadence.
    pub worker_poll_interval: Duration,
    /// Single-worker detail poll cadence.
    pub worker_detail_poll_interval: Duration,
    /// Single-task poll cadence.
    pub task_poll_interval: Duration,
    /// Task list poll cadence.
    pub task_list_poll_interval: Duration,
    /// Directory holding `session.json` and `cookies.txt`.
    pub session_dir: PathBuf,
    /// Parent domain for the shared session cookie; host-only when absent.
    pub cookie_domain: Option<String>,
    /// Shared session cookie lifetime in days.
    pub cookie_ttl_days: u32,
    /// Log level directive.
    pub log_level: String,
    /// Log output format.
    pub log_format: LogFormat,
}

impl ConsoleConfig {
    /// Defaults with the session directory rooted at `config_home`.
    ///
    /// # Errors
    ///
    /// Returns an error if the built-in API URL fails to parse.
    pub fn with_config_home(config_home: Option<PathBuf>) -> ConfigResult<Self> {
        let api_base_url = Url::parse(defaults::API_BASE_URL).map_err(|_| {
            ConfigError::invalid(
                "api_base_url",
                Some(defaults::API_BASE_URL.to_string()),
                "must be an absolute URL",
            )
        })?;
        let session_dir = config_home.map_or_else(
            || PathBuf::from(defaults::FALLBACK_SESSION_DIR),
            |home| home.join(defaults::SESSION_DIR_NAME),
        );
        Ok(Self {
            api_base_url,
            request_timeout: defaults::REQUEST_TIMEOUT,
            worker_poll_interval: defaults::WORKER_POLL_INTERVAL,
            worker_detail_poll_interval: defaults::WORKER_DETAIL_POLL_INTERVAL,
            task_poll_interval: defaults::TASK_POLL_INTERVAL,
            task_list_poll_interval: defaults::TASK_LIST_POLL_INTERVAL,
            session_dir,
            cookie_domain: None,
            cookie_ttl_days: defaults::COOKIE_TTL_DAYS,
            log_level: defaults::LOG_LEVEL.to_string(),
            log_format: LogFormat::infer(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_dashboard_cadence() -> ConfigResult<()> {
        let config = ConsoleConfig::with_config_home(Some(PathBuf::from("/home/ops/.config")))?;
        assert_eq!(config.api_base_url.as_str(), "http://localhost:8080/api");
        assert_eq!(config.worker_poll_interval, Duration::from_secs(5));
        assert_eq!(config.worker_detail_poll_interval, Duration::from_secs(3));
        assert_eq!(config.task_poll_interval, Duration::from_secs(3));
        assert_eq!(config.task_list_poll_interval, Duration::from_secs(5));
        assert_eq!(config.session_dir, PathBuf::from("/home/ops/.config/taskgrid"));
        assert_eq!(config.cookie_ttl_days, 7);
        Ok(())
    }

    #[test]
    fn missing_config_home_falls_back_to_working_directory() -> ConfigResult<()> {
        let config = ConsoleConfig::with_config_home(None)?;
        assert_eq!(config.session_dir, PathBuf::from(".taskgrid"));
        Ok(())
    }
}
