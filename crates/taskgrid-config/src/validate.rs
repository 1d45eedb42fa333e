//! Range and scheme checks applied after every overlay.

use std::time::Duration;

use url::Url;

use crate::defaults::{MAX_COOKIE_TTL_DAYS, MAX_POLL_INTERVAL, MIN_POLL_INTERVAL};
use crate::error::{ConfigError, ConfigResult};
use crate::model::ConsoleConfig;

/// Parse an API base URL, accepting only `http` and `https`.
///
/// # Errors
///
/// Returns an error if the value is not an absolute http(s) URL.
pub fn parse_api_url(field: &'static str, raw: &str) -> ConfigResult<Url> {
    let url = Url::parse(raw.trim()).map_err(|_| {
        ConfigError::invalid(field, Some(raw.to_string()), "must be an absolute URL")
    })?;
    ensure_http(field, &url)?;
    Ok(url)
}

/// Check every field of a loaded configuration.
///
/// # Errors
///
/// Returns the first field that falls outside its accepted range.
pub fn validate(config: &ConsoleConfig) -> ConfigResult<()> {
    ensure_http("api_base_url", &config.api_base_url)?;
    if config.request_timeout.is_zero() {
        return Err(ConfigError::invalid(
            "request_timeout",
            None,
            "must be greater than zero",
        ));
    }
    ensure_interval("worker_poll_interval", config.worker_poll_interval)?;
    ensure_interval(
        "worker_detail_poll_interval",
        config.worker_detail_poll_interval,
    )?;
    ensure_interval("task_poll_interval", config.task_poll_interval)?;
    ensure_interval("task_list_poll_interval", config.task_list_poll_interval)?;
    if !(1..=MAX_COOKIE_TTL_DAYS).contains(&config.cookie_ttl_days) {
        return Err(ConfigError::invalid(
            "cookie_ttl_days",
            Some(config.cookie_ttl_days.to_string()),
            "must be between 1 and 365 days",
        ));
    }
    if config
        .cookie_domain
        .as_deref()
        .is_some_and(|domain| domain.trim().is_empty() || domain.contains(char::is_whitespace))
    {
        return Err(ConfigError::invalid(
            "cookie_domain",
            config.cookie_domain.clone(),
            "must be a bare domain name",
        ));
    }
    Ok(())
}

/// Check one poll interval against the accepted range.
///
/// # Errors
///
/// Returns an error if the interval is shorter than 250 ms or longer than ten
/// minutes.
pub fn ensure_interval(field: &'static str, interval: Duration) -> ConfigResult<()> {
    if (MIN_POLL_INTERVAL..=MAX_POLL_INTERVAL).contains(&interval) {
        Ok(())
    } else {
        Err(ConfigError::invalid(
            field,
            Some(format!("{}ms", interval.as_millis())),
            "must be between 250ms and 10 minutes",
        ))
    }
}

fn ensure_http(field: &'static str, url: &Url) -> ConfigResult<()> {
    match url.scheme() {
        "http" | "https" if !url.cannot_be_a_base() => Ok(()),
        _ => Err(ConfigError::invalid(
            field,
            Some(url.to_string()),
            "must use http or https",
        )),
    }
}
