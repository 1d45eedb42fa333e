//! Baseline values used when neither the environment nor flags override them.
//!
//! # Design
//! - Poll cadences match what the web dashboard used so both front ends put the
//!   same load on the backend.

use std::time::Duration;

/// Backend API base, including the `/api` prefix.
pub const API_BASE_URL: &str = "http://localhost:8080/api";
/// Per-request timeout.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
/// Fleet list poll cadence.
pub const WORKER_POLL_INTERVAL: Duration = Duration::from_millis(5_000);
/// Single-worker detail poll cadence.
pub const WORKER_DETAIL_POLL_INTERVAL: Duration = Duration::from_millis(3_000);
/// Single-task poll cadence.
pub const TASK_POLL_INTERVAL: Duration = Duration::from_millis(3_000);
/// Task list poll cadence.
pub const TASK_LIST_POLL_INTERVAL: Duration = Duration::from_millis(5_000);
/// Shared session cookie lifetime.
pub const COOKIE_TTL_DAYS: u32 = 7;
/// Log level directive.
pub const LOG_LEVEL: &str = "info";
/// Directory name below the platform configuration directory.
pub const SESSION_DIR_NAME: &str = "taskgrid";
/// Session directory used when no configuration home can be determined.
pub const FALLBACK_SESSION_DIR: &str = ".taskgrid";

/// Shortest accepted poll interval.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(250);
/// Longest accepted poll interval.
pub const MAX_POLL_INTERVAL: Duration = Duration::from_secs(600);
/// Longest accepted cookie lifetime.
pub const MAX_COOKIE_TTL_DAYS: u32 = 365;
