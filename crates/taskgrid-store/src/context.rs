//! Collaborators shared by every store.

use std::sync::Arc;

use taskgrid_core::{Clock, Notice, Notifier, SystemClock, TracingNotifier};
use taskgrid_telemetry::Metrics;
use tracing::warn;

use crate::error::StoreError;

/// Clock, notice sink and optional metrics injected into each store.
#[derive(Clone)]
pub struct StoreContext {
    /// Time source for heartbeat freshness and sample timestamps.
    pub clock: Arc<dyn Clock>,
    /// Sink for operator-facing notices.
    pub notifier: Arc<dyn Notifier>,
    /// Poll counters and fleet gauges.
    pub metrics: Option<Metrics>,
}

impl StoreContext {
    /// Context with explicit collaborators and no metrics.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            clock,
            notifier,
            metrics: None,
        }
    }

    /// Attach a metrics registry.
    #[must_use]
    pub fn with_metrics(mut self, metrics: Metrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub(crate) fn record_tick(&self, store: &str, failed: bool) {
        if let Some(metrics) = &self.metrics {
            metrics.inc_poll_tick(store);
            if failed {
                metrics.inc_poll_failure(store);
            }
        }
    }

    pub(crate) fn notify(&self, notice: Notice) {
        self.notifier.notify(notice);
    }

    /// Log a fetch failure and surface it unless silent. Session expiry is
    /// left to the auth store, which reports it once.
    pub(crate) fn report_fetch_failure(&self, store: &'static str, err: &StoreError, silent: bool) {
        warn!(store, silent, error = %err, kind = ?err.kind(), "fetch failed");
        if !silent && !err.is_session_expired() {
            self.notify(Notice::error(err.user_message()));
        }
    }

    /// Log a caller-driven failure and surface exactly one notice.
    pub(crate) fn report_action_failure(
        &self,
        store: &'static str,
        err: &StoreError,
        fallback: &str,
    ) {
        warn!(store, error = %err, kind = ?err.kind(), "action failed");
        if !err.is_session_expired() {
            self.notify(Notice::error(err.action_message(fallback)));
        }
    }

    pub(crate) fn record_stale(&self, store: &str) {
        if let Some(metrics) = &self.metrics {
            metrics.inc_stale_response(store);
        }
    }
}

impl Default for StoreContext {
    /// System clock with notices forwarded to `tracing`.
    fn default() -> Self {
        Self::new(Arc::new(SystemClock), Arc::new(TracingNotifier))
    }
}
