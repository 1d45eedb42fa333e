//! Prometheus-backed metrics registry and snapshot helpers.
//!
//! # Design
//! - Encapsulates collector registration to keep the public API small.
//! - Poll counters are labelled by store so one registry serves every poller.

use std::sync::Arc;

use prometheus::{Encoder, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};
use serde::Serialize;

use crate::error::{MetricStage, Result, TelemetryError};

/// Store labels reported by the console's pollers.
pub const POLLED_STORES: [&str; 4] = ["workers", "worker_detail", "task_detail", "task_list"];

/// Prometheus-backed metrics registry shared across stores.
#[derive(Clone)]
pub struct Metrics {
    inner: Arc<MetricsInner>,
}

struct MetricsInner {
    registry: Registry,
    poll_ticks_total: IntCounterVec,
    poll_failures_total: IntCounterVec,
    stale_responses_total: IntCounterVec,
    workers_online: IntGauge,
    workers_available: IntGauge,
}

/// Snapshot of the console's counters and gauges.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    /// Poll ticks executed across every store.
    pub poll_ticks_total: u64,
    /// Poll ticks whose fetch failed.
    pub poll_failures_total: u64,
    /// Responses discarded because a newer one was already applied.
    pub stale_responses_total: u64,
    /// Workers whose heartbeat is fresh.
    pub workers_online: i64,
    /// Online workers below the busy thresholds.
    pub workers_available: i64,
}

impl Metrics {
    /// Construct a registry with the standard collectors registered.
    ///
    /// # Errors
    ///
    /// Returns an error if any collector cannot be built or registered.
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let poll_ticks_total = counter_vec("poll_ticks_total", "Poll ticks executed by store")?;
        let poll_failures_total =
            counter_vec("poll_failures_total", "Poll ticks whose fetch failed by store")?;
        let stale_responses_total = counter_vec(
            "stale_responses_total",
            "Out-of-order responses discarded by store",
        )?;
        let workers_online = gauge("workers_online", "Workers with a fresh heartbeat")?;
        let workers_available =
            gauge("workers_available", "Online workers below the busy thresholds")?;

        register(&registry, "poll_ticks_total", &poll_ticks_total)?;
        register(&registry, "poll_failures_total", &poll_failures_total)?;
        register(&registry, "stale_responses_total", &stale_responses_total)?;
        register(&registry, "workers_online", &workers_online)?;
        register(&registry, "workers_available", &workers_available)?;

        Ok(Self {
            inner: Arc::new(MetricsInner {
                registry,
                poll_ticks_total,
                poll_failures_total,
                stale_responses_total,
                workers_online,
                workers_available,
            }),
        })
    }

    /// Count one poll tick for `store`.
    pub fn inc_poll_tick(&self, store: &str) {
        self.inner.poll_ticks_total.with_label_values(&[store]).inc();
    }

    /// Count one failed poll tick for `store`.
    pub fn inc_poll_failure(&self, store: &str) {
        self.inner
            .poll_failures_total
            .with_label_values(&[store])
            .inc();
    }

    /// Count one discarded out-of-order response for `store`.
    pub fn inc_stale_response(&self, store: &str) {
        self.inner
            .stale_responses_total
            .with_label_values(&[store])
            .inc();
    }

    /// Record the fleet counts derived from the latest worker list.
    pub fn set_worker_counts(&self, online: usize, available: usize) {
        self.inner.workers_online.set(to_gauge(online));
        self.inner.workers_available.set(to_gauge(available));
    }

    /// Render the registry using the Prometheus text exposition format.
    ///
    /// # Errors
    ///
    /// Returns an error if the metrics cannot be encoded or the buffer is not
    /// valid UTF-8.
    pub fn render(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let families = self.inner.registry.gather();
        let mut buffer = Vec::new();
        encoder
            .encode(&families, &mut buffer)
            .map_err(|err| TelemetryError::Render {
                source: Box::new(err),
            })?;
        String::from_utf8(buffer).map_err(|err| TelemetryError::Render {
            source: Box::new(err),
        })
    }

    /// Point-in-time totals across every polled store.
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        let total = |vec: &IntCounterVec| {
            POLLED_STORES
                .iter()
                .map(|store| vec.with_label_values(&[*store]).get())
                .sum()
        };
        MetricsSnapshot {
            poll_ticks_total: total(&self.inner.poll_ticks_total),
            poll_failures_total: total(&self.inner.poll_failures_total),
            stale_responses_total: total(&self.inner.stale_responses_total),
            workers_online: self.inner.workers_online.get(),
            workers_available: self.inner.workers_available.get(),
        }
    }
}

fn counter_vec(name: &'static str, help: &str) -> Result<IntCounterVec> {
    IntCounterVec::new(Opts::new(name, help), &["store"])
        .map_err(|source| TelemetryError::MetricSetup {
            name,
            stage: MetricStage::Build,
            source,
        })
}

fn gauge(name: &'static str, help: &str) -> Result<IntGauge> {
    IntGauge::with_opts(Opts::new(name, help))
        .map_err(|source| TelemetryError::MetricSetup {
            name,
            stage: MetricStage::Build,
            source,
        })
}

fn register<C>(registry: &Registry, name: &'static str, collector: &C) -> Result<()>
where
    C: prometheus::core::Collector + Clone + 'static,
{
    registry
        .register(Box::new(collector.clone()))
        .map_err(|source| TelemetryError::MetricSetup {
            name,
            stage: MetricStage::Register,
            source,
        })
}

fn to_gauge(count: usize) -> i64 {
    i64::try_from(count).unwrap_or(i64::MAX)
}
