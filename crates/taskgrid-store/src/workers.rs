//! Worker store: fleet polling, single-worker monitoring and derived counts.
//!
//! # Design
//! - Every fetch replaces the worker list wholesale; nothing is merged.
//! - Fleet and single-worker polling share one slot, so starting either
//!   replaces whichever was running.
//! - Responses are applied in issuance order; a late response for an older
//!   request is dropped.

use std::sync::{Arc, Weak};
use std::time::Duration;

use serde::Serialize;
use taskgrid_client::WorkerApi;
use tokio::sync::watch;
use tracing::{debug, info};

use crate::context::StoreContext;
use crate::error::{StoreError, StoreResult};
use crate::fleet::{Worker, WorkerCounts, fleet_average, find_worker, worker_counts};
use crate::loading::{LoadingGuard, LoadingState, LoadingTracker};
use crate::polling::{PollState, Poller, TickOrigin, TickVerdict};
use crate::resources::ResourceWindow;
use crate::sequence::{RequestSequencer, Ticket};

const STORE: &str = "worker";
const FLEET_METRIC: &str = "workers";
const DETAIL_METRIC: &str = "worker_detail";

/// Observable state of the worker store.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WorkerState {
    /// Latest fleet snapshot.
    pub workers: Vec<Worker>,
    /// Worker being monitored by single-worker polling.
    pub current_worker: Option<Worker>,
    /// Usage history of the monitored worker.
    pub resource_history: ResourceWindow,
    /// Fleet-average usage history.
    pub fleet_history: ResourceWindow,
    /// Workers with a fresh heartbeat.
    pub online_count: usize,
    /// Online workers that are not busy.
    pub available_count: usize,
    /// A user-triggered fetch is in flight.
    pub loading: bool,
    /// Monitored worker absent from the latest list.
    pub missing_worker: Option<String>,
}

impl LoadingState for WorkerState {
    fn loading_mut(&mut self) -> &mut bool {
        &mut self.loading
    }
}

impl WorkerState {
    /// Counts as a pair.
    #[must_use]
    pub const fn counts(&self) -> WorkerCounts {
        WorkerCounts {
            online: self.online_count,
            available: self.available_count,
        }
    }
}

/// Cheap handle over the shared worker state.
#[derive(Clone)]
pub struct WorkerStore {
    inner: Arc<Inner>,
}

struct Inner {
    api: Arc<dyn WorkerApi>,
    context: StoreContext,
    state: watch::Sender<WorkerState>,
    sequence: RequestSequencer,
    loading: LoadingTracker,
    poller: Poller,
}

#[derive(Debug, Clone)]
enum Target {
    Fleet,
    Worker { client_id: String, worker_id: String },
}

impl WorkerStore {
    /// Store backed by `api`.
    #[must_use]
    pub fn new(api: Arc<dyn WorkerApi>, context: StoreContext) -> Self {
        let (state, _) = watch::channel(WorkerState::default());
        Self {
            inner: Arc::new(Inner {
                api,
                context,
                state,
                sequence: RequestSequencer::new(),
                loading: LoadingTracker::new(),
                poller: Poller::new("workers"),
            }),
        }
    }

    /// Receiver notified on every state change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<WorkerState> {
        self.inner.state.subscribe()
    }

    /// Clone of the current state.
    #[must_use]
    pub fn snapshot(&self) -> WorkerState {
        self.inner.state.borrow().clone()
    }

    /// Lifecycle of the poll slot.
    #[must_use]
    pub fn poll_state(&self) -> PollState {
        self.inner.poller.state()
    }

    /// Fetch the fleet once. Failures are surfaced unless a poll is active.
    ///
    /// # Errors
    ///
    /// Returns the classified API failure.
    pub async fn fetch_workers(&self) -> StoreResult<()> {
        let silent = self.inner.poller.is_active();
        self.inner.fetch_workers(silent).await
    }

    /// Fetch the fleet once and pick out `worker_id`, appending one sample to
    /// its resource history.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::WorkerNotFound`] when the list lacks the worker,
    /// or the classified API failure.
    pub async fn fetch_worker_detail(&self, client_id: &str, worker_id: &str) -> StoreResult<Worker> {
        let silent = self.inner.poller.is_active();
        self.inner.fetch_worker(client_id, worker_id, silent).await
    }

    /// Poll the fleet now and then every `interval`, replacing any running poll.
    pub fn start_polling(&self, interval: Duration) {
        info!(store = STORE, interval_ms = interval.as_millis(), "fleet polling started");
        self.start(interval, Target::Fleet);
    }

    /// Poll one worker now and then every `interval`, replacing any running
    /// poll. The resource history restarts empty and responses still in
    /// flight for the previous target are discarded.
    pub fn start_worker_polling(
        &self,
        client_id: impl Into<String>,
        worker_id: impl Into<String>,
        interval: Duration,
    ) {
        let client_id = client_id.into();
        let worker_id = worker_id.into();
        info!(
            store = STORE,
            worker_id = %worker_id,
            interval_ms = interval.as_millis(),
            "worker polling started"
        );
        self.inner.poller.stop();
        self.inner.state.send_modify(|state| {
            state.resource_history.clear();
            state.current_worker = None;
            state.missing_worker = None;
            self.inner.sequence.fence();
        });
        self.start(
            interval,
            Target::Worker {
                client_id,
                worker_id,
            },
        );
    }

    /// Cancel the timer. A request already in flight still lands.
    pub fn stop_polling(&self) {
        self.inner.poller.stop();
    }

    fn start(&self, interval: Duration, target: Target) {
        let weak = Arc::downgrade(&self.inner);
        self.inner.poller.start(interval, move |origin| {
            tick(weak.clone(), target.clone(), origin)
        });
    }
}

async fn tick(weak: Weak<Inner>, target: Target, origin: TickOrigin) -> TickVerdict {
    let Some(inner) = weak.upgrade() else {
        return TickVerdict::Detached;
    };
    let silent = origin.is_silent();
    let (metric, result) = match &target {
        Target::Fleet => (FLEET_METRIC, inner.fetch_workers(silent).await),
        Target::Worker {
            client_id,
            worker_id,
        } => (
            DETAIL_METRIC,
            inner.fetch_worker(client_id, worker_id, silent).await.map(drop),
        ),
    };
    inner.context.record_tick(metric, result.is_err());
    if result.is_ok() {
        TickVerdict::Continue
    } else {
        TickVerdict::Failed
    }
}

impl Inner {
    async fn fetch_workers(&self, silent: bool) -> StoreResult<()> {
        let (ticket, loading) = self.begin(silent);
        let response = self.api.list_workers().await;
        drop(loading);

        let response = match response {
            Ok(response) => response,
            Err(source) => {
                let err = StoreError::from(source);
                self.context.report_fetch_failure(STORE, &err, silent);
                return Err(err);
            }
        };

        let now = self.context.clock.now();
        let workers: Vec<Worker> = response
            .workers
            .into_iter()
            .map(|dto| Worker::from_dto(dto, now))
            .collect();
        let average = fleet_average(&workers, now);
        self.apply(ticket, FLEET_METRIC, workers, |state| {
            if let Some(sample) = average {
                state.fleet_history.push(sample);
            }
        });
        Ok(())
    }

    async fn fetch_worker(
        &self,
        client_id: &str,
        worker_id: &str,
        silent: bool,
    ) -> StoreResult<Worker> {
        let (ticket, loading) = self.begin(silent);
        let response = self.api.list_workers().await;
        drop(loading);

        let response = match response {
            Ok(response) => response,
            Err(source) => {
                let err = StoreError::from(source);
                self.context.report_fetch_failure(STORE, &err, silent);
                return Err(err);
            }
        };

        let now = self.context.clock.now();
        let workers: Vec<Worker> = response
            .workers
            .into_iter()
            .map(|dto| Worker::from_dto(dto, now))
            .collect();
        let found = find_worker(&workers, worker_id).cloned();
        let sample = found.as_ref().map(|worker| worker.sample(now));
        let monitored = found.clone();
        let missing = worker_id.to_string();
        self.apply(ticket, DETAIL_METRIC, workers, move |state| {
            if let Some(sample) = sample {
                state.resource_history.push(sample);
                state.missing_worker = None;
            } else {
                state.missing_worker = Some(missing);
            }
            state.current_worker = monitored;
        });

        found.ok_or_else(|| {
            debug!(store = STORE, client_id, worker_id, "worker absent from fleet list");
            let err = StoreError::WorkerNotFound {
                worker_id: worker_id.to_string(),
            };
            self.context.report_fetch_failure(STORE, &err, silent);
            err
        })
    }

    fn begin(&self, silent: bool) -> (Ticket, Option<LoadingGuard<'_, WorkerState>>) {
        let loading = (!silent).then(|| self.loading.enter(&self.state));
        (self.sequence.issue(), loading)
    }

    fn apply(
        &self,
        ticket: Ticket,
        metric: &'static str,
        workers: Vec<Worker>,
        extra: impl FnOnce(&mut WorkerState),
    ) {
        let counts = worker_counts(&workers);
        let applied = self.state.send_if_modified(|state| {
            if !self.sequence.try_apply(ticket) {
                return false;
            }
            state.workers = workers;
            state.online_count = counts.online;
            state.available_count = counts.available;
            extra(state);
            true
        });

        if applied {
            if let Some(metrics) = &self.context.metrics {
                metrics.set_worker_counts(counts.online, counts.available);
            }
        } else {
            debug!(
                store = STORE,
                ticket = ticket.value(),
                last_applied = self.sequence.last_applied(),
                "discarded stale worker response"
            );
            self.context.record_stale(metric);
        }
    }
}
