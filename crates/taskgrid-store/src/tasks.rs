//! Task store: list refresh, creation and self-terminating detail polling.
//!
//! Detail polling stops on its own once the fetched task reaches `success` or
//! `failure`. List polling never self-terminates. The two use independent
//! slots and sequencers.

use std::sync::{Arc, Weak};
use std::time::Duration;

use serde::Serialize;
use taskgrid_api_models::{CreateTaskRequest, Task};
use taskgrid_client::TaskApi;
use taskgrid_core::Notice;
use tokio::sync::watch;
use tracing::{debug, info};

use crate::context::StoreContext;
use crate::error::{StoreError, StoreResult};
use crate::loading::{LoadingGuard, LoadingState, LoadingTracker};
use crate::polling::{PollState, Poller, TickOrigin, TickVerdict};
use crate::progress::{TaskOverview, task_overview};
use crate::sequence::RequestSequencer;

const STORE: &str = "task";
const DETAIL_METRIC: &str = "task_detail";
const LIST_METRIC: &str = "task_list";

/// Detail poll interval used when the caller has no preference.
pub const DEFAULT_TASK_POLL_INTERVAL: Duration = Duration::from_millis(3000);

/// Observable state of the task store.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TaskState {
    /// Latest task list.
    pub tasks: Vec<Task>,
    /// Task being watched by detail polling.
    pub current_task: Option<Task>,
    /// A user-triggered fetch is in flight.
    pub loading: bool,
}

impl LoadingState for TaskState {
    fn loading_mut(&mut self) -> &mut bool {
        &mut self.loading
    }
}

/// Cheap handle over the shared task state.
#[derive(Clone)]
pub struct TaskStore {
    inner: Arc<Inner>,
}

struct Inner {
    api: Arc<dyn TaskApi>,
    context: StoreContext,
    state: watch::Sender<TaskState>,
    detail_sequence: RequestSequencer,
    list_sequence: RequestSequencer,
    loading: LoadingTracker,
    detail_poller: Poller,
    list_poller: Poller,
}

impl TaskStore {
    /// Store backed by `api`.
    #[must_use]
    pub fn new(api: Arc<dyn TaskApi>, context: StoreContext) -> Self {
        let (state, _) = watch::channel(TaskState::default());
        Self {
            inner: Arc::new(Inner {
                api,
                context,
                state,
                detail_sequence: RequestSequencer::new(),
                list_sequence: RequestSequencer::new(),
                loading: LoadingTracker::new(),
                detail_poller: Poller::new("task_detail"),
                list_poller: Poller::new("task_list"),
            }),
        }
    }

    /// Receiver notified on every state change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<TaskState> {
        self.inner.state.subscribe()
    }

    /// Clone of the current state.
    #[must_use]
    pub fn snapshot(&self) -> TaskState {
        self.inner.state.borrow().clone()
    }

    /// Lifecycle of the detail poll slot.
    #[must_use]
    pub fn poll_state(&self) -> PollState {
        self.inner.detail_poller.state()
    }

    /// Lifecycle of the list poll slot.
    #[must_use]
    pub fn list_poll_state(&self) -> PollState {
        self.inner.list_poller.state()
    }

    /// Dashboard aggregates over the current list.
    #[must_use]
    pub fn overview(&self) -> TaskOverview {
        task_overview(&self.inner.state.borrow().tasks, self.inner.context.clock.now())
    }

    /// Fetch the task list. `silent` skips the loading flag and keeps failures
    /// out of the notifier.
    ///
    /// # Errors
    ///
    /// Returns the classified API failure.
    pub async fn fetch_tasks(&self, silent: bool) -> StoreResult<()> {
        self.inner.fetch_tasks(silent).await
    }

    /// Fetch one task into `current_task`. Failures stay silent while detail
    /// polling is active.
    ///
    /// # Errors
    ///
    /// Returns the classified API failure.
    pub async fn fetch_task_detail(&self, task_id: &str) -> StoreResult<Task> {
        let silent = self.inner.detail_poller.is_active();
        self.inner.fetch_detail(task_id, silent).await
    }

    /// Submit a task and return its identifier.
    ///
    /// # Errors
    ///
    /// Returns the classified API failure after one notice carrying the
    /// backend message or a generic fallback.
    pub async fn create_task(&self, request: &CreateTaskRequest) -> StoreResult<String> {
        match self.inner.api.execute(request).await {
            Ok(response) => {
                info!(
                    store = STORE,
                    task_id = %response.task_id,
                    function_id = %request.function_id,
                    "task created"
                );
                self.inner
                    .context
                    .notify(Notice::success("Task created successfully"));
                Ok(response.task_id)
            }
            Err(source) => {
                let err = StoreError::from(source);
                self.inner
                    .context
                    .report_action_failure(STORE, &err, "Task creation failed");
                Err(err)
            }
        }
    }

    /// Poll `task_id` now and then every `interval` until it reaches a
    /// terminal status or [`Self::stop_polling`] is called. Detail responses
    /// still in flight from an earlier poll are discarded.
    pub fn start_polling(&self, task_id: impl Into<String>, interval: Duration) {
        let task_id = task_id.into();
        info!(
            store = STORE,
            task_id = %task_id,
            interval_ms = interval.as_millis(),
            "task polling started"
        );
        self.inner.detail_poller.stop();
        self.inner.state.send_if_modified(|state| {
            let stale = state
                .current_task
                .as_ref()
                .is_some_and(|task| task.task_id != task_id);
            if stale {
                state.current_task = None;
            }
            self.inner.detail_sequence.fence();
            stale
        });
        let weak = Arc::downgrade(&self.inner);
        self.inner.detail_poller.start(interval, move |origin| {
            detail_tick(weak.clone(), task_id.clone(), origin)
        });
    }

    /// Cancel detail polling. A request already in flight still lands.
    pub fn stop_polling(&self) {
        self.inner.detail_poller.stop();
    }

    /// Keep the task list fresh, replacing any running list poll.
    pub fn start_list_polling(&self, interval: Duration) {
        info!(
            store = STORE,
            interval_ms = interval.as_millis(),
            "task list polling started"
        );
        let weak = Arc::downgrade(&self.inner);
        self.inner
            .list_poller
            .start(interval, move |origin| list_tick(weak.clone(), origin));
    }

    /// Cancel list polling.
    pub fn stop_list_polling(&self) {
        self.inner.list_poller.stop();
    }
}

async fn detail_tick(weak: Weak<Inner>, task_id: String, origin: TickOrigin) -> TickVerdict {
    let Some(inner) = weak.upgrade() else {
        return TickVerdict::Detached;
    };
    let result = inner.fetch_detail(&task_id, origin.is_silent()).await;
    inner.context.record_tick(DETAIL_METRIC, result.is_err());
    match result {
        Ok(task) if task.task_status.is_terminal() => {
            info!(
                store = STORE,
                task_id = %task_id,
                status = task.task_status.as_str(),
                "task reached terminal status; polling stopped"
            );
            TickVerdict::Terminal
        }
        Ok(_) => TickVerdict::Continue,
        Err(_) => TickVerdict::Failed,
    }
}

async fn list_tick(weak: Weak<Inner>, origin: TickOrigin) -> TickVerdict {
    let Some(inner) = weak.upgrade() else {
        return TickVerdict::Detached;
    };
    let result = inner.fetch_tasks(origin.is_silent()).await;
    inner.context.record_tick(LIST_METRIC, result.is_err());
    if result.is_ok() {
        TickVerdict::Continue
    } else {
        TickVerdict::Failed
    }
}

impl Inner {
    async fn fetch_tasks(&self, silent: bool) -> StoreResult<()> {
        let ticket = self.list_sequence.issue();
        let loading = self.begin(silent);
        let response = self.api.list().await;
        drop(loading);

        let tasks = response.map_err(|source| {
            let err = StoreError::from(source);
            self.context.report_fetch_failure(STORE, &err, silent);
            err
        })?;

        let applied = self.state.send_if_modified(|state| {
            if !self.list_sequence.try_apply(ticket) {
                return false;
            }
            state.tasks = tasks;
            true
        });
        if !applied {
            debug!(store = STORE, ticket = ticket.value(), "discarded stale task list");
            self.context.record_stale(LIST_METRIC);
        }
        Ok(())
    }

    async fn fetch_detail(&self, task_id: &str, silent: bool) -> StoreResult<Task> {
        let ticket = self.detail_sequence.issue();
        let loading = self.begin(silent);
        let response = self.api.status(task_id).await;
        drop(loading);

        let task = response.map_err(|source| {
            let err = StoreError::from(source);
            self.context.report_fetch_failure(STORE, &err, silent);
            err
        })?;

        let snapshot = task.clone();
        let applied = self.state.send_if_modified(|state| {
            if !self.detail_sequence.try_apply(ticket) {
                return false;
            }
            state.current_task = Some(snapshot);
            true
        });
        if !applied {
            debug!(
                store = STORE,
                task_id,
                ticket = ticket.value(),
                "discarded stale task detail"
            );
            self.context.record_stale(DETAIL_METRIC);
        }
        Ok(task)
    }

    fn begin(&self, silent: bool) -> Option<LoadingGuard<'_, TaskState>> {
        (!silent).then(|| self.loading.enter(&self.state))
    }
}
