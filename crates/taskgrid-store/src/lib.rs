#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![allow(clippy::module_name_repetitions)]

//! Client-side state for the taskgrid console.
//!
//! Each store owns one slice of state behind a `tokio::sync::watch` channel,
//! drives its own poll loops and derives the aggregate fields views display.
//!
//! Layout:
//! - `auth.rs`, `workers.rs`, `tasks.rs`, `files.rs`: the four stores.
//! - `polling.rs`: poll state machine and the cancellable loop driving it.
//! - `sequence.rs`: response ordering guard.
//! - `fleet.rs`, `resources.rs`, `progress.rs`, `format.rs`: pure derivations.
//! - `context.rs`: collaborators injected into every store.
//! - `loading.rs`: loading flag shared by overlapping fetches.

pub mod auth;
pub mod context;
pub mod error;
pub mod files;
pub mod fleet;
pub mod format;
mod loading;
pub mod polling;
pub mod progress;
pub mod resources;
pub mod sequence;
pub mod tasks;
pub mod workers;

pub use auth::{AuthState, AuthStore, Session};
pub use context::StoreContext;
pub use error::{StoreError, StoreResult};
pub use files::{FileState, FileStore};
pub use fleet::{
    BUSY_THRESHOLD_PERCENT, HEARTBEAT_TIMEOUT_MS, Worker, WorkerCounts, WorkerStatus, fleet_average,
    find_worker, is_busy, worker_counts,
};
pub use format::{format_file_size, parse_timestamp};
pub use polling::{PollAction, PollState, Poller, TickOrigin, TickVerdict, advance};
pub use progress::{
    StatusBucket, TaskOverview, completed_subtasks, current_round_average, overall_progress,
    parse_progress, status_label, task_overview, task_progress,
};
pub use resources::{RESOURCE_WINDOW_CAPACITY, ResourceSample, ResourceWindow};
pub use sequence::{RequestSequencer, Ticket};
pub use tasks::{DEFAULT_TASK_POLL_INTERVAL, TaskState, TaskStore};
pub use workers::{WorkerState, WorkerStore};
