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

//! Collaborator seams shared by the HTTP client and the state stores.
//!
//! Layout: `clock.rs` (wall-clock source), `notice.rs` (user-facing messages),
//! `session.rs` (durable session persistence contract), `error.rs` (storage errors).

pub mod clock;
pub mod error;
pub mod notice;
pub mod session;

pub use clock::{Clock, SystemClock};
pub use error::{StorageError, StorageResult};
pub use notice::{Notice, NoticeLevel, Notifier, TracingNotifier};
pub use session::{SessionStore, StoredSession};
