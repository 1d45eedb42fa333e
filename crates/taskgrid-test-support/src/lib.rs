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

//! Shared test helpers used across integration suites.
//! Layout: fixtures.rs (DTO builders and fixed instants), mocks.rs (fake clock,
//! session store, notifier and scripted service fakes).

pub mod fixtures;
pub mod mocks;

pub use mocks::{
    FakeClock, Failure, MemorySessionStore, RecordingNotifier, ScriptedAuthApi, ScriptedFileApi,
    ScriptedTaskApi, ScriptedWorkerApi, Step,
};
