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

//! HTTP access to the taskgrid platform API.
//!
//! Layout: `http.rs` (authenticated client and status classification),
//! `error.rs` (failure taxonomy and operator messages), `services/` (typed
//! endpoint facades), `storage/` (durable session stores).

pub mod error;
pub mod http;
pub mod services;
pub mod storage;

pub use error::{ApiError, ApiResult, ErrorKind};
pub use reqwest::StatusCode;
pub use http::{ApiClient, HEADER_REQUEST_ID, SessionEvent};
pub use services::{
    AuthApi, ClientService, FileApi, FileService, FileUpload, TaskApi, TaskService, WorkerApi,
    WorkerService,
};
pub use storage::{CookieSessionStore, CookieSettings, DualSessionStore, LocalSessionStore};
