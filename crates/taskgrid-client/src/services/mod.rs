//! Typed facades over the backend endpoints.
//!
//! Each module pairs an async trait (the seam stores are generic over) with an
//! HTTP-backed implementation. Services hold no state and never translate
//! errors; classification happens once in [`crate::ApiClient`].

#![allow(clippy::missing_errors_doc)]

pub mod auth;
pub mod files;
pub mod tasks;
pub mod workers;

pub use auth::{AuthApi, ClientService};
pub use files::{FileApi, FileService, FileUpload};
pub use tasks::{TaskApi, TaskService};
pub use workers::{WorkerApi, WorkerService};
