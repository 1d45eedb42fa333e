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

//! Configuration for the taskgrid console.
//!
//! Layout: `defaults.rs` (baseline values), `model.rs` (typed configuration),
//! `loader.rs` (environment overlay), `validate.rs` (range and scheme checks),
//! `error.rs` (configuration errors).

pub mod defaults;
pub mod error;
pub mod loader;
pub mod model;
pub mod validate;

pub use error::{ConfigError, ConfigResult};
pub use model::ConsoleConfig;
