//! Core domain library for PACBoard (config, directory storage, models, image intake).

/// Configuration loading and defaults.
pub mod config;
/// Shared constants used across PACBoard crates.
pub mod constants;
/// Process-global environment mutation helpers.
pub mod env;
/// Application error types (storage/domain).
pub mod error;
/// Collected multipart form fields and files.
pub mod form;
/// Image allow-listing, naming, and blob storage.
pub mod images;
/// Upload validation and record assembly.
pub mod intake;
/// Directory records and category metadata.
pub mod models;
/// JSON directory files and per-category collections.
pub mod store;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::Config;
pub use constants::DEFAULT_PORT;
pub use error::AppError;
pub use models::{Album, Category, Entry, Event, Issue, ReadingCircleEntry, Section};
pub use store::{Catalogued, Collection, Library};
