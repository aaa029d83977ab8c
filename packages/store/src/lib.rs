#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! JSON-file persistence for the burglary map.
//!
//! Everything lives in one data directory (see [`paths`]):
//!
//! - `data.json`: the deduplicating [`structured::RecordStore`]
//! - `geocode_cache.json` / `geocode_failures.json`: geocoder state
//! - `report_links.json`: known and processed report URLs
//! - `docs/data.json`: the coordinates-only frontend export
//!
//! All writes go through [`json_file::write_atomic`].

pub mod export;
pub mod geocode_files;
pub mod json_file;
pub mod paths;
pub mod report_links;
pub mod structured;

use thiserror::Error;

/// Errors from reading or writing data files.
#[derive(Debug, Error)]
pub enum StoreError {
    /// File system error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
