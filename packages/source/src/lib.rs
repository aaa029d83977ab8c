#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Police daily-report sources.
//!
//! A [`ReportSource`] lists report URLs page by page and renders a single
//! report to plain text. [`politi::PolitiClient`] implements it against
//! politi.dk; regions it can be pointed at are defined in `regions/*.toml`
//! (see [`region_def`]).

pub mod html_text;
pub mod politi;
pub mod progress;
pub mod region_def;
pub mod retry;

use async_trait::async_trait;
use chrono::NaiveDate;

/// Errors that can occur during data source operations.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error (file read/write).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Unexpected response shape or status.
    #[error("Normalization error: {message}")]
    Normalization {
        /// Description of what went wrong.
        message: String,
    },

    /// Every attempt of a retried operation failed.
    #[error("Gave up after {attempts} attempts: {last_error}")]
    Exhausted {
        /// Number of attempts made.
        attempts: u32,
        /// Error from the final attempt.
        last_error: String,
    },
}

/// One page of a report listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListingQuery {
    /// Earliest publication date.
    pub from: NaiveDate,
    /// Latest publication date, or now.
    pub to: Option<NaiveDate>,
    /// 1-based page number.
    pub page: u32,
}

/// A source of daily reports.
#[async_trait]
pub trait ReportSource: Send + Sync {
    /// Returns a unique identifier for this source.
    fn id(&self) -> &str;

    /// Number of links on a full listing page. A shorter page is the last.
    fn page_size(&self) -> usize;

    /// Returns one listing page of absolute report URLs, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the listing cannot be fetched or parsed.
    async fn list_reports(&self, query: &ListingQuery) -> Result<Vec<String>, SourceError>;

    /// Returns the rendered plain-text body of the report at `url`.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the report cannot be fetched.
    async fn fetch_report_text(&self, url: &str) -> Result<String, SourceError>;
}
