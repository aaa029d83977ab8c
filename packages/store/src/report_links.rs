//! Ledger of known report URLs and which of them have been processed.
//!
//! Links are stored newest first, the order the listing API returns them.

use std::collections::BTreeSet;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{StoreError, json_file};

/// Contents of `report_links.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportLinks {
    /// Listing district the links were fetched for.
    #[serde(default)]
    pub district: String,
    /// Report URLs, newest first.
    #[serde(default)]
    pub links: Vec<String>,
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
    /// URLs whose reports have been extracted into the store.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub processed: BTreeSet<String>,
}

impl ReportLinks {
    #[must_use]
    pub fn new(district: impl Into<String>) -> Self {
        Self {
            district: district.into(),
            ..Self::default()
        }
    }

    /// Loads the ledger, or an empty one if the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        json_file::load_or_default(path)
    }

    /// Stamps `last_updated` and writes the ledger.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the file cannot be written.
    pub fn save(&mut self, path: &Path) -> Result<(), StoreError> {
        self.last_updated = Some(Utc::now());
        json_file::write_atomic(path, self)?;
        log::info!("Saved {} links to {}", self.links.len(), path.display());
        Ok(())
    }

    #[must_use]
    pub fn contains(&self, url: &str) -> bool {
        self.links.iter().any(|link| link == url)
    }

    /// Puts unknown `new_links` in front of the existing ones, keeping
    /// their order. Returns how many were added.
    pub fn prepend(&mut self, new_links: Vec<String>) -> usize {
        let mut seen: BTreeSet<String> = self.links.iter().cloned().collect();
        let fresh: Vec<String> = new_links
            .into_iter()
            .filter(|link| seen.insert(link.clone()))
            .collect();
        let added = fresh.len();
        self.links.splice(0..0, fresh);
        added
    }

    /// Appends unknown `links` after the existing ones. Returns how many
    /// were added.
    pub fn append(&mut self, links: impl IntoIterator<Item = String>) -> usize {
        let mut seen: BTreeSet<String> = self.links.iter().cloned().collect();
        let before = self.links.len();
        self.links
            .extend(links.into_iter().filter(|link| seen.insert(link.clone())));
        self.links.len() - before
    }

    pub fn mark_processed(&mut self, url: impl Into<String>) {
        self.processed.insert(url.into());
    }

    #[must_use]
    pub fn is_processed(&self, url: &str) -> bool {
        self.processed.contains(url)
    }

    /// The newest `limit` links to process, returned oldest first. Already
    /// processed links are included only when `include_processed` is set.
    #[must_use]
    pub fn pending(&self, include_processed: bool, limit: Option<usize>) -> Vec<String> {
        let mut pending: Vec<String> = self
            .links
            .iter()
            .filter(|link| include_processed || !self.is_processed(link))
            .take(limit.unwrap_or(usize::MAX))
            .cloned()
            .collect();
        pending.reverse();
        pending
    }
}
