//! Coordinates-only export for the static map frontend.
//!
//! Same date → region → city nesting as the record store, but only entries
//! with coordinates survive, reduced to address, time, lat and lon. Cities,
//! regions and dates left empty are dropped.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Serialize;

use crate::{
    StoreError, json_file,
    structured::{RecordStore, serialize_dates_descending},
};

/// One map marker.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrontendEntry {
    pub address: String,
    pub time: String,
    pub lat: f64,
    pub lon: f64,
}

/// Date → region → city → markers.
type ExportDates = BTreeMap<String, BTreeMap<String, BTreeMap<String, Vec<FrontendEntry>>>>;

/// The exported document, newest date first.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FrontendExport {
    #[serde(serialize_with = "serialize_dates_descending")]
    dates: ExportDates,
}

impl FrontendExport {
    /// Builds the export from the record store.
    #[must_use]
    pub fn from_store(store: &RecordStore) -> Self {
        let mut dates = ExportDates::new();

        for (date, region, city, entry) in store.entries() {
            let Some(coords) = entry.coordinates() else {
                continue;
            };
            dates
                .entry(date.to_string())
                .or_default()
                .entry(region.to_string())
                .or_default()
                .entry(city.to_string())
                .or_default()
                .push(FrontendEntry {
                    address: entry.address.clone(),
                    time: entry.time.clone(),
                    lat: coords.latitude,
                    lon: coords.longitude,
                });
        }

        Self { dates }
    }

    /// Number of exported entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.dates
            .values()
            .flat_map(BTreeMap::values)
            .flat_map(BTreeMap::values)
            .map(Vec::len)
            .sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Number of dates with at least one entry.
    #[must_use]
    pub fn date_count(&self) -> usize {
        self.dates.len()
    }
}

/// Builds the export from `store` and writes it to `path`.
///
/// # Errors
///
/// Returns [`StoreError`] if the file cannot be written.
pub fn write_frontend_export(store: &RecordStore, path: &Path) -> Result<FrontendExport, StoreError> {
    let export = FrontendExport::from_store(store);
    json_file::write_atomic(path, &export)?;
    log::info!(
        "Saved {} entries across {} dates to {}",
        export.len(),
        export.date_count(),
        path.display()
    );
    Ok(export)
}
