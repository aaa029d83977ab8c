#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Shared types for burglary incidents extracted from police daily reports.
//!
//! An [`IncidentRecord`] is produced by the parser for every well-formed
//! break-in entry, optionally enriched with [`Coordinates`] by the
//! geocoder, and finally written to the structured store as a
//! [`StoreEntry`].

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// City value used when no city-bearing pattern matches a location phrase.
pub const UNKNOWN_CITY: &str = "Unknown";

/// Returns `true` if `city` is the unknown-city sentinel (case-insensitive).
#[must_use]
pub fn is_unknown_city(city: &str) -> bool {
    city.trim().eq_ignore_ascii_case(UNKNOWN_CITY)
}

/// Publication year and month of the report an incident was read from.
///
/// Only used to infer the year of incident dates that omit one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportContext {
    /// Four-digit publication year.
    pub year: i32,
    /// Publication month, 1-12.
    pub month: u32,
}

impl ReportContext {
    /// Creates a context for a report published in `year`/`month`.
    #[must_use]
    pub const fn new(year: i32, month: u32) -> Self {
        Self { year, month }
    }

    /// Creates a context from a full publication date.
    #[must_use]
    pub fn from_date(date: NaiveDate) -> Self {
        Self::new(date.year(), date.month())
    }
}

/// A WGS84 latitude/longitude pair.
///
/// Serialized as a two-element `[lat, lon]` array, the format used by the
/// persisted geocode cache.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "(f64, f64)", into = "(f64, f64)")]
pub struct Coordinates {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
}

impl Coordinates {
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

impl From<(f64, f64)> for Coordinates {
    fn from((latitude, longitude): (f64, f64)) -> Self {
        Self::new(latitude, longitude)
    }
}

impl From<Coordinates> for (f64, f64) {
    fn from(c: Coordinates) -> Self {
        (c.latitude, c.longitude)
    }
}

/// One break-in extracted from a daily report.
#[derive(Debug, Clone, PartialEq)]
pub struct IncidentRecord {
    /// Street and house number (e.g. `"Hovedgaden 12"`).
    pub address: String,
    /// City name, optionally prefixed by a postal code, or [`UNKNOWN_CITY`].
    pub city: String,
    /// Resolved calendar date of the incident.
    pub date: NaiveDate,
    /// Time label: `"HH.MM"`, `"HH.MM - HH.MM"` or a cross-day range
    /// `"DD/MM HH.MM - DD/MM HH.MM"`.
    pub time: String,
    /// Police district display name.
    pub region: String,
    /// URL of the report the incident was read from.
    pub source_url: String,
    /// Geocoded position, if resolution succeeded.
    pub coordinates: Option<Coordinates>,
    /// Set when `coordinates` came from a provider result outside the
    /// region bounding box.
    pub outside_region: bool,
}

impl IncidentRecord {
    /// Returns the store key for this incident's date (`YYYY-MM-DD`).
    #[must_use]
    pub fn date_key(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }
}

/// A stored incident under a date → region → city path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreEntry {
    pub address: String,
    pub time: String,
    pub source_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lon: Option<f64>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub outside_region: bool,
}

impl StoreEntry {
    /// Returns the entry's coordinates when both components are present.
    #[must_use]
    pub fn coordinates(&self) -> Option<Coordinates> {
        Some(Coordinates::new(self.lat?, self.lon?))
    }

    /// Attaches coordinates to this entry.
    pub const fn set_coordinates(&mut self, coords: Coordinates, outside_region: bool) {
        self.lat = Some(coords.latitude);
        self.lon = Some(coords.longitude);
        self.outside_region = outside_region;
    }
}

impl From<&IncidentRecord> for StoreEntry {
    fn from(record: &IncidentRecord) -> Self {
        Self {
            address: record.address.clone(),
            time: record.time.clone(),
            source_url: record.source_url.clone(),
            lat: record.coordinates.map(|c| c.latitude),
            lon: record.coordinates.map(|c| c.longitude),
            outside_region: record.outside_region,
        }
    }
}

/// Outcome of locating break-ins in a single report body.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ReportStatus {
    /// At least one incident was extracted.
    Found,
    /// The report states that no break-ins were reported.
    NoBreakIns,
    /// No break-in section heading was found.
    NoSection,
    /// A section was found but no entry could be extracted from it.
    NoEntries,
}
