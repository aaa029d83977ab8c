//! The deduplicating record store: date → region → city → entries.
//!
//! Date keys are `YYYY-MM-DD`, so string order is chronological. The store
//! always serializes dates newest first, whatever order they were merged
//! in.

use std::collections::BTreeMap;
use std::path::Path;

use burglary_map_incident_models::{Coordinates, IncidentRecord, StoreEntry};
use serde::{Deserialize, Serialize, Serializer, ser::SerializeMap};

use crate::{StoreError, json_file};

/// City → entries.
pub type CityMap = BTreeMap<String, Vec<StoreEntry>>;

/// Region → cities.
pub type RegionMap = BTreeMap<String, CityMap>;

/// Serializes a date-keyed map with the newest date first.
///
/// # Errors
///
/// Propagates serializer errors.
pub fn serialize_dates_descending<S, V>(
    dates: &BTreeMap<String, V>,
    serializer: S,
) -> Result<S::Ok, S::Error>
where
    S: Serializer,
    V: Serialize,
{
    let mut map = serializer.serialize_map(Some(dates.len()))?;
    for (date, value) in dates.iter().rev() {
        map.serialize_entry(date, value)?;
    }
    map.end()
}

/// All stored incidents.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordStore {
    #[serde(serialize_with = "serialize_dates_descending")]
    dates: BTreeMap<String, RegionMap>,
}

impl RecordStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads the store from `path`, or an empty store if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        json_file::load_or_default(path)
    }

    /// Writes the store to `path`, newest date first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), StoreError> {
        json_file::write_atomic(path, self)
    }

    /// Adds `entry` under `date`/`region`/`city` unless an entry with the
    /// same address is already there. Returns whether it was added.
    pub fn merge(&mut self, date: &str, region: &str, city: &str, entry: StoreEntry) -> bool {
        let entries = self
            .dates
            .entry(date.to_string())
            .or_default()
            .entry(region.to_string())
            .or_default()
            .entry(city.to_string())
            .or_default();

        if entries.iter().any(|e| e.address == entry.address) {
            return false;
        }
        entries.push(entry);
        true
    }

    /// [`merge`](Self::merge) for a parsed incident.
    pub fn merge_record(&mut self, record: &IncidentRecord) -> bool {
        self.merge(
            &record.date_key(),
            &record.region,
            &record.city,
            StoreEntry::from(record),
        )
    }

    /// Returns `true` if an entry with the record's address is already
    /// stored under its date, region and city.
    #[must_use]
    pub fn contains_record(&self, record: &IncidentRecord) -> bool {
        self.dates
            .get(&record.date_key())
            .and_then(|regions| regions.get(&record.region))
            .and_then(|cities| cities.get(&record.city))
            .is_some_and(|entries| entries.iter().any(|e| e.address == record.address))
    }

    /// Date keys, newest first.
    pub fn dates(&self) -> impl Iterator<Item = &str> {
        self.dates.keys().rev().map(String::as_str)
    }

    /// Every entry with its date, region and city, newest date first.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str, &str, &StoreEntry)> {
        self.dates.iter().rev().flat_map(|(date, regions)| {
            regions.iter().flat_map(move |(region, cities)| {
                cities.iter().flat_map(move |(city, entries)| {
                    entries
                        .iter()
                        .map(move |e| (date.as_str(), region.as_str(), city.as_str(), e))
                })
            })
        })
    }

    /// Sets coordinates on every entry lacking them for which
    /// `matches(address, city)` holds. Returns how many were updated.
    pub fn backfill_coordinates(
        &mut self,
        matches: impl Fn(&str, &str) -> bool,
        coords: Coordinates,
        outside_region: bool,
    ) -> usize {
        let mut updated = 0;
        for regions in self.dates.values_mut() {
            for cities in regions.values_mut() {
                for (city, entries) in cities.iter_mut() {
                    for entry in entries
                        .iter_mut()
                        .filter(|e| e.coordinates().is_none() && matches(&e.address, city))
                    {
                        entry.set_coordinates(coords, outside_region);
                        updated += 1;
                    }
                }
            }
        }
        updated
    }

    /// Total number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries().count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries().next().is_none()
    }
}
