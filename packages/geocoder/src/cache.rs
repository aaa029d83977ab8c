//! Geocode cache and failure log.
//!
//! Both are flat maps keyed by strings and persisted as JSON by the store
//! crate. They are held together in a [`GeocodeState`] that the resolver
//! mutates in place; callers decide when to flush.

use std::collections::{BTreeMap, BTreeSet};

use burglary_map_incident_models::Coordinates;
use serde::{Deserialize, Serialize};

/// Query string → coordinates, or `None` for a query the provider answered
/// with zero candidates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GeocodeCache {
    entries: BTreeMap<String, Option<Coordinates>>,
}

impl GeocodeCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached coordinates for `query`, if it is a known hit.
    #[must_use]
    pub fn hit(&self, query: &str) -> Option<Coordinates> {
        self.entries.get(query).copied().flatten()
    }

    /// Returns `true` if `query` is cached as having no result.
    #[must_use]
    pub fn is_known_miss(&self, query: &str) -> bool {
        matches!(self.entries.get(query), Some(None))
    }

    pub fn insert(&mut self, query: impl Into<String>, coords: Coordinates) {
        self.entries.insert(query.into(), Some(coords));
    }

    /// Records that `query` returned no candidates. Never replaces a hit.
    pub fn insert_miss(&mut self, query: impl Into<String>) {
        self.entries.entry(query.into()).or_insert(None);
    }

    /// Merges `other` underneath `self`: keys only present in `other` are
    /// added, and a hit in `other` upgrades a miss in `self`.
    pub fn absorb(&mut self, other: Self) {
        for (query, coords) in other.entries {
            let keep_local = match self.entries.get(&query) {
                Some(Some(_)) => true,
                Some(None) => coords.is_none(),
                None => false,
            };
            if !keep_local {
                self.entries.insert(query, coords);
            }
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Why an address could not be geocoded.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum_macros::Display,
)]
pub enum FailureReason {
    /// The parser could not determine a city; no lookup was attempted.
    #[serde(rename = "unknown city")]
    #[strum(serialize = "unknown city")]
    UnknownCity,
    /// Every query variant was tried without an accepted result.
    #[serde(rename = "not found")]
    #[strum(serialize = "not found")]
    NotFound,
}

/// A failure entry, kept for later manual review or a retry run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeocodeFailure {
    pub reason: FailureReason,
    pub address: String,
    pub city: String,
    /// Every query string attempted, in order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tried: Vec<String>,
}

impl GeocodeFailure {
    #[must_use]
    pub fn unknown_city(address: impl Into<String>, city: impl Into<String>) -> Self {
        Self {
            reason: FailureReason::UnknownCity,
            address: address.into(),
            city: city.into(),
            tried: Vec::new(),
        }
    }

    #[must_use]
    pub fn not_found(
        address: impl Into<String>,
        city: impl Into<String>,
        tried: Vec<String>,
    ) -> Self {
        Self {
            reason: FailureReason::NotFound,
            address: address.into(),
            city: city.into(),
            tried,
        }
    }
}

/// `"{address}, {city}"` → [`GeocodeFailure`].
///
/// Removals are remembered so that merging with the on-disk copy before a
/// write does not bring resolved failures back.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GeocodeFailureLog {
    entries: BTreeMap<String, GeocodeFailure>,
    #[serde(skip)]
    resolved: BTreeSet<String>,
}

impl GeocodeFailureLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, key: impl Into<String>, failure: GeocodeFailure) {
        let key = key.into();
        self.resolved.remove(&key);
        self.entries.insert(key, failure);
    }

    /// Removes `key`, returning the failure if it was present.
    pub fn resolve(&mut self, key: &str) -> Option<GeocodeFailure> {
        self.resolved.insert(key.to_string());
        self.entries.remove(key)
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&GeocodeFailure> {
        self.entries.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &GeocodeFailure)> {
        self.entries.iter()
    }

    /// Merges an on-disk copy underneath `self`: entries resolved in this
    /// process stay removed, entries recorded in this process win.
    pub fn absorb(&mut self, other: Self) {
        for (key, failure) in other.entries {
            if !self.resolved.contains(&key) {
                self.entries.entry(key).or_insert(failure);
            }
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The mutable geocoding state threaded through the resolver.
#[derive(Debug, Clone, Default)]
pub struct GeocodeState {
    pub cache: GeocodeCache,
    pub failures: GeocodeFailureLog,
}

impl GeocodeState {
    #[must_use]
    pub const fn new(cache: GeocodeCache, failures: GeocodeFailureLog) -> Self {
        Self { cache, failures }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn miss_never_replaces_hit() {
        let mut cache = GeocodeCache::new();
        cache.insert("a", Coordinates::new(56.0, 10.0));
        cache.insert_miss("a");
        assert_eq!(cache.hit("a"), Some(Coordinates::new(56.0, 10.0)));
        assert!(!cache.is_known_miss("a"));
    }

    #[test]
    fn cache_absorb_keeps_local_and_upgrades_misses() {
        let mut local = GeocodeCache::new();
        local.insert("a", Coordinates::new(56.0, 10.0));
        local.insert_miss("b");

        let mut disk = GeocodeCache::new();
        disk.insert("a", Coordinates::new(1.0, 1.0));
        disk.insert("b", Coordinates::new(56.1, 10.1));
        disk.insert_miss("c");

        local.absorb(disk);
        assert_eq!(local.hit("a"), Some(Coordinates::new(56.0, 10.0)));
        assert_eq!(local.hit("b"), Some(Coordinates::new(56.1, 10.1)));
        assert!(local.is_known_miss("c"));
        assert_eq!(local.len(), 3);
    }

    #[test]
    fn cache_serializes_as_flat_map() {
        let mut cache = GeocodeCache::new();
        cache.insert("Hovedgaden 1, Aarhus, Denmark", Coordinates::new(56.1, 10.2));
        cache.insert_miss("Nowhere 1, Denmark");
        let json = serde_json::to_value(&cache).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "Hovedgaden 1, Aarhus, Denmark": [56.1, 10.2],
                "Nowhere 1, Denmark": null,
            })
        );
        let back: GeocodeCache = serde_json::from_value(json).unwrap();
        assert_eq!(back, cache);
    }

    #[test]
    fn failure_serializes_reason_text() {
        let failure = GeocodeFailure::not_found(
            "Hovedgaden 1",
            "Aarhus",
            vec!["Hovedgaden 1, Aarhus, Denmark".to_string()],
        );
        let json = serde_json::to_value(&failure).unwrap();
        assert_eq!(json["reason"], "not found");
        assert_eq!(json["tried"][0], "Hovedgaden 1, Aarhus, Denmark");

        let unknown = serde_json::to_value(GeocodeFailure::unknown_city("X 1", "Unknown")).unwrap();
        assert_eq!(unknown["reason"], "unknown city");
        assert!(unknown.get("tried").is_none());
    }

    #[test]
    fn failure_absorb_does_not_resurrect_resolved() {
        let mut local = GeocodeFailureLog::new();
        local.record("a, X", GeocodeFailure::unknown_city("a", "X"));
        local.resolve("a, X");

        let mut disk = GeocodeFailureLog::new();
        disk.record("a, X", GeocodeFailure::unknown_city("a", "X"));
        disk.record("b, Y", GeocodeFailure::unknown_city("b", "Y"));

        local.absorb(disk);
        assert!(local.get("a, X").is_none());
        assert!(local.get("b, Y").is_some());
        assert_eq!(local.len(), 1);
    }

    #[test]
    fn rerecording_clears_resolved_mark() {
        let mut log = GeocodeFailureLog::new();
        log.resolve("a, X");
        log.record("a, X", GeocodeFailure::unknown_city("a", "X"));
        let mut disk = GeocodeFailureLog::new();
        disk.record("a, X", GeocodeFailure::not_found("a", "X", vec![]));
        log.absorb(disk);
        assert_eq!(
            log.get("a, X").map(|f| f.reason),
            Some(FailureReason::UnknownCity)
        );
    }
}
