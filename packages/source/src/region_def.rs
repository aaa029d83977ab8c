//! Region definitions loaded from embedded TOML configs.
//!
//! Each `.toml` file in `packages/source/regions/` describes one police
//! district: how to query its report listing, which country to append to
//! geocoding queries, the bounding box results must fall in, and the metro
//! area whose suburbs are qualified with the metro name.

use std::time::Duration;

use burglary_map_geocoder::{
    address::MetroArea, bounds::BoundingBox, resolver::ResolverConfig,
};
use chrono::NaiveDate;
use serde::Deserialize;

/// One police district.
#[derive(Debug, Clone, Deserialize)]
pub struct RegionDefinition {
    /// Unique identifier (e.g. `"oestjylland"`).
    pub id: String,
    /// Display name stored on every incident (e.g. `"Østjyllands Politi"`).
    pub name: String,
    /// URL path segment of the district on politi.dk.
    pub slug: String,
    /// `districtQuery` value for the news listing API.
    pub district_query: String,
    /// Country appended to geocoding queries.
    pub country: String,
    /// Earliest date the listing is walked from.
    pub listing_start: NaiveDate,
    pub bounds: BoundingBox,
    #[serde(default)]
    pub metro: Option<MetroArea>,
}

impl RegionDefinition {
    /// Builds resolver settings for this region.
    #[must_use]
    pub fn resolver_config(&self, rate_limit: Duration) -> ResolverConfig {
        let mut config = ResolverConfig::new(self.bounds, self.country.clone());
        config.metro.clone_from(&self.metro);
        config.rate_limit = rate_limit;
        config
    }
}

// ── Compile-time embedded TOML files ────────────────────────────────

const REGION_TOMLS: &[(&str, &str)] = &[(
    "oestjylland",
    include_str!("../regions/oestjylland.toml"),
)];

#[cfg(test)]
const EXPECTED_REGION_COUNT: usize = 1;

/// Returns every configured region.
///
/// # Panics
///
/// Panics if any TOML config is malformed (this is a compile-time guarantee
/// since the configs are embedded).
#[must_use]
pub fn all_regions() -> Vec<RegionDefinition> {
    REGION_TOMLS
        .iter()
        .map(|(name, toml_str)| {
            toml::de::from_str(toml_str)
                .unwrap_or_else(|e| panic!("Failed to parse region '{name}': {e}"))
        })
        .collect()
}

/// Looks up a region by id.
#[must_use]
pub fn find_region(id: &str) -> Option<RegionDefinition> {
    all_regions().into_iter().find(|r| r.id == id)
}

/// Returns the first configured region.
///
/// # Panics
///
/// Panics if no region is configured.
#[must_use]
pub fn default_region() -> RegionDefinition {
    all_regions()
        .into_iter()
        .next()
        .unwrap_or_else(|| panic!("No regions configured"))
}
