#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Region-bounded geocoding for addresses read from police reports.
//!
//! Addresses are resolved by the [`resolver::Resolver`], which tries every
//! combination of address variant and city variant (see [`address`])
//! against the persisted cache first and a [`GeocodeProvider`] second.
//! Providers are configured via TOML files in `services/`:
//!
//! 1. **Nominatim / OpenStreetMap** (priority 1), free, 1 req/sec rate
//!    limit.
//! 2. **Pelias** (priority 2), self-hosted, disabled by default.
//!
//! Results inside the configured [`bounds::BoundingBox`] are preferred. A
//! result outside the box is still accepted but marked
//! [`MatchQuality::OutsideRegion`].

pub mod address;
pub mod bounds;
pub mod cache;
pub mod nominatim;
pub mod pelias;
pub mod resolver;
pub mod service_registry;

use async_trait::async_trait;
use burglary_map_incident_models::Coordinates;
use thiserror::Error;

use crate::bounds::BoundingBox;

/// A resolved address with coordinates and metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct GeocodedAddress {
    /// Resolved position (WGS84).
    pub coordinates: Coordinates,
    /// The query string that produced the result.
    pub query: String,
    /// The matched/canonical address returned by the provider, if any.
    pub matched_address: Option<String>,
    /// Where the result came from.
    pub source: ResultSource,
    /// Whether the result lies inside the region bounding box.
    pub match_quality: MatchQuality,
}

impl GeocodedAddress {
    /// Returns `true` for a result accepted from outside the region.
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        self.match_quality == MatchQuality::OutsideRegion
    }
}

/// Which geocoding provider answered a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display, strum_macros::AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum GeocodingProvider {
    /// Self-hosted Pelias geocoder.
    Pelias,
    /// Nominatim / OpenStreetMap.
    Nominatim,
}

/// Where a [`GeocodedAddress`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultSource {
    /// A previously cached coordinate pair.
    Cache,
    /// A fresh provider lookup.
    Provider(GeocodingProvider),
}

/// Quality of the geocoding match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchQuality {
    /// The coordinates fall inside the region bounding box.
    InRegion,
    /// No candidate fell inside the box; the top-ranked one was accepted.
    OutsideRegion,
}

/// One ranked result returned by a provider.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub coordinates: Coordinates,
    pub display_name: Option<String>,
}

/// Errors from geocoding operations.
#[derive(Debug, Error)]
pub enum GeocodeError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response parsing failed.
    #[error("Parse error: {message}")]
    Parse {
        /// Description of the parsing failure.
        message: String,
    },

    /// Rate limit exceeded.
    #[error("Rate limit exceeded")]
    RateLimited,

    /// The provider answered with a non-success status.
    #[error("Provider returned status {status}")]
    Status {
        /// HTTP status code.
        status: u16,
    },
}

/// A free-text geocoding backend.
///
/// Implementations issue exactly one request per call. Rate limiting is the
/// caller's responsibility.
#[async_trait]
pub trait GeocodeProvider: Send + Sync {
    /// Which provider this is.
    fn provider(&self) -> GeocodingProvider;

    /// Searches for `query`, returning up to `limit` ranked candidates.
    ///
    /// `viewbox` is a hint; providers may return candidates outside it.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError`] if the request fails or the response cannot
    /// be parsed.
    async fn search(
        &self,
        query: &str,
        limit: usize,
        viewbox: &BoundingBox,
    ) -> Result<Vec<Candidate>, GeocodeError>;
}
