//! Geocoding services the resolver can be pointed at.
//!
//! `services/*.toml` are baked in with [`include_str!`]. Only one service
//! answers a run: the one named on the command line, or else the enabled
//! service with the lowest `priority` ([`default_service`]).
//! [`GeocodingService::connect`] builds its HTTP client.

use std::time::Duration;

use serde::Deserialize;

use crate::{GeocodeError, GeocodeProvider, nominatim::NominatimClient, pelias::PeliasClient};

/// One `services/*.toml` file.
#[derive(Debug, Clone, Deserialize)]
pub struct GeocodingService {
    /// Unique identifier (e.g., `"nominatim"`, `"pelias"`).
    pub id: String,
    pub name: String,
    /// Whether this service may be selected by default.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Selection order; the enabled service with the lowest value is the
    /// default.
    pub priority: u32,
    pub provider: ProviderConfig,
}

/// Connection settings, tagged by `type`.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProviderConfig {
    /// Nominatim / `OpenStreetMap` geocoder.
    Nominatim {
        /// API base URL (e.g., `"https://nominatim.openstreetmap.org/search"`).
        base_url: String,
        /// Minimum delay between requests in milliseconds.
        rate_limit_ms: u64,
        /// `User-Agent` header identifying this application.
        user_agent: String,
        /// Per-request timeout in seconds.
        #[serde(default = "default_timeout_secs")]
        timeout_secs: u64,
    },
    /// Self-hosted Pelias geocoder.
    Pelias {
        /// API base URL (e.g., `"http://localhost:4000"`).
        base_url: String,
        /// ISO country code for boundary filtering.
        country_code: String,
        /// Minimum delay between requests in milliseconds.
        #[serde(default)]
        rate_limit_ms: u64,
        /// Per-request timeout in seconds.
        #[serde(default = "default_timeout_secs")]
        timeout_secs: u64,
    },
}

const fn default_true() -> bool {
    true
}

const fn default_timeout_secs() -> u64 {
    10
}

impl GeocodingService {
    /// Endpoint the service's client sends searches to.
    #[must_use]
    pub fn base_url(&self) -> &str {
        match &self.provider {
            ProviderConfig::Nominatim { base_url, .. } | ProviderConfig::Pelias { base_url, .. } => {
                base_url
            }
        }
    }

    /// Pause to insert before every request to this service.
    #[must_use]
    pub const fn rate_limit(&self) -> Duration {
        match &self.provider {
            ProviderConfig::Nominatim { rate_limit_ms, .. }
            | ProviderConfig::Pelias { rate_limit_ms, .. } => Duration::from_millis(*rate_limit_ms),
        }
    }

    /// Builds the HTTP client for this service.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError::Http`] if the HTTP client cannot be built.
    pub fn connect(&self) -> Result<Box<dyn GeocodeProvider>, GeocodeError> {
        Ok(match &self.provider {
            ProviderConfig::Nominatim {
                base_url,
                user_agent,
                timeout_secs,
                ..
            } => Box::new(NominatimClient::new(
                base_url.clone(),
                user_agent,
                Duration::from_secs(*timeout_secs),
            )?),
            ProviderConfig::Pelias {
                base_url,
                country_code,
                timeout_secs,
                ..
            } => Box::new(PeliasClient::new(
                base_url.clone(),
                country_code.clone(),
                Duration::from_secs(*timeout_secs),
            )?),
        })
    }
}

// ── Compile-time embedded TOML files ────────────────────────────────

const SERVICE_TOMLS: &[(&str, &str)] = &[
    ("nominatim", include_str!("../services/nominatim.toml")),
    ("pelias", include_str!("../services/pelias.toml")),
];

#[cfg(test)]
const EXPECTED_SERVICE_COUNT: usize = 2;

/// Every configured service, disabled ones included.
///
/// # Panics
///
/// Panics if an embedded TOML file does not deserialize.
#[must_use]
pub fn all_services() -> Vec<GeocodingService> {
    SERVICE_TOMLS
        .iter()
        .map(|(name, toml_str)| {
            toml::de::from_str(toml_str)
                .unwrap_or_else(|e| panic!("Invalid geocoding service config '{name}': {e}"))
        })
        .collect()
}

/// Enabled services, lowest `priority` first.
#[must_use]
pub fn enabled_services() -> Vec<GeocodingService> {
    let mut services: Vec<GeocodingService> =
        all_services().into_iter().filter(|s| s.enabled).collect();
    services.sort_by_key(|s| s.priority);
    services
}

/// Looks up a service by id, enabled or not.
#[must_use]
pub fn find_service(id: &str) -> Option<GeocodingService> {
    all_services().into_iter().find(|s| s.id == id)
}

/// Returns the enabled service with the lowest priority.
#[must_use]
pub fn default_service() -> Option<GeocodingService> {
    enabled_services().into_iter().next()
}
