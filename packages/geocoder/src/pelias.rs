//! Pelias geocoder client for self-hosted instances.
//!
//! Pelias exposes a `/v1/search` endpoint that accepts free-form text
//! queries and returns `GeoJSON` `FeatureCollection` responses. It has no
//! viewbox parameter that is only a hint, so the region is passed as a
//! `focus.point` at the center of the box, which biases ranking without
//! filtering.
//!
//! See <https://github.com/pelias/documentation/blob/master/search.md>

use std::time::Duration;

use async_trait::async_trait;
use burglary_map_incident_models::Coordinates;

use crate::{Candidate, GeocodeError, GeocodeProvider, GeocodingProvider, bounds::BoundingBox};

/// Free-form search against a Pelias instance.
#[derive(Debug, Clone)]
pub struct PeliasClient {
    client: reqwest::Client,
    base_url: String,
    country_code: String,
}

impl PeliasClient {
    /// # Errors
    ///
    /// Returns [`GeocodeError::Http`] if the HTTP client cannot be built.
    pub fn new(
        base_url: impl Into<String>,
        country_code: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, GeocodeError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            country_code: country_code.into(),
        })
    }
}

#[async_trait]
impl GeocodeProvider for PeliasClient {
    fn provider(&self) -> GeocodingProvider {
        GeocodingProvider::Pelias
    }

    async fn search(
        &self,
        query: &str,
        limit: usize,
        viewbox: &BoundingBox,
    ) -> Result<Vec<Candidate>, GeocodeError> {
        let url = format!("{}/v1/search", self.base_url);
        let focus = viewbox.center();
        let size = limit.to_string();
        let focus_lat = focus.latitude.to_string();
        let focus_lon = focus.longitude.to_string();

        let resp = self
            .client
            .get(&url)
            .query(&[
                ("text", query),
                ("boundary.country", self.country_code.as_str()),
                ("size", size.as_str()),
                ("focus.point.lat", focus_lat.as_str()),
                ("focus.point.lon", focus_lon.as_str()),
            ])
            .send()
            .await?;

        if resp.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(GeocodeError::RateLimited);
        }

        if !resp.status().is_success() {
            return Err(GeocodeError::Status {
                status: resp.status().as_u16(),
            });
        }

        let body: serde_json::Value = resp.json().await?;
        parse_response(&body)
    }
}

/// Parses a Pelias `GeoJSON` `FeatureCollection` response.
fn parse_response(body: &serde_json::Value) -> Result<Vec<Candidate>, GeocodeError> {
    let features = body
        .get("features")
        .and_then(serde_json::Value::as_array)
        .ok_or_else(|| GeocodeError::Parse {
            message: "Pelias response missing 'features' array".to_string(),
        })?;

    features.iter().map(parse_feature).collect()
}

fn parse_feature(feature: &serde_json::Value) -> Result<Candidate, GeocodeError> {
    let coords = feature
        .pointer("/geometry/coordinates")
        .and_then(serde_json::Value::as_array)
        .ok_or_else(|| GeocodeError::Parse {
            message: "Feature missing geometry.coordinates".to_string(),
        })?;

    if coords.len() < 2 {
        return Err(GeocodeError::Parse {
            message: "coordinates array has fewer than 2 elements".to_string(),
        });
    }

    // GeoJSON order is [lon, lat]
    let lon = coords[0].as_f64().ok_or_else(|| GeocodeError::Parse {
        message: "longitude is not a number".to_string(),
    })?;
    let lat = coords[1].as_f64().ok_or_else(|| GeocodeError::Parse {
        message: "latitude is not a number".to_string(),
    })?;

    Ok(Candidate {
        coordinates: Coordinates::new(lat, lon),
        display_name: feature
            .pointer("/properties/label")
            .and_then(serde_json::Value::as_str)
            .map(String::from),
    })
}
