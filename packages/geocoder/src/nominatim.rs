//! Nominatim / OpenStreetMap geocoder client.
//!
//! The public instance has strict usage rules: **1 request per second**
//! maximum and an identifying `User-Agent`. Both come from the service
//! TOML configuration.
//!
//! See <https://nominatim.org/release-docs/develop/api/Search/>

use std::time::Duration;

use async_trait::async_trait;
use burglary_map_incident_models::Coordinates;

use crate::{Candidate, GeocodeError, GeocodeProvider, GeocodingProvider, bounds::BoundingBox};

/// Free-form search against a Nominatim `/search` endpoint.
#[derive(Debug, Clone)]
pub struct NominatimClient {
    client: reqwest::Client,
    base_url: String,
}

impl NominatimClient {
    /// Builds a client sending `user_agent` with a per-request `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError::Http`] if the HTTP client cannot be built.
    pub fn new(
        base_url: impl Into<String>,
        user_agent: &str,
        timeout: Duration,
    ) -> Result<Self, GeocodeError> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }
}

#[async_trait]
impl GeocodeProvider for NominatimClient {
    fn provider(&self) -> GeocodingProvider {
        GeocodingProvider::Nominatim
    }

    async fn search(
        &self,
        query: &str,
        limit: usize,
        viewbox: &BoundingBox,
    ) -> Result<Vec<Candidate>, GeocodeError> {
        let limit = limit.to_string();
        let viewbox = viewbox.viewbox_param();
        let resp = self
            .client
            .get(&self.base_url)
            .query(&[
                ("q", query),
                ("format", "jsonv2"),
                ("limit", limit.as_str()),
                ("viewbox", viewbox.as_str()),
                ("bounded", "0"),
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

/// Parses a Nominatim JSON response into ranked candidates.
fn parse_response(body: &serde_json::Value) -> Result<Vec<Candidate>, GeocodeError> {
    let results = body.as_array().ok_or_else(|| GeocodeError::Parse {
        message: "Nominatim response is not an array".to_string(),
    })?;

    results
        .iter()
        .map(|result| {
            let lat = result["lat"]
                .as_str()
                .and_then(|s| s.parse::<f64>().ok())
                .ok_or_else(|| GeocodeError::Parse {
                    message: "Missing lat in Nominatim response".to_string(),
                })?;

            let lon = result["lon"]
                .as_str()
                .and_then(|s| s.parse::<f64>().ok())
                .ok_or_else(|| GeocodeError::Parse {
                    message: "Missing lon in Nominatim response".to_string(),
                })?;

            Ok(Candidate {
                coordinates: Coordinates::new(lat, lon),
                display_name: result["display_name"].as_str().map(String::from),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_nominatim_results_in_rank_order() {
        let body = serde_json::json!([
            {
                "lat": "56.1496",
                "lon": "10.2045",
                "display_name": "Hovedgaden, Aarhus, Danmark"
            },
            {
                "lat": "55.6761",
                "lon": "12.5683",
                "display_name": "Hovedgaden, København, Danmark"
            }
        ]);
        let candidates = parse_response(&body).unwrap();
        assert_eq!(candidates.len(), 2);
        assert!((candidates[0].coordinates.latitude - 56.1496).abs() < 1e-4);
        assert!((candidates[0].coordinates.longitude - 10.2045).abs() < 1e-4);
        assert_eq!(
            candidates[1].display_name.as_deref(),
            Some("Hovedgaden, København, Danmark")
        );
    }

    #[test]
    fn parses_nominatim_empty() {
        let body = serde_json::json!([]);
        assert!(parse_response(&body).unwrap().is_empty());
    }

    #[test]
    fn rejects_non_array() {
        let body = serde_json::json!({"error": "bad"});
        assert!(matches!(
            parse_response(&body),
            Err(GeocodeError::Parse { .. })
        ));
    }

    #[test]
    fn rejects_missing_coordinates() {
        let body = serde_json::json!([{ "display_name": "x" }]);
        assert!(parse_response(&body).is_err());
    }
}
