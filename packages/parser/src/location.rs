//! Splits a location phrase into street address and city.

use std::sync::LazyLock;

use burglary_map_incident_models::UNKNOWN_CITY;
use regex::Regex;

/// `"Hovedgaden 12 i Aarhus"` / `"Skovvej 3 ved Ebeltoft"`
static IN_CITY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.+?)\s+(?:i|ved)\s+(.+)$").expect("valid regex"));

/// `"Hovedgaden 12 8000 Aarhus"`
static POSTAL_CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.+?)\s+(\d{4})\s+(.+)$").expect("valid regex"));

/// Parses a location phrase into `(address, city)`.
///
/// A four-digit postal code is kept as part of the city
/// (`"8000 Aarhus"`). When neither shape matches, the whole phrase is the
/// address and the city is [`UNKNOWN_CITY`].
#[must_use]
pub fn parse_location(location: &str) -> (String, String) {
    let location = location.trim();

    if let Some(caps) = IN_CITY_RE.captures(location) {
        return (caps[1].trim().to_string(), caps[2].trim().to_string());
    }

    if let Some(caps) = POSTAL_CODE_RE.captures(location) {
        return (
            caps[1].trim().to_string(),
            format!("{} {}", &caps[2], caps[3].trim()),
        );
    }

    (location.to_string(), UNKNOWN_CITY.to_string())
}
