//! Address cleaning and query variants for Danish report addresses.
//!
//! Report addresses come out of the parser in a few broken shapes:
//! - Postal code glued onto the street: `"Espedalen 66 8240"`
//! - Zero-padded house numbers from page rendering: `"Espedalen 066"`
//! - A stray leading `"Sket"` token: `"Sket Hovedgaden 3"`
//!
//! [`sanitize_address`] repairs these. [`address_variants`] and
//! [`city_variants`] then expand a single `(address, city)` pair into the
//! ordered list of queries the resolver attempts.

use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

/// Leading "Sket" (possibly repeated) left over from "Sket på ...".
static SKET_PREFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(?:sket\s+)+").expect("valid regex"));

static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Zero-padded number token, e.g. `" 066"`.
static LEADING_ZEROS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+0+(\d+)").expect("valid regex"));

/// One or more trailing four-digit tokens, e.g. `" 8240"`.
static TRAILING_POSTAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:\s+\d{4})+$").expect("valid regex"));

/// Trailing compass suffix on a city, e.g. `"Aarhus C"`, `"Randers SØ"`.
static DIRECTION_SUFFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\s+[NCSVØ]+$").expect("valid regex"));

/// Leading postal code on a city, e.g. `"8000 Aarhus"`.
static POSTAL_PREFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}\s+").expect("valid regex"));

/// Street-name abbreviations expanded into extra address variants.
static ABBREVIATIONS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        (r"\bSkt\.\s*", "Sankt "),
        (r"\bSt\.\s*", "Sankt "),
        (r"\bDr\.\s*", "Doktor "),
    ]
    .into_iter()
    .map(|(pattern, replacement)| (Regex::new(pattern).expect("valid regex"), replacement))
    .collect()
});

/// A metro area whose suburbs are often unknown to the geocoder by their
/// own name.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MetroArea {
    /// Metro area name, e.g. `"Aarhus"`.
    pub name: String,
    /// Lowercase suburb names.
    pub suburbs: Vec<String>,
}

impl MetroArea {
    /// Returns `true` if `city` (without postal code or compass suffix)
    /// names one of the suburbs.
    #[must_use]
    pub fn is_suburb(&self, city: &str) -> bool {
        let city = city.trim().to_lowercase();
        self.suburbs.iter().any(|suburb| {
            let suburb = suburb.to_lowercase();
            city == suburb
                || city
                    .strip_prefix(suburb.as_str())
                    .is_some_and(|rest| rest.starts_with(' '))
        })
    }
}

/// Cleans an address for geocoding.
///
/// Collapses whitespace, drops a leading `"Sket"`, strips trailing
/// four-digit postal codes and then collapses zero-padded number tokens.
/// Applying it twice gives the same result as applying it once.
#[must_use]
pub fn sanitize_address(address: &str) -> String {
    let collapsed = WHITESPACE_RE.replace_all(address.trim(), " ");
    let without_sket = SKET_PREFIX_RE.replace(&collapsed, "");
    let without_postal = TRAILING_POSTAL_RE.replace(&without_sket, "");
    let unpadded = LEADING_ZEROS_RE.replace_all(&without_postal, " ${1}");
    unpadded.trim().to_string()
}

/// Returns the address followed by its abbreviation-expanded forms,
/// without duplicates.
#[must_use]
pub fn address_variants(address: &str) -> Vec<String> {
    let mut variants = vec![address.to_string()];
    for (re, replacement) in ABBREVIATIONS.iter() {
        if re.is_match(address) {
            variants.push(re.replace_all(address, *replacement).trim().to_string());
        }
    }
    dedup_in_order(variants)
}

/// Returns the ordered city variants to try, most specific first.
///
/// 1. the city as given
/// 2. without a trailing compass suffix
/// 3. without a leading postal code
/// 4. `"{suburb}, {metro}"` and `"{metro}"` for known suburbs
/// 5. `""`, meaning address and country only
#[must_use]
pub fn city_variants(city: &str, metro: Option<&MetroArea>) -> Vec<String> {
    let city = city.trim();
    let mut variants = vec![city.to_string()];

    let without_suffix = DIRECTION_SUFFIX_RE.replace(city, "").trim().to_string();
    variants.push(without_suffix.clone());

    let without_postal = POSTAL_PREFIX_RE.replace(city, "").trim().to_string();
    variants.push(without_postal);

    if let Some(metro) = metro {
        let bare = POSTAL_PREFIX_RE.replace(&without_suffix, "").trim().to_string();
        if metro.is_suburb(&bare) {
            variants.push(format!("{bare}, {}", metro.name));
            variants.push(metro.name.clone());
        }
    }

    variants.retain(|v| !v.is_empty());
    variants.push(String::new());
    dedup_in_order(variants)
}

/// Builds the free-text provider query for one address/city variant.
#[must_use]
pub fn build_query(address: &str, city_variant: &str, country: &str) -> String {
    if city_variant.is_empty() {
        format!("{address}, {country}")
    } else {
        format!("{address}, {city_variant}, {country}")
    }
}

/// Key under which failures for an address/city pair are logged.
#[must_use]
pub fn failure_key(address: &str, city: &str) -> String {
    format!("{address}, {city}")
}

fn dedup_in_order(values: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::BTreeSet::new();
    values
        .into_iter()
        .filter(|v| seen.insert(v.clone()))
        .collect()
}
