//! Report publication date inference from report URLs.
//!
//! Daily report URLs end in `/YYYY/MM/DD` (optionally with a trailing
//! slash), e.g.
//! `https://politi.dk/oestjyllands-politi/doegnrapporter/doegnrapport-for-oestjylland/2025/01/03`.

use std::sync::LazyLock;

use burglary_map_incident_models::ReportContext;
use chrono::NaiveDate;
use regex::Regex;

static DATE_PATH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"/(\d{4})/(\d{2})/(\d{2})/?(?:[?#].*)?$").expect("valid regex")
});

/// Returns `true` if the URL carries a `/YYYY/MM/DD` date suffix.
#[must_use]
pub fn has_date_path(url: &str) -> bool {
    DATE_PATH_RE.is_match(url)
}

/// Extracts the publication date from a report URL.
#[must_use]
pub fn report_date_from_url(url: &str) -> Option<NaiveDate> {
    let caps = DATE_PATH_RE.captures(url)?;
    NaiveDate::from_ymd_opt(caps[1].parse().ok()?, caps[2].parse().ok()?, caps[3].parse().ok()?)
}

/// Builds the [`ReportContext`] for a report URL, falling back to `today`
/// when the URL carries no date.
#[must_use]
pub fn report_context_for_url(url: &str, today: NaiveDate) -> ReportContext {
    report_date_from_url(url).map_or_else(
        || {
            log::warn!("No /YYYY/MM/DD date in report URL {url}, using {today}");
            ReportContext::from_date(today)
        },
        ReportContext::from_date,
    )
}
