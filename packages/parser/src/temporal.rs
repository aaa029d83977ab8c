//! Date/time grammar for Danish daily-report incident entries.
//!
//! The grammar is an ordered cascade of patterns, most specific first.
//! The first pattern that matches wins, so a range carrying explicit years
//! is always tried before a same-day or year-less form that could match a
//! truncated prefix of it.
//!
//! Supported shapes (after [`normalize_time_section`]):
//!
//! - `mellem d. 24/12/24 kl. 22.00 og d. 25/12/24 kl. 08.00`
//! - `mellem fredag d. 3/1 kl. 16.00 og lørdag d. 4/1 kl. 09.30`
//! - `d. 5/1/24 mellem kl. 22.00 og kl. 23.30`
//! - `mellem kl. 22.00 og kl. 23.30 d. 5/1/24`
//! - `den 5/1 mellem kl. 10.00 og kl. 12.00`
//! - `d. 24/12/24 kl. 10.00`
//! - `tirsdag d. 24/12 kl. 10.00`

use std::sync::LazyLock;

use burglary_map_incident_models::ReportContext;
use chrono::NaiveDate;
use regex::{Captures, Regex};

use crate::normalize::normalize_time_section;

/// A resolved incident date and its time label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemporalMatch {
    /// Calendar date of the incident (the end date for cross-day ranges).
    pub date: NaiveDate,
    /// `"HH.MM"`, `"HH.MM - HH.MM"` or `"DD/MM HH.MM - DD/MM HH.MM"`.
    pub time: String,
    /// Name of the grammar rule that matched.
    pub rule: &'static str,
}

type Extractor = fn(&Captures<'_>, ReportContext) -> Option<(NaiveDate, String)>;

struct TemporalRule {
    name: &'static str,
    pattern: Regex,
    extract: Extractor,
}

const DAY: &str = r"(?P<day>\d{1,2})";
const MONTH: &str = r"(?P<month>\d{1,2})";
const YEAR: &str = r"(?P<year>\d{2,4})";
const START_DAY: &str = r"(?P<start_day>\d{1,2})";
const START_MONTH: &str = r"(?P<start_month>\d{1,2})";
const START_YEAR: &str = r"(?P<start_year>\d{2,4})";
const TIME: &str = r"kl\.\s*(?P<time>\d{1,2}\.\d{2})";
const START_TIME: &str = r"kl\.\s*(?P<start_time>\d{1,2}\.\d{2})";
const END_TIME: &str = r"kl\.\s*(?P<end_time>\d{1,2}\.\d{2})";

/// Grammar rules in priority order.
static RULES: LazyLock<Vec<TemporalRule>> = LazyLock::new(|| {
    let rules: [(&'static str, String, Extractor); 13] = [
        (
            "cross_day_with_years",
            format!(
                r"mellem\s+(?:d\.|den)\s*{START_DAY}/{START_MONTH}/{START_YEAR}\s+{START_TIME}\s+(?:og|til)\s+(?:d\.\s*|den\s+)?{DAY}/{MONTH}/{YEAR}\s+{END_TIME}"
            ),
            cross_day_range,
        ),
        (
            "cross_day_weekday",
            format!(
                r"mellem\s+(?:\w+\s+)?d\.\s*{START_DAY}/{START_MONTH}\s+{START_TIME}\s+og\s+(?:\w+\s+)?d\.\s*{DAY}/{MONTH}\s+{END_TIME}"
            ),
            cross_day_range,
        ),
        (
            "cross_day_den",
            format!(
                r"mellem\s+den\s+{START_DAY}/{START_MONTH}\s+{START_TIME}\s+og\s+den\s+{DAY}/{MONTH}\s+{END_TIME}"
            ),
            cross_day_range,
        ),
        (
            "same_day_with_year",
            format!(
                r"(?:d\.|den)\s*{DAY}/{MONTH}/{YEAR}\s+mellem\s+{START_TIME}\s+og\s+{END_TIME}"
            ),
            same_day_range,
        ),
        (
            "same_day_with_year_mellem_first",
            format!(r"mellem\s+d\.\s*{DAY}/{MONTH}/{YEAR}\s+{START_TIME}\s+og\s+{END_TIME}"),
            same_day_range,
        ),
        (
            "same_day_with_year_date_last",
            format!(r"mellem\s+{START_TIME}\s+og\s+{END_TIME}\s+(?:d\.|den)\s*{DAY}/{MONTH}/{YEAR}"),
            same_day_range,
        ),
        (
            "same_day_weekday",
            format!(r"(?:\w+\s+)?d\.\s*{DAY}/{MONTH}\s+mellem\s+{START_TIME}\s+og\s+{END_TIME}"),
            same_day_range,
        ),
        (
            "same_day_den",
            format!(r"den\s+{DAY}/{MONTH}\s+mellem\s+{START_TIME}\s+og\s+{END_TIME}"),
            same_day_range,
        ),
        (
            "same_day_mellem_first",
            format!(
                r"mellem\s+(?:\w+\s+)?d\.\s*{DAY}/{MONTH}\s+{START_TIME}\s+og\s+{END_TIME}"
            ),
            same_day_range,
        ),
        (
            "same_day_date_last",
            format!(r"mellem\s+{START_TIME}\s+og\s+{END_TIME}\s+(?:d\.|den)\s*{DAY}/{MONTH}"),
            same_day_range,
        ),
        (
            "single_with_year",
            format!(r"(?:d\.|den)\s*{DAY}/{MONTH}/{YEAR}\s+{TIME}"),
            single_time,
        ),
        (
            "single_weekday",
            format!(r"(?:\w+\s+)?d\.\s*{DAY}/{MONTH}\s+{TIME}"),
            single_time,
        ),
        (
            "single_den",
            format!(r"den\s+{DAY}/{MONTH}\s+{TIME}"),
            single_time,
        ),
    ];

    rules
        .into_iter()
        .map(|(name, pattern, extract)| TemporalRule {
            name,
            pattern: Regex::new(&format!("(?i){pattern}")).expect("valid regex"),
            extract,
        })
        .collect()
});

/// Normalizes `text` and parses it into an incident date and time label.
///
/// Returns `None` when no grammar rule matches or the matched date is not
/// a valid calendar date.
#[must_use]
pub fn parse_date_time(text: &str, ctx: ReportContext) -> Option<TemporalMatch> {
    parse_normalized(&normalize_time_section(text), ctx)
}

/// Parses text that has already been through [`normalize_time_section`].
#[must_use]
pub fn parse_normalized(normalized: &str, ctx: ReportContext) -> Option<TemporalMatch> {
    let (rule, caps) = RULES
        .iter()
        .find_map(|rule| rule.pattern.captures(normalized).map(|caps| (rule, caps)))?;

    let (date, time) = (rule.extract)(&caps, ctx)?;

    Some(TemporalMatch {
        date,
        time,
        rule: rule.name,
    })
}

/// Resolves day/month/optional-year strings to a calendar date.
///
/// Two-digit years are read as `20YY`. Without a year, an incident month
/// later than the report month belongs to the year before the report
/// (a January report describing a December break-in).
#[must_use]
pub fn resolve_date(
    day: &str,
    month: &str,
    year: Option<&str>,
    ctx: ReportContext,
) -> Option<NaiveDate> {
    let day: u32 = day.parse().ok()?;
    let month: u32 = month.parse().ok()?;

    let year = match year {
        Some(y) => widen_year(y)?,
        None if month > ctx.month => ctx.year - 1,
        None => ctx.year,
    };

    NaiveDate::from_ymd_opt(year, month, day)
}

fn widen_year(year: &str) -> Option<i32> {
    let value: i32 = year.parse().ok()?;
    match year.len() {
        2 => Some(2000 + value),
        4 if value >= 2000 => Some(value),
        _ => None,
    }
}

fn group<'t>(caps: &Captures<'t>, name: &str) -> Option<&'t str> {
    caps.name(name).map(|m| m.as_str())
}

fn incident_date(caps: &Captures<'_>, ctx: ReportContext) -> Option<NaiveDate> {
    resolve_date(
        group(caps, "day")?,
        group(caps, "month")?,
        group(caps, "year"),
        ctx,
    )
}

fn single_time(caps: &Captures<'_>, ctx: ReportContext) -> Option<(NaiveDate, String)> {
    Some((incident_date(caps, ctx)?, group(caps, "time")?.to_string()))
}

fn same_day_range(caps: &Captures<'_>, ctx: ReportContext) -> Option<(NaiveDate, String)> {
    let label = format!(
        "{} - {}",
        group(caps, "start_time")?,
        group(caps, "end_time")?
    );
    Some((incident_date(caps, ctx)?, label))
}

fn cross_day_range(caps: &Captures<'_>, ctx: ReportContext) -> Option<(NaiveDate, String)> {
    let label = format!(
        "{}/{} {} - {}/{} {}",
        group(caps, "start_day")?,
        group(caps, "start_month")?,
        group(caps, "start_time")?,
        group(caps, "day")?,
        group(caps, "month")?,
        group(caps, "end_time")?,
    );
    Some((incident_date(caps, ctx)?, label))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> ReportContext {
        ReportContext::new(2024, 6)
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn parses_single_time_with_year() {
        let m = parse_date_time("d. 24/12/24 kl. 10:00", ctx()).unwrap();
        assert_eq!(m.date, ymd(2024, 12, 24));
        assert_eq!(m.time, "10.00");
        assert_eq!(m.rule, "single_with_year");
    }

    #[test]
    fn parses_same_day_range_with_trailing_date() {
        let m = parse_date_time("mellem kl. 22:00 og kl. 23:30 d. 5/1/24", ctx()).unwrap();
        assert_eq!(m.date, ymd(2024, 1, 5));
        assert_eq!(m.time, "22.00 - 23.30");
        assert_eq!(m.rule, "same_day_with_year_date_last");
    }

    #[test]
    fn trailing_date_without_year_uses_report_year() {
        let m = parse_date_time("mellem kl. 22.00 og kl. 23.30 d. 5/1", ctx()).unwrap();
        assert_eq!(m.date, ymd(2024, 1, 5));
        assert_eq!(m.rule, "same_day_date_last");
    }

    #[test]
    fn parses_same_day_range_with_leading_date() {
        let m = parse_date_time(
            "d. 5/1/2024 mellem kl. 08.00 og kl. 15.45, hvor der blev stjålet smykker",
            ctx(),
        )
        .unwrap();
        assert_eq!(m.date, ymd(2024, 1, 5));
        assert_eq!(m.time, "08.00 - 15.45");
    }

    #[test]
    fn parses_mellem_first_same_day_range() {
        let m = parse_date_time("mellem d. 5/1/24 kl. 08.00 og kl. 15.45", ctx()).unwrap();
        assert_eq!(m.date, ymd(2024, 1, 5));
        assert_eq!(m.time, "08.00 - 15.45");
        assert_eq!(m.rule, "same_day_with_year_mellem_first");
    }

    #[test]
    fn mellem_first_range_without_year_keeps_end_time() {
        let m = parse_date_time("mellem d. 5/1 kl. 10.00 og kl. 12.00", ctx()).unwrap();
        assert_eq!(m.date, ymd(2024, 1, 5));
        assert_eq!(m.time, "10.00 - 12.00");
        assert_eq!(m.rule, "same_day_mellem_first");

        let m = parse_date_time("mellem fredag d. 5/1 kl. 10.00 og kl. 12.00", ctx()).unwrap();
        assert_eq!(m.time, "10.00 - 12.00");
        assert_eq!(m.rule, "same_day_mellem_first");
    }

    #[test]
    fn parses_cross_day_range_with_years() {
        let m = parse_date_time(
            "mellem d. 23.12.23 kl. 16.00 og d. 2.1.24 kl. 1200",
            ReportContext::new(2024, 1),
        )
        .unwrap();
        assert_eq!(m.date, ymd(2024, 1, 2));
        assert_eq!(m.time, "23/12 16.00 - 2/1 12.00");
        assert_eq!(m.rule, "cross_day_with_years");
    }

    #[test]
    fn parses_cross_day_range_with_weekdays() {
        let m = parse_date_time(
            "mellem fredag d. 3/5 kl. 16.00 og lørdag d. 4/5 kl. 09.30",
            ctx(),
        )
        .unwrap();
        assert_eq!(m.date, ymd(2024, 5, 4));
        assert_eq!(m.time, "3/5 16.00 - 4/5 09.30");
        assert_eq!(m.rule, "cross_day_weekday");
    }

    #[test]
    fn parses_cross_day_range_with_den() {
        let m = parse_date_time(
            "mellem den 3/5 kl. 16.00 og den 4/5 kl. 09.30",
            ctx(),
        )
        .unwrap();
        assert_eq!(m.date, ymd(2024, 5, 4));
        assert_eq!(m.time, "3/5 16.00 - 4/5 09.30");
    }

    #[test]
    fn parses_weekday_single_time() {
        let m = parse_date_time("tirsdag d. 4/6 klokken 14.15", ctx()).unwrap();
        assert_eq!(m.date, ymd(2024, 6, 4));
        assert_eq!(m.time, "14.15");
        assert_eq!(m.rule, "single_weekday");
    }

    #[test]
    fn parses_den_single_time() {
        let m = parse_date_time("den 4/6 kl. 14.15", ctx()).unwrap();
        assert_eq!(m.date, ymd(2024, 6, 4));
        assert_eq!(m.time, "14.15");
    }

    #[test]
    fn year_range_is_not_truncated_by_same_day_rule() {
        let m = parse_date_time(
            "mellem d. 4/6/24 kl. 22.00 og d. 5/6/24 kl. 06.00",
            ctx(),
        )
        .unwrap();
        assert_eq!(m.date, ymd(2024, 6, 5));
        assert_eq!(m.time, "4/6 22.00 - 5/6 06.00");
    }

    #[test]
    fn december_incident_in_january_report_belongs_to_previous_year() {
        let m = parse_date_time("d. 30/12 kl. 10.00", ReportContext::new(2025, 1)).unwrap();
        assert_eq!(m.date, ymd(2024, 12, 30));
    }

    #[test]
    fn january_incident_in_january_report_keeps_report_year() {
        let m = parse_date_time("d. 2/1 kl. 10.00", ReportContext::new(2025, 1)).unwrap();
        assert_eq!(m.date, ymd(2025, 1, 2));
    }

    #[test]
    fn resolve_date_widens_two_digit_years() {
        assert_eq!(
            resolve_date("1", "2", Some("23"), ctx()),
            Some(ymd(2023, 2, 1))
        );
        assert_eq!(
            resolve_date("1", "2", Some("2023"), ctx()),
            Some(ymd(2023, 2, 1))
        );
    }

    #[test]
    fn resolve_date_rejects_pre_2000_and_odd_years() {
        assert_eq!(resolve_date("1", "2", Some("1999"), ctx()), None);
        assert_eq!(resolve_date("1", "2", Some("024"), ctx()), None);
    }

    #[test]
    fn invalid_calendar_dates_are_unparsed() {
        assert!(parse_date_time("d. 31/2/24 kl. 10.00", ctx()).is_none());
    }

    #[test]
    fn unmatched_text_is_unparsed() {
        assert!(parse_date_time("på et ukendt tidspunkt", ctx()).is_none());
        assert!(parse_date_time("", ctx()).is_none());
    }

    #[test]
    fn dates_always_have_four_digit_years_from_2000() {
        let samples = [
            "d. 24/12/24 kl. 10.00",
            "d. 24/12 kl. 10.00",
            "mellem kl. 22.00 og kl. 23.30 d. 5/1/24",
            "mellem d. 23/12/23 kl. 16.00 og d. 2/1/24 kl. 12.00",
            "den 5/1 mellem kl. 10.00 og kl. 12.00",
        ];
        for sample in samples {
            let m = parse_date_time(sample, ReportContext::new(2024, 1)).unwrap();
            let key = m.date.format("%Y-%m-%d").to_string();
            assert_eq!(key.len(), 10, "{sample}");
            assert!(key.as_str() >= "2000-01-01", "{sample}");
        }
    }
}
