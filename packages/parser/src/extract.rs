//! Break-in entry extraction from the plain-text body of a daily report.
//!
//! A report body contains a section introduced by a heading line such as
//! `Indbrud` or `Indbrud i privat beboelse`, running until the next short
//! capitalized heading line (`Tyveri`, `Færdsel`, ...) or the end of the
//! text. Inside it, each entry starts on its own line with `På`, optionally
//! behind a bullet glyph:
//!
//! ```text
//! Indbrud i privat beboelse
//! • På Hovedgaden 12 i Aarhus begået d. 24/12/24 kl. 10:00.
//! • På Skovvej 3 8240 Risskov begået mellem kl. 22 og kl. 23 d. 5/1.
//! Tyveri
//! ```
//!
//! The text between `På` and `begået` is the location, the text after it
//! the date/time phrase. A malformed entry is dropped and reported in
//! [`ReportExtraction::rejected`]; it never prevents the remaining entries
//! from being extracted.

use std::sync::LazyLock;

use burglary_map_incident_models::{IncidentRecord, ReportContext, ReportStatus};
use chrono::NaiveDate;
use regex::Regex;
use strum_macros::{AsRefStr, Display};

use crate::location::parse_location;
use crate::temporal::parse_date_time;

/// Word that opens every entry.
pub const ENTRY_MARKER: &str = "På";

/// Maximum number of characters of a rejected block kept for logging.
const PREVIEW_LEN: usize = 80;

static SECTION_HEADING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*Indbrud(?:[ \t]+i[ \t]+[^\n]+|[ \t]*[:.])?[ \t]*$")
        .expect("valid regex")
});

/// Next section heading: one capitalized word, optionally followed by one
/// lowercase word, alone on its line.
static NEXT_HEADING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*[A-ZÆØÅ][a-zæøå]+(?:[ \t]+[a-zæøå]+)?[ \t]*$").expect("valid regex")
});

/// Start of an entry line. Group 1 is the marker itself.
static ENTRY_START_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)^[ \t]*(?:[*•"\-][ \t]*)?(På\s)"#).expect("valid regex")
});

static COMMITTED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\s+begået\s+").expect("valid regex"));

static NO_BREAK_INS_RES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)ingen\s+(?:anmeldte\s+)?indbrud",
        r"(?i)ikke\s+(?:blevet\s+)?anmeldt\s+(?:nogen\s+)?indbrud",
        r"(?i)\b0\s+indbrud",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid regex"))
    .collect()
});

/// Why an entry block was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum RejectReason {
    /// The section has content but no line starts with the entry marker.
    NoMarker,
    /// The block has no `begået` keyword separating location and time.
    NoCommittedKeyword,
    /// The date/time phrase matched no grammar rule.
    UnparsedTime,
}

/// A dropped block and the reason it was dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedBlock {
    /// Whitespace-collapsed text of the block.
    pub text: String,
    pub reason: RejectReason,
}

impl RejectedBlock {
    /// Returns at most the first 80 characters of the block text.
    #[must_use]
    pub fn preview(&self) -> String {
        self.text.chars().take(PREVIEW_LEN).collect()
    }
}

/// Address, city, date and time parsed from one entry block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedEntry {
    pub address: String,
    pub city: String,
    pub date: NaiveDate,
    pub time: String,
}

/// Everything extracted from one report body.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportExtraction {
    pub status: ReportStatus,
    pub records: Vec<IncidentRecord>,
    pub rejected: Vec<RejectedBlock>,
}

/// Locates the break-in section of a report body.
///
/// Returns the text between the heading line and the next section heading
/// (or the end of the body).
#[must_use]
pub fn find_break_in_section(body: &str) -> Option<&str> {
    let heading = SECTION_HEADING_RE.find(body)?;
    let rest = &body[heading.end()..];
    let end = NEXT_HEADING_RE.find(rest).map_or(rest.len(), |m| m.start());
    Some(&rest[..end])
}

/// Splits a section into blocks, each starting at the entry marker.
///
/// Text before the first marker is not part of any block.
#[must_use]
pub fn split_blocks(section: &str) -> Vec<&str> {
    // (line start, marker start) per entry; a block runs from its marker
    // to the start of the next entry's line so bullets stay out of it.
    let starts: Vec<(usize, usize)> = ENTRY_START_RE
        .captures_iter(section)
        .filter_map(|caps| Some((caps.get(0)?.start(), caps.get(1)?.start())))
        .collect();

    starts
        .iter()
        .enumerate()
        .map(|(i, &(_, marker))| {
            let end = starts.get(i + 1).map_or(section.len(), |&(line, _)| line);
            section[marker..end].trim()
        })
        .filter(|block| !block.is_empty())
        .collect()
}

/// Parses a single entry block.
///
/// # Errors
///
/// Returns the [`RejectReason`] when the block does not start with the
/// entry marker, lacks the `begået` keyword, or has an unparseable
/// date/time phrase.
pub fn parse_block(block: &str, ctx: ReportContext) -> Result<ParsedEntry, RejectReason> {
    let text = collapse_whitespace(block);
    let rest = text
        .strip_prefix(ENTRY_MARKER)
        .ok_or(RejectReason::NoMarker)?;

    let keyword = COMMITTED_RE
        .find(rest)
        .ok_or(RejectReason::NoCommittedKeyword)?;
    let location = rest[..keyword.start()].trim();
    let time_section = rest[keyword.end()..].trim();

    let (address, city) = parse_location(location);
    let parsed = parse_date_time(time_section, ctx).ok_or(RejectReason::UnparsedTime)?;

    Ok(ParsedEntry {
        address,
        city,
        date: parsed.date,
        time: parsed.time,
    })
}

/// Returns `true` if the text states that no break-ins were reported.
#[must_use]
pub fn reports_no_break_ins(text: &str) -> bool {
    NO_BREAK_INS_RES.iter().any(|re| re.is_match(text))
}

/// Extracts every incident from a report body.
///
/// `region` and `source_url` are copied onto each record. Rejected blocks
/// are logged and returned alongside the records.
#[must_use]
pub fn extract_report(
    body: &str,
    source_url: &str,
    region: &str,
    ctx: ReportContext,
) -> ReportExtraction {
    let body = body.replace("\r\n", "\n");

    let Some(section) = find_break_in_section(&body) else {
        let status = if reports_no_break_ins(&body) {
            ReportStatus::NoBreakIns
        } else {
            log::debug!("No break-in section in {source_url}");
            ReportStatus::NoSection
        };
        return ReportExtraction {
            status,
            records: vec![],
            rejected: vec![],
        };
    };

    let mut records = Vec::new();
    let mut rejected = Vec::new();

    let blocks = split_blocks(section);

    if blocks.is_empty() && !section.trim().is_empty() && !reports_no_break_ins(section) {
        rejected.push(RejectedBlock {
            text: collapse_whitespace(section),
            reason: RejectReason::NoMarker,
        });
    }

    for block in blocks {
        match parse_block(block, ctx) {
            Ok(entry) => records.push(IncidentRecord {
                address: entry.address,
                city: entry.city,
                date: entry.date,
                time: entry.time,
                region: region.to_string(),
                source_url: source_url.to_string(),
                coordinates: None,
                outside_region: false,
            }),
            Err(reason) => rejected.push(RejectedBlock {
                text: collapse_whitespace(block),
                reason,
            }),
        }
    }

    for block in &rejected {
        log::warn!(
            "Dropped entry ({}) in {source_url}: {}",
            block.reason,
            block.preview()
        );
    }

    let status = if !records.is_empty() {
        ReportStatus::Found
    } else if reports_no_break_ins(section) {
        ReportStatus::NoBreakIns
    } else {
        ReportStatus::NoEntries
    };

    ReportExtraction {
        status,
        records,
        rejected,
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
