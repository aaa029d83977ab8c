//! Rewrites the messy date/time phrasing found in daily reports into a
//! fixed vocabulary before the temporal grammar is applied.
//!
//! After normalization every clock time reads `kl. HH.MM` and every
//! numeric date reads `DD/MM[/YY]`. Rewrites run in a fixed order; each
//! one sees the output of the previous one.

use std::sync::LazyLock;

use regex::Regex;

/// Ordered `(pattern, replacement)` rewrites.
///
/// The dotted-date rewrite must stay after every rule that inspects
/// dot-separated times, otherwise dates and times become indistinguishable.
static RULES: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        // "klokken 10" -> "kl. 10"
        (r"(?i)klokken\s*", "kl. "),
        // "kl. 09:00" -> "kl. 09.00"
        (r"(?i)kl\.\s*(\d{1,2}):(\d{2})", "kl. ${1}.${2}"),
        // "og 22:30" -> "og kl. 22.30"
        (r"(?i)(\sog\s+)(\d{1,2})[:.](\d{2})", "${1}kl. ${2}.${3}"),
        // "kl. 1200" -> "kl. 12.00"
        (r"(?i)kl\.\s*(\d{2})(\d{2})(\D|$)", "kl. ${1}.${2}${3}"),
        // "d. 25.12.25 11:12" -> "d. 25.12.25 kl. 11.12"
        (
            r"(?i)(d\.\s*\d{1,2}\.\d{1,2}\.\d{2,4})\s+(\d{1,2})[:.](\d{2})",
            "${1} kl. ${2}.${3}",
        ),
        // "23.12.25" -> "23/12/25"
        (r"(\d{1,2})\.(\d{1,2})\.(\d{2,4})", "${1}/${2}/${3}"),
        (r"/{2,}", "/"),
        (r"(?i)\s*\bkl\.\s*", " kl. "),
    ]
    .into_iter()
    .map(|(pattern, replacement)| (Regex::new(pattern).expect("valid regex"), replacement))
    .collect()
});

/// Normalizes a date/time phrase. Text that matches no rewrite passes
/// through unchanged (apart from surrounding whitespace).
#[must_use]
pub fn normalize_time_section(text: &str) -> String {
    let mut out = text.to_string();
    for (re, replacement) in RULES.iter() {
        out = re.replace_all(&out, *replacement).into_owned();
    }
    out.trim().to_string()
}
