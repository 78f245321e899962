//! Date-like substring detection.

use std::sync::LazyLock;

use regex::Regex;

/// Matches, in priority order:
/// - `05/15/2025`, `5-15-25`
/// - `May 15, 2025`, `December 1st 2025`
/// - `2025-05-15`
/// - `tomorrow`, `next friday`, optionally followed by `at 3pm` / `at 2:30 pm`
static DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?i)\b(?:",
        r"[0-9]{1,2}[-/][0-9]{1,2}[-/][0-9]{2,4}",
        r"|(?:jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]* [0-9]{1,2}(?:st|nd|rd|th)?,? [0-9]{2,4}",
        r"|[0-9]{4}-[0-9]{2}-[0-9]{2}",
        r"|(?:tomorrow|next (?:monday|tuesday|wednesday|thursday|friday|saturday|sunday))",
        r"(?:\s+at\s+[0-9]{1,2}(?::[0-9]{2})?\s*(?:am|pm)?)?",
        r")\b",
    ))
    .expect("date regex")
});

/// Find every date-like substring in `text`, in order of appearance.
///
/// Matches are returned verbatim and are not de-duplicated. Nothing here
/// checks that a match is a real calendar date; see [`crate::resolve`].
pub fn extract_dates(text: &str) -> Vec<&str> {
    DATE_RE.find_iter(text).map(|m| m.as_str()).collect()
}
