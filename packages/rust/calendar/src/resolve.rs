//! Turning a date-like substring into a concrete instant.
//!
//! Resolution is tried in a fixed order, first success wins:
//! 1. a literal date or timestamp,
//! 2. `tomorrow [at <time>]`,
//! 3. `next <weekday> [at <time>]`.
//!
//! Relative forms are computed against the caller-supplied `now`, in `now`'s
//! time zone. A missing or unusable time of day falls back to 09:00.

use std::sync::LazyLock;

use chrono::{
    DateTime, Datelike, Days, Duration, LocalResult, NaiveDate, NaiveDateTime, NaiveTime,
    TimeZone, Utc, Weekday,
};
use regex::Regex;
use tracing::debug;

use crate::event::CalendarEvent;
use crate::title::infer_title;

/// Time of day used when a relative date carries no usable `at <time>`.
const DEFAULT_HOUR: u32 = 9;

const MONTHS: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

static TOMORROW_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\btomorrow\b").expect("tomorrow regex"));

static NEXT_WEEKDAY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bnext\s+(monday|tuesday|wednesday|thursday|friday|saturday|sunday)\b")
        .expect("next weekday regex")
});

/// `at 3pm`, `at 2:30 pm`, `at 14:00`.
static TIME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bat\s+([0-9]{1,2})(?::([0-9]{2}))?\s*(am|pm)?\b").expect("time regex")
});

static ISO_DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9]{4})-([0-9]{2})-([0-9]{2})$").expect("iso date regex"));

/// `YYYY-MM-DDTHH:MM[:SS]` without a zone, i.e. the datetime-local form.
static LOCAL_DATETIME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}[T ][0-9]{2}:[0-9]{2}(?::[0-9]{2})?$").expect("local datetime regex")
});

static NUMERIC_DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([0-9]{1,2})[-/]([0-9]{1,2})[-/]([0-9]{2,4})$").expect("numeric date regex")
});

static MONTH_NAME_DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^([a-z]+)\.?\s+([0-9]{1,2})(?:st|nd|rd|th)?,?\s+([0-9]{2,4})$")
        .expect("month name date regex")
});

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// How a date-like string is interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateResolution {
    /// A literal date or timestamp.
    Literal(DateTime<Utc>),
    /// `tomorrow`, with the parsed time of day if one was usable.
    Tomorrow(Option<NaiveTime>),
    /// `next <weekday>`, always strictly in the future.
    NextWeekday {
        weekday: Weekday,
        time: Option<NaiveTime>,
    },
    /// Not a date.
    Unresolved,
}

/// Classify `date_like`. Date-only literals without an explicit zone are
/// placed at midnight in `zone`.
pub fn classify<Tz: TimeZone>(date_like: &str, zone: &Tz) -> DateResolution {
    if let Some(instant) = parse_literal(date_like, zone) {
        return DateResolution::Literal(instant);
    }

    if TOMORROW_RE.is_match(date_like) {
        return DateResolution::Tomorrow(parse_time_of_day(date_like));
    }

    if let Some(caps) = NEXT_WEEKDAY_RE.captures(date_like) {
        if let Ok(weekday) = caps[1].to_ascii_lowercase().parse::<Weekday>() {
            return DateResolution::NextWeekday {
                weekday,
                time: parse_time_of_day(date_like),
            };
        }
    }

    DateResolution::Unresolved
}

/// Resolve `date_like` to an instant relative to `now`.
pub fn resolve_instant<Tz: TimeZone>(date_like: &str, now: &DateTime<Tz>) -> Option<DateTime<Utc>> {
    let zone = now.timezone();
    let today = now.date_naive();

    match classify(date_like, &zone) {
        DateResolution::Literal(instant) => Some(instant),
        DateResolution::Tomorrow(time) => {
            let day = today.checked_add_days(Days::new(1))?;
            localize(&zone, day.and_time(time.unwrap_or_else(default_time)))
        }
        DateResolution::NextWeekday { weekday, time } => {
            let day = today.checked_add_days(Days::new(days_until_next(now.weekday(), weekday)))?;
            localize(&zone, day.and_time(time.unwrap_or_else(default_time)))
        }
        DateResolution::Unresolved => None,
    }
}

/// Build a [`CalendarEvent`] for `date_like`, found inside `context`.
///
/// Returns `None` when the string cannot be read as a date; callers should
/// then offer no calendar action.
pub fn resolve<Tz: TimeZone>(
    date_like: &str,
    context: &str,
    now: &DateTime<Tz>,
) -> Option<CalendarEvent> {
    let Some(start) = resolve_instant(date_like, now) else {
        debug!(date_like, "no calendar date for match");
        return None;
    };

    Some(CalendarEvent::new(
        infer_title(date_like, context),
        start,
        context.to_string(),
    ))
}

/// Days from `current` until the following `target`; a same-day target means a week out.
fn days_until_next(current: Weekday, target: Weekday) -> u64 {
    let current = current.num_days_from_sunday();
    let target = target.num_days_from_sunday();
    match (target + 7 - current) % 7 {
        0 => 7,
        n => u64::from(n),
    }
}

fn default_time() -> NaiveTime {
    NaiveTime::from_hms_opt(DEFAULT_HOUR, 0, 0).unwrap_or(NaiveTime::MIN)
}

/// Parse the `at <time>` part of a relative date, converting 12-hour clock times.
fn parse_time_of_day(text: &str) -> Option<NaiveTime> {
    let caps = TIME_RE.captures(text)?;
    let mut hour: u32 = caps[1].parse().ok()?;
    let minute: u32 = match caps.get(2) {
        Some(m) => m.as_str().parse().ok()?,
        None => 0,
    };

    match caps.get(3).map(|p| p.as_str().to_ascii_lowercase()).as_deref() {
        Some("pm") if hour < 12 => hour += 12,
        Some("am") if hour == 12 => hour = 0,
        _ => {}
    }

    NaiveTime::from_hms_opt(hour, minute, 0)
}

// ---------------------------------------------------------------------------
// Literal parsing
// ---------------------------------------------------------------------------

/// Parse a literal date or timestamp.
///
/// Accepted forms:
/// - RFC 3339 timestamps (`2025-05-15T10:00:00Z`)
/// - ISO dates (`2025-05-15`), taken as midnight UTC
/// - local datetimes (`2025-05-15T10:00`), in `zone`
/// - `M/D/Y` and `M-D-Y`, month first, at midnight in `zone`
/// - month-name dates (`May 15, 2025`, `Dec 1st 25`), at midnight in `zone`
///
/// Two-digit years map `00-49` to the 2000s and `50-99` to the 1900s.
/// Dates that do not exist on the calendar are rejected.
pub fn parse_literal<Tz: TimeZone>(text: &str, zone: &Tz) -> Option<DateTime<Utc>> {
    let text = text.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }

    if let Some(caps) = ISO_DATE_RE.captures(text) {
        let date = ymd(&caps[1], &caps[2], &caps[3])?;
        return Some(Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN)));
    }

    if LOCAL_DATETIME_RE.is_match(text) {
        let normalized = text.replacen(' ', "T", 1);
        let naive = NaiveDateTime::parse_from_str(&normalized, "%Y-%m-%dT%H:%M:%S")
            .or_else(|_| NaiveDateTime::parse_from_str(&normalized, "%Y-%m-%dT%H:%M"))
            .ok()?;
        return localize(zone, naive);
    }

    if let Some(caps) = NUMERIC_DATE_RE.captures(text) {
        let year = expand_year(&caps[3])?;
        let date = NaiveDate::from_ymd_opt(year, caps[1].parse().ok()?, caps[2].parse().ok()?)?;
        return localize(zone, date.and_time(NaiveTime::MIN));
    }

    if let Some(caps) = MONTH_NAME_DATE_RE.captures(text) {
        let month = month_from_name(&caps[1])?;
        let year = expand_year(&caps[3])?;
        let date = NaiveDate::from_ymd_opt(year, month, caps[2].parse().ok()?)?;
        return localize(zone, date.and_time(NaiveTime::MIN));
    }

    None
}

fn ymd(year: &str, month: &str, day: &str) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, day.parse().ok()?)
}

fn expand_year(raw: &str) -> Option<i32> {
    let year: i32 = raw.parse().ok()?;
    Some(match (raw.len(), year) {
        (2, 0..=49) => 2000 + year,
        (2, _) => 1900 + year,
        _ => year,
    })
}

/// Month number for a name or abbreviation of at least three letters.
fn month_from_name(name: &str) -> Option<u32> {
    let name = name.to_ascii_lowercase();
    if name.len() < 3 {
        return None;
    }
    MONTHS
        .iter()
        .position(|full| full.starts_with(&name))
        .map(|i| i as u32 + 1)
}

/// Wall-clock time in `zone` to UTC. Ambiguous times take the earlier instant;
/// times skipped by a DST jump move forward past the gap.
fn localize<Tz: TimeZone>(zone: &Tz, naive: NaiveDateTime) -> Option<DateTime<Utc>> {
    let local = match zone.from_local_datetime(&naive) {
        LocalResult::None => zone.from_local_datetime(&(naive + Duration::hours(1))),
        found => found,
    };
    local.earliest().map(|dt| dt.with_timezone(&Utc))
}
