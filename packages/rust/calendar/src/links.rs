//! "Add to calendar" deep links for Google Calendar, Outlook, and Apple Calendar.
//!
//! All builders are pure string formatting. Text fields are percent-encoded
//! for the two web links. The Apple link is an inline iCalendar payload whose
//! SUMMARY/DESCRIPTION/LOCATION values are inserted as-is, without RFC 5545
//! escaping or line folding.

use std::borrow::Cow;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use crate::event::CalendarEvent;

const GOOGLE_BASE: &str = "https://calendar.google.com/calendar/render?action=TEMPLATE";
const OUTLOOK_BASE: &str = "https://outlook.office.com/calendar/0/deeplink/compose";

/// Supported calendar providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Google,
    Outlook,
    Apple,
}

impl Provider {
    pub const ALL: [Provider; 3] = [Provider::Google, Provider::Outlook, Provider::Apple];

    /// Button label shown next to the link.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Google => "Add to Google Calendar",
            Self::Outlook => "Add to Outlook Calendar",
            Self::Apple => "Add to Apple Calendar",
        }
    }

    pub fn url_for(&self, event: &CalendarEvent) -> String {
        match self {
            Self::Google => google_calendar_url(event),
            Self::Outlook => outlook_calendar_url(event),
            Self::Apple => apple_calendar_url(event),
        }
    }
}

/// The three provider links for one event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CalendarLinks {
    pub google: String,
    pub outlook: String,
    pub apple: String,
}

impl CalendarLinks {
    pub fn for_event(event: &CalendarEvent) -> Self {
        Self {
            google: google_calendar_url(event),
            outlook: outlook_calendar_url(event),
            apple: apple_calendar_url(event),
        }
    }

    pub fn get(&self, provider: Provider) -> &str {
        match provider {
            Provider::Google => &self.google,
            Provider::Outlook => &self.outlook,
            Provider::Apple => &self.apple,
        }
    }
}

/// Google Calendar template link. Dates use the compact `YYYYMMDDTHHMMSSZ` form.
pub fn google_calendar_url(event: &CalendarEvent) -> String {
    format!(
        "{GOOGLE_BASE}&text={}&dates={}/{}&details={}&location={}",
        encode_component(&event.title),
        compact_timestamp(&event.start),
        compact_timestamp(&event.end),
        encode_component(&event.description),
        encode_component(&event.location),
    )
}

/// Outlook compose link. Dates are full millisecond ISO timestamps, percent-encoded.
pub fn outlook_calendar_url(event: &CalendarEvent) -> String {
    format!(
        "{OUTLOOK_BASE}?subject={}&startdt={}&enddt={}&body={}&location={}",
        encode_component(&event.title),
        encode_component(&iso_timestamp(&event.start)),
        encode_component(&iso_timestamp(&event.end)),
        encode_component(&event.description),
        encode_component(&event.location),
    )
}

/// Inline `text/calendar` data URI for Apple Calendar.
pub fn apple_calendar_url(event: &CalendarEvent) -> String {
    format!(
        "data:text/calendar;charset=utf8,BEGIN:VCALENDAR\n\
         VERSION:2.0\n\
         BEGIN:VEVENT\n\
         DTSTART:{}\n\
         DTEND:{}\n\
         SUMMARY:{}\n\
         DESCRIPTION:{}\n\
         LOCATION:{}\n\
         END:VEVENT\n\
         END:VCALENDAR",
        compact_timestamp(&event.start),
        compact_timestamp(&event.end),
        event.title,
        event.description,
        event.location,
    )
}

/// `2025-05-15T10:00:00.000Z`
fn iso_timestamp(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// `20250515T100000Z`: the ISO timestamp without separators or fractional seconds.
fn compact_timestamp(dt: &DateTime<Utc>) -> String {
    dt.format("%Y%m%dT%H%M%SZ").to_string()
}

/// Percent-encode like a browser's `encodeURIComponent`, which also leaves
/// `! ' ( ) *` unescaped.
fn encode_component(s: &str) -> String {
    let encoded: Cow<'_, str> = urlencoding::encode(s);
    if !encoded.contains('%') {
        return encoded.into_owned();
    }
    encoded
        .replace("%21", "!")
        .replace("%27", "'")
        .replace("%28", "(")
        .replace("%29", ")")
        .replace("%2A", "*")
}
