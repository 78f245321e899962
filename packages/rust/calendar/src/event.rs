//! The normalized event record handed to the link builders.

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use unibot_shared::{Result, UnibotError};

use crate::resolve::parse_literal;

/// Title used when no event keyword is found near the date.
pub const DEFAULT_EVENT_TITLE: &str = "New Event";

/// A calendar event derived from a chatbot response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub title: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// The full text the date was found in.
    pub description: String,
    #[serde(default)]
    pub location: String,
}

impl CalendarEvent {
    /// A one-hour event starting at `start`, with no location.
    pub fn new(title: String, start: DateTime<Utc>, description: String) -> Self {
        Self {
            title,
            start,
            end: start + Duration::hours(1),
            description,
            location: String::new(),
        }
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Apply user edits. Edited times are read with [`parse_literal`], so the
    /// `YYYY-MM-DDTHH:MM` form is taken as wall-clock time in `zone`.
    pub fn apply<Tz: TimeZone>(mut self, edits: EventEdits, zone: &Tz) -> Result<Self> {
        if let Some(title) = edits.title {
            self.title = title;
        }
        if let Some(raw) = edits.start.as_deref() {
            self.start = parse_edit_time("start", raw, zone)?;
        }
        if let Some(raw) = edits.end.as_deref() {
            self.end = parse_edit_time("end", raw, zone)?;
        }
        if let Some(location) = edits.location {
            self.location = location;
        }
        if let Some(description) = edits.description {
            self.description = description;
        }

        if self.end < self.start {
            return Err(UnibotError::validation(format!(
                "event ends ({}) before it starts ({})",
                self.end, self.start
            )));
        }
        Ok(self)
    }
}

fn parse_edit_time<Tz: TimeZone>(field: &str, raw: &str, zone: &Tz) -> Result<DateTime<Utc>> {
    parse_literal(raw, zone)
        .ok_or_else(|| UnibotError::validation(format!("invalid {field} time '{raw}'")))
}

/// Field-by-field overrides for a [`CalendarEvent`]; `None` keeps the current value.
#[derive(Debug, Clone, Default)]
pub struct EventEdits {
    pub title: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
}

impl EventEdits {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.start.is_none()
            && self.end.is_none()
            && self.location.is_none()
            && self.description.is_none()
    }
}
