//! Date detection and "add to calendar" links for chatbot responses.
//!
//! The pipeline is: text → [`extract_dates`] → pick one match →
//! [`resolve`] → [`CalendarEvent`] → [`CalendarLinks`].
//!
//! Everything here is synchronous and pure. The current time is always
//! passed in by the caller, never read from the system clock.

mod event;
mod extract;
mod highlight;
mod links;
mod resolve;
mod title;

pub use event::{CalendarEvent, DEFAULT_EVENT_TITLE, EventEdits};
pub use extract::extract_dates;
pub use highlight::{Segment, highlight};
pub use links::{
    CalendarLinks, Provider, apple_calendar_url, google_calendar_url, outlook_calendar_url,
};
pub use resolve::{DateResolution, classify, parse_literal, resolve, resolve_instant};
pub use title::infer_title;
