//! "Add to calendar" offers for dates found in assistant replies.

use chrono::{DateTime, TimeZone};
use serde::Serialize;
use tracing::debug;
use unibot_calendar::{CalendarEvent, CalendarLinks, extract_dates, resolve};
use unibot_shared::{Message, Sender};

/// One detected date in a reply.
#[derive(Debug, Clone, Serialize)]
pub struct CalendarOffer {
    /// Position in the reply's date list, as shown next to the highlight.
    pub index: usize,
    pub date: String,
    /// `None` when the date could not be resolved; no action is offered.
    pub event: Option<CalendarEvent>,
}

impl CalendarOffer {
    pub fn links(&self) -> Option<CalendarLinks> {
        self.event.as_ref().map(CalendarLinks::for_event)
    }
}

/// Offers for every date in an assistant `message`. User messages get none.
///
/// `default_location` is filled into each resolved event.
pub fn calendar_offers<Tz: TimeZone>(
    message: &Message,
    now: &DateTime<Tz>,
    default_location: &str,
) -> Vec<CalendarOffer> {
    if message.sender != Sender::Ai {
        return Vec::new();
    }
    offers_for_text(&message.content, now, default_location)
}

/// Offers for every date in `text`, each resolved against the whole text.
pub fn offers_for_text<Tz: TimeZone>(
    text: &str,
    now: &DateTime<Tz>,
    default_location: &str,
) -> Vec<CalendarOffer> {
    let offers: Vec<_> = extract_dates(text)
        .into_iter()
        .enumerate()
        .map(|(index, date)| {
            let event = resolve(date, text, now).map(|mut event| {
                event.location = default_location.to_string();
                event
            });
            CalendarOffer {
                index,
                date: date.to_string(),
                event,
            }
        })
        .collect();

    debug!(
        dates = offers.len(),
        resolved = offers.iter().filter(|o| o.event.is_some()).count(),
        "calendar offers built"
    );
    offers
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, Utc};

    fn now() -> DateTime<FixedOffset> {
        // Monday 2025-05-12 08:00 in Chicago (CDT).
        FixedOffset::west_opt(5 * 3600)
            .unwrap()
            .with_ymd_and_hms(2025, 5, 12, 8, 0, 0)
            .unwrap()
    }

    #[test]
    fn user_messages_get_no_offers() {
        let msg = Message::user("Is there a meeting on 5/15/2025?");
        assert!(calendar_offers(&msg, &now(), "").is_empty());
    }

    #[test]
    fn reply_dates_become_events() {
        let msg = Message::ai("The advising meeting is tomorrow at 3pm, finals start June 9, 2025.");
        let offers = calendar_offers(&msg, &now(), "Lincoln Park");
        assert_eq!(offers.len(), 2);

        let first = offers[0].event.as_ref().unwrap();
        assert_eq!(offers[0].date, "tomorrow at 3pm");
        assert_eq!(first.start, Utc.with_ymd_and_hms(2025, 5, 13, 20, 0, 0).unwrap());
        assert_eq!(first.location, "Lincoln Park");
        assert_eq!(first.description, msg.content);

        assert_eq!(offers[1].index, 1);
        let links = offers[1].links().unwrap();
        assert!(links.google.contains("location=Lincoln%20Park"));
    }

    #[test]
    fn no_dates_no_offers() {
        let msg = Message::ai("The library is on the second floor.");
        assert!(calendar_offers(&msg, &now(), "").is_empty());
    }

    #[test]
    fn unresolvable_dates_offer_no_event() {
        let offers = offers_for_text("Deadline: 02/30/2025.", &now(), "");
        assert_eq!(offers.len(), 1);
        assert!(offers[0].event.is_none());
        assert!(offers[0].links().is_none());
    }
}
