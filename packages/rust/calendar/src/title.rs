//! Event title inference from the text around a date.

use std::sync::LazyLock;

use regex::Regex;

use crate::event::DEFAULT_EVENT_TITLE;

/// An event keyword, optionally followed by `with|about|on|for <phrase>`.
/// The phrase runs up to the next comma or period.
///
/// Keywords must be whole words: "recall" or "eventually" yield no title.
static TITLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?i)\b(?:meeting|call|appointment|event|session|conference|interview|presentation|webinar|workshop)\b",
        r"(?:\s+(?:with|about|on|for)\s+[^,.]+)?",
    ))
    .expect("title regex")
});

/// Pick a title for the event at `date_like` inside `context`.
///
/// The text before the first occurrence of the date is searched first, then
/// the text after it. When the date does not occur in `context`, the whole
/// context is searched.
pub fn infer_title(date_like: &str, context: &str) -> String {
    let (before, after) = match context.find(date_like) {
        Some(i) if !date_like.is_empty() => (&context[..i], &context[i + date_like.len()..]),
        _ => (context, ""),
    };

    TITLE_RE
        .find(before)
        .or_else(|| TITLE_RE.find(after))
        .map(|m| capitalize(m.as_str().trim()))
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| DEFAULT_EVENT_TITLE.to_string())
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_with_phrase_before_date() {
        let title = infer_title(
            "05/15/2025",
            "Let's have a meeting about budgets on 05/15/2025",
        );
        assert!(title.starts_with("Meeting about budgets"));
    }

    #[test]
    fn phrase_stops_at_punctuation() {
        let title = infer_title(
            "tomorrow at 3pm",
            "There is a workshop for resume writing, tomorrow at 3pm.",
        );
        assert_eq!(title, "Workshop for resume writing");
    }

    #[test]
    fn falls_back_to_text_after_date() {
        let title = infer_title(
            "May 20, 2025",
            "On May 20, 2025 we host an Info Session with the dean. Bring questions.",
        );
        assert_eq!(title, "Session with the dean");
    }

    #[test]
    fn bare_keyword() {
        assert_eq!(
            infer_title("next friday", "The career fair interview is next friday."),
            "Interview"
        );
    }

    #[test]
    fn default_when_nothing_matches() {
        assert_eq!(
            infer_title("2025-06-01", "Housing opens 2025-06-01."),
            DEFAULT_EVENT_TITLE
        );
    }

    #[test]
    fn keywords_inside_words_do_not_count() {
        assert_eq!(
            infer_title("tomorrow", "Please recall the eventual deadline tomorrow"),
            DEFAULT_EVENT_TITLE
        );
    }

    #[test]
    fn missing_date_searches_whole_context() {
        assert_eq!(
            infer_title("June 1, 2025", "Conference with alumni, early summer"),
            "Conference with alumni"
        );
    }
}
