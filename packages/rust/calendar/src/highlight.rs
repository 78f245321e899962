//! Splitting a message into plain text and clickable date segments.

/// A piece of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    Text(&'a str),
    /// A detected date; `index` is its position in the extracted date list.
    Date { index: usize, text: &'a str },
}

/// Split `text` around `dates` (as returned by [`crate::extract_dates`]).
///
/// Each date is searched for after the end of the previous one, so repeated
/// dates map to successive occurrences. A date not found after the cursor is
/// skipped and keeps no segment.
pub fn highlight<'a>(text: &'a str, dates: &[&str]) -> Vec<Segment<'a>> {
    let mut segments = Vec::new();
    let mut cursor = 0;

    for (index, date) in dates.iter().enumerate() {
        if date.is_empty() {
            continue;
        }
        let Some(offset) = text[cursor..].find(date) else {
            continue;
        };
        let start = cursor + offset;
        if start > cursor {
            segments.push(Segment::Text(&text[cursor..start]));
        }
        let end = start + date.len();
        segments.push(Segment::Date {
            index,
            text: &text[start..end],
        });
        cursor = end;
    }

    if cursor < text.len() {
        segments.push(Segment::Text(&text[cursor..]));
    }
    segments
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract_dates;

    #[test]
    fn splits_around_dates() {
        let text = "Advising opens tomorrow at 9am and closes May 30, 2025.";
        let dates = extract_dates(text);
        assert_eq!(
            highlight(text, &dates),
            vec![
                Segment::Text("Advising opens "),
                Segment::Date {
                    index: 0,
                    text: "tomorrow at 9am"
                },
                Segment::Text(" and closes "),
                Segment::Date {
                    index: 1,
                    text: "May 30, 2025"
                },
                Segment::Text("."),
            ]
        );
    }

    #[test]
    fn repeated_dates_map_to_successive_occurrences() {
        let text = "1/2/2025 then 1/2/2025";
        let dates = extract_dates(text);
        let segments = highlight(text, &dates);
        assert_eq!(segments.len(), 3);
        assert_eq!(
            segments[2],
            Segment::Date {
                index: 1,
                text: "1/2/2025"
            }
        );
    }

    #[test]
    fn no_dates_is_one_text_segment() {
        assert_eq!(highlight("hello", &[]), vec![Segment::Text("hello")]);
        assert!(highlight("", &[]).is_empty());
    }

    #[test]
    fn missing_dates_are_skipped() {
        let segments = highlight("see you tomorrow", &["May 1, 2025", "tomorrow"]);
        assert_eq!(
            segments,
            vec![
                Segment::Text("see you "),
                Segment::Date {
                    index: 1,
                    text: "tomorrow"
                },
            ]
        );
    }
}
