//! Character-by-character reveal of assistant replies.

use std::time::Duration;

use tokio::time::sleep;

/// Default pause between characters.
pub const DEFAULT_DELAY: Duration = Duration::from_millis(10);

/// Feed `text` to `sink` one character at a time, pausing `delay` between
/// characters. A zero delay emits everything without yielding.
pub async fn reveal<F>(text: &str, delay: Duration, mut sink: F)
where
    F: FnMut(char),
{
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        sink(c);
        if !delay.is_zero() && chars.peek().is_some() {
            sleep(delay).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[tokio::test]
    async fn emits_every_character_in_order() {
        let mut out = String::new();
        reveal("Café ☕ opens 9/1/2025", Duration::from_millis(1), |c| {
            out.push(c)
        })
        .await;
        assert_eq!(out, "Café ☕ opens 9/1/2025");
    }

    #[tokio::test]
    async fn zero_delay_is_immediate() {
        let text = "x".repeat(10_000);
        let mut count = 0;
        let started = Instant::now();
        reveal(&text, Duration::ZERO, |_| count += 1).await;
        assert_eq!(count, 10_000);
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn delay_is_applied_between_characters() {
        let started = Instant::now();
        reveal("abcd", Duration::from_millis(20), |_| {}).await;
        assert!(started.elapsed() >= Duration::from_millis(60));
    }

    #[tokio::test]
    async fn empty_text_emits_nothing() {
        let mut called = false;
        reveal("", DEFAULT_DELAY, |_| called = true).await;
        assert!(!called);
    }
}
