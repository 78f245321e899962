//! Post-processing of remote model output.
//!
//! The fine-tuned model tends to open every answer with a stock paragraph
//! about the university. Those intros are stripped before display, but only
//! when the reply starts with them.

use std::sync::LazyLock;

use regex::Regex;

static INTRO_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"^DePaul University is a private Catholic research university located in Chicago, Illinois\. It was founded in 1898\.\s*",
        concat!(
            r"^DePaul University is a private Catholic research university located in Chicago, Illinois\. ",
            r"It was founded by the Vincentians in 1898 and is named after the 17th-century French priest Saint Vincent de Paul\. ",
            r"DePaul is the largest Catholic university in the U\.S\. by enrollment\. ",
            r"The university has two campuses located in Lincoln Park and the Loop\. ",
            r#"DePaul is classified among "R2: Doctoral Universities (?:–|â€“|-) High research activity"\. "#,
            r"The acceptance rate is 70%\.\s*",
        ),
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid intro regex"))
    .collect()
});

/// Remove a leading stock university intro from `text` and trim the result.
pub fn clean_response(text: &str) -> String {
    let mut cleaned = text.to_string();
    for pattern in INTRO_PATTERNS.iter() {
        if pattern.is_match(&cleaned) {
            cleaned = pattern.replace(&cleaned, "").into_owned();
        }
    }
    cleaned.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const LONG_INTRO: &str = "DePaul University is a private Catholic research university located \
        in Chicago, Illinois. It was founded by the Vincentians in 1898 and is named after the \
        17th-century French priest Saint Vincent de Paul. DePaul is the largest Catholic \
        university in the U.S. by enrollment. The university has two campuses located in \
        Lincoln Park and the Loop. DePaul is classified among \"R2: Doctoral Universities – \
        High research activity\". The acceptance rate is 70%. ";

    #[test]
    fn strips_short_intro() {
        let raw = "DePaul University is a private Catholic research university located in \
                   Chicago, Illinois. It was founded in 1898.  Financial aid forms are due March 1.";
        assert_eq!(clean_response(raw), "Financial aid forms are due March 1.");
    }

    #[test]
    fn strips_long_intro() {
        let raw = format!("{LONG_INTRO}Tuition is due Sept 1.");
        assert_eq!(clean_response(&raw), "Tuition is due Sept 1.");
    }

    #[test]
    fn strips_long_intro_with_mangled_dash() {
        let raw = LONG_INTRO.replace('–', "â€“") + "\nThe library opens at 8am.";
        assert_eq!(clean_response(&raw), "The library opens at 8am.");
    }

    #[test]
    fn intro_in_the_middle_is_kept() {
        let raw = "As the catalog says, DePaul University is a private Catholic research \
                   university located in Chicago, Illinois. It was founded in 1898. That is all.";
        assert_eq!(clean_response(raw), raw);
    }

    #[test]
    fn other_text_is_only_trimmed() {
        assert_eq!(
            clean_response("  DePaul has two campuses.\n"),
            "DePaul has two campuses."
        );
        assert_eq!(clean_response(""), "");
    }
}
