//! Messages answered locally without calling the inference endpoint.

use rand::Rng;

/// Greetings that get a canned reply.
pub const GREETINGS: &[&str] = &[
    "hi",
    "hello",
    "hey",
    "greetings",
    "good morning",
    "good afternoon",
    "good evening",
    "howdy",
    "what's up",
    "sup",
    "yo",
    "hiya",
];

/// Questions about what the assistant can do.
pub const COMMON_QUESTIONS: &[&str] = &[
    "how can you help",
    "what can you do",
    "help me",
    "what is this",
    "who are you",
];

const GREETING_RESPONSES: &[&str] = &[
    "Hello! I'm here to help with DePaul University resources. How can I assist you today?",
    "Hi there! I can provide information about DePaul's academic programs, campus resources, and student services. What would you like to know?",
    "Greetings! I'm your DePaul assistant. I can help with questions about admissions, financial aid, academic programs, and campus resources. What can I help you with?",
    "Welcome! I'm here to assist with information about DePaul University. How may I help you today?",
];

const CAPABILITIES_RESPONSE: &str = "I can help you with various DePaul University resources and information, including:

- Academic programs and course information
- Admission requirements and application processes
- Financial aid and scholarship opportunities
- Campus facilities and resources
- Student services and support
- Events and activities
- Housing information
- Career services
- Library resources
- Technology services

Feel free to ask me any questions about these topics, and I'll do my best to assist you!";

/// The message is a greeting, on its own or at either end of the message.
pub fn is_greeting(message: &str) -> bool {
    let lower = message.trim().to_lowercase();
    GREETINGS.iter().any(|greeting| {
        lower == *greeting
            || lower.starts_with(&format!("{greeting} "))
            || lower.ends_with(&format!(" {greeting}"))
    })
}

/// The message asks what the assistant is or can do.
pub fn is_common_question(message: &str) -> bool {
    let lower = message.trim().to_lowercase();
    COMMON_QUESTIONS.iter().any(|q| lower.contains(q))
}

/// One of the canned greeting replies, picked at random.
pub fn greeting_response<R: Rng + ?Sized>(rng: &mut R) -> &'static str {
    GREETING_RESPONSES[rng.random_range(0..GREETING_RESPONSES.len())]
}

pub fn capabilities_response() -> &'static str {
    CAPABILITIES_RESPONSE
}

/// The local reply for `message`, if it does not need the endpoint.
pub fn local_response<R: Rng + ?Sized>(message: &str, rng: &mut R) -> Option<&'static str> {
    if is_greeting(message) {
        Some(greeting_response(rng))
    } else if is_common_question(message) {
        Some(capabilities_response())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn greetings_match_whole_words_at_the_edges() {
        assert!(is_greeting("hi"));
        assert!(is_greeting("  Hello  "));
        assert!(is_greeting("hey there"));
        assert!(is_greeting("well good morning"));
        assert!(is_greeting("What's up"));

        assert!(!is_greeting("history department hours"));
        assert!(!is_greeting("say hi to the registrar for me"));
        assert!(!is_greeting("yoga classes?"));
    }

    #[test]
    fn common_questions_match_anywhere() {
        assert!(is_common_question("So, what can you do?"));
        assert!(is_common_question("please HELP ME find the library"));
        assert!(!is_common_question("When is the tuition deadline?"));
    }

    #[test]
    fn greeting_response_is_one_of_the_canned_replies() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..20 {
            assert!(GREETING_RESPONSES.contains(&greeting_response(&mut rng)));
        }
    }

    #[test]
    fn local_response_prefers_greeting() {
        let mut rng = StdRng::seed_from_u64(1);
        let reply = local_response("hi", &mut rng).unwrap();
        assert!(GREETING_RESPONSES.contains(&reply));

        assert_eq!(
            local_response("who are you", &mut rng),
            Some(capabilities_response())
        );
        assert_eq!(local_response("Where is the Loop campus?", &mut rng), None);
    }

    #[test]
    fn capabilities_lists_topics() {
        assert!(capabilities_response().contains("- Financial aid and scholarship opportunities"));
    }
}
