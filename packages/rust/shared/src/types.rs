//! Core domain types for unibot conversations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Title given to a chat before its first user message.
pub const DEFAULT_CHAT_TITLE: &str = "New Chat";

/// Maximum length (in characters) of a title derived from the first message.
const MAX_DERIVED_TITLE_CHARS: usize = 40;

// ---------------------------------------------------------------------------
// ChatId
// ---------------------------------------------------------------------------

/// A UUID v7 wrapper for chat identifiers (time-sortable).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatId(pub Uuid);

impl ChatId {
    /// Generate a new time-sortable chat identifier.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for ChatId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ChatId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for ChatId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

// ---------------------------------------------------------------------------
// Sender
// ---------------------------------------------------------------------------

/// Who wrote a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Ai,
}

impl Sender {
    /// Storage representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Ai => "ai",
        }
    }
}

impl std::str::FromStr for Sender {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "ai" => Ok(Self::Ai),
            other => Err(format!("unknown sender '{other}'")),
        }
    }
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

/// A single chat message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Unique message identifier (UUID v7).
    pub id: String,
    /// Message text.
    pub content: String,
    /// Author of the message.
    pub sender: Sender,
    /// When the message was created.
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// Create a message stamped with the current time.
    pub fn new(sender: Sender, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7().to_string(),
            content: content.into(),
            sender,
            timestamp: Utc::now(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Sender::User, content)
    }

    pub fn ai(content: impl Into<String>) -> Self {
        Self::new(Sender::Ai, content)
    }
}

// ---------------------------------------------------------------------------
// Chat
// ---------------------------------------------------------------------------

/// An ordered conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chat {
    pub id: ChatId,
    pub title: String,
    /// When the chat was started.
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub messages: Vec<Message>,
}

impl Chat {
    /// Start an empty chat titled [`DEFAULT_CHAT_TITLE`].
    pub fn new() -> Self {
        Self {
            id: ChatId::new(),
            title: DEFAULT_CHAT_TITLE.to_string(),
            timestamp: Utc::now(),
            messages: Vec::new(),
        }
    }

    /// Append a message. The first user message names an untitled chat.
    ///
    /// Returns `true` when the title changed.
    pub fn push(&mut self, message: Message) -> bool {
        let mut renamed = false;
        if self.title == DEFAULT_CHAT_TITLE && message.sender == Sender::User {
            if let Some(title) = derive_title(&message.content) {
                self.title = title;
                renamed = true;
            }
        }
        self.messages.push(message);
        renamed
    }

    /// The most recent message, if any.
    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }
}

impl Default for Chat {
    fn default() -> Self {
        Self::new()
    }
}

/// First line of the text, truncated to [`MAX_DERIVED_TITLE_CHARS`] characters.
fn derive_title(content: &str) -> Option<String> {
    let line = content.lines().map(str::trim).find(|l| !l.is_empty())?;
    if line.chars().count() <= MAX_DERIVED_TITLE_CHARS {
        return Some(line.to_string());
    }
    let truncated: String = line.chars().take(MAX_DERIVED_TITLE_CHARS).collect();
    Some(format!("{}…", truncated.trim_end()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_id_roundtrip() {
        let id = ChatId::new();
        let s = id.to_string();
        let parsed: ChatId = s.parse().expect("parse ChatId");
        assert_eq!(id, parsed);
    }

    #[test]
    fn sender_serializes_lowercase() {
        let msg = Message::ai("hello");
        let json = serde_json::to_string(&msg).expect("serialize");
        assert!(json.contains(r#""sender":"ai""#));
        assert_eq!("user".parse::<Sender>().unwrap(), Sender::User);
        assert!("bot".parse::<Sender>().is_err());
    }

    #[test]
    fn first_user_message_names_chat() {
        let mut chat = Chat::new();
        assert_eq!(chat.title, DEFAULT_CHAT_TITLE);

        assert!(!chat.push(Message::ai("Welcome!")));
        assert_eq!(chat.title, DEFAULT_CHAT_TITLE);

        assert!(chat.push(Message::user("  When does the spring quarter start?")));
        assert_eq!(chat.title, "When does the spring quarter start?");

        assert!(!chat.push(Message::user("And when does it end?")));
        assert_eq!(chat.title, "When does the spring quarter start?");
        assert_eq!(chat.messages.len(), 3);
    }

    #[test]
    fn long_titles_are_truncated() {
        let mut chat = Chat::new();
        chat.push(Message::user(
            "Can you tell me everything about financial aid deadlines for transfer students?",
        ));
        assert!(chat.title.ends_with('…'));
        assert!(chat.title.chars().count() <= MAX_DERIVED_TITLE_CHARS + 1);
    }

    #[test]
    fn chat_serialization() {
        let mut chat = Chat::new();
        chat.push(Message::user("hi"));
        let json = serde_json::to_string(&chat).expect("serialize");
        let parsed: Chat = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(parsed.id, chat.id);
        assert_eq!(parsed.messages.len(), 1);
    }
}
