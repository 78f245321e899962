//! One chat session: user input in, assistant message out.
//!
//! A turn never fails from the caller's point of view. Greetings and
//! capability questions are answered locally; everything else goes to the
//! [`Responder`], and any error there becomes a fixed apology message.

use std::future::Future;

use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;
use tracing::{debug, error, instrument};
use unibot_inference::InferenceClient;
use unibot_shared::{Chat, Message, Result};
use unibot_storage::Storage;

use crate::cleaning::clean_response;
use crate::greetings::local_response;

/// Shown when the endpoint fails or is unreachable.
pub const APOLOGY: &str = "I'm sorry, I couldn't process your request. Please try again later.";

/// Shown when the endpoint answers without any response text.
pub const EMPTY_RESPONSE: &str = "I'm sorry, I couldn't generate a response.";

/// Anything that can answer a user message.
///
/// `Ok(None)` means the backend answered but had nothing to say.
pub trait Responder: Send + Sync {
    fn respond(&self, input: &str) -> impl Future<Output = Result<Option<String>>> + Send;
}

impl Responder for InferenceClient {
    fn respond(&self, input: &str) -> impl Future<Output = Result<Option<String>>> + Send {
        self.ask(input)
    }
}

/// Where a reply came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplySource {
    /// Canned greeting or capabilities text.
    Local,
    /// The inference endpoint.
    Remote,
    /// The endpoint failed and the apology was used.
    Fallback,
}

/// The assistant side of a turn.
#[derive(Debug, Clone)]
pub struct Reply {
    pub message: Message,
    pub source: ReplySource,
}

/// Both messages of one exchange.
#[derive(Debug, Clone)]
pub struct Turn {
    pub user: Message,
    pub reply: Reply,
    /// The user message gave the chat its title.
    pub renamed: bool,
}

/// Produce the reply text for `input` without touching any chat.
pub async fn answer<R: Responder, G: rand::Rng + ?Sized>(
    responder: &R,
    input: &str,
    rng: &mut G,
) -> (String, ReplySource) {
    if let Some(canned) = local_response(input, rng) {
        debug!("answered locally");
        return (canned.to_string(), ReplySource::Local);
    }

    match responder.respond(input).await {
        Ok(Some(text)) => (clean_response(&text), ReplySource::Remote),
        Ok(None) => (EMPTY_RESPONSE.to_string(), ReplySource::Remote),
        Err(e) => {
            error!(error = %e, "inference request failed");
            (APOLOGY.to_string(), ReplySource::Fallback)
        }
    }
}

/// A chat bound to a responder.
pub struct Conversation<R> {
    chat: Chat,
    responder: R,
    rng: StdRng,
}

impl<R: Responder> Conversation<R> {
    /// Start a new untitled chat.
    pub fn new(responder: R) -> Self {
        Self::resume(Chat::new(), responder)
    }

    /// Continue an existing chat.
    pub fn resume(chat: Chat, responder: R) -> Self {
        Self {
            chat,
            responder,
            rng: StdRng::from_os_rng(),
        }
    }

    /// Use a fixed RNG for greeting selection.
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    pub fn chat(&self) -> &Chat {
        &self.chat
    }

    pub fn into_chat(self) -> Chat {
        self.chat
    }

    /// Run one exchange. Blank input is ignored and returns `None`.
    #[instrument(skip_all, fields(chat = %self.chat.id))]
    pub async fn send(&mut self, input: &str) -> Option<Turn> {
        let input = input.trim();
        if input.is_empty() {
            return None;
        }

        let user = Message::user(input);
        let renamed = self.chat.push(user.clone());

        let (text, source) = answer(&self.responder, input, &mut self.rng).await;
        let message = Message::ai(text);
        self.chat.push(message.clone());

        debug!(?source, messages = self.chat.messages.len(), "turn complete");
        Some(Turn {
            user,
            reply: Reply { message, source },
            renamed,
        })
    }
}

/// Persist a turn produced by [`Conversation::send`] for `chat`.
///
/// The chat row must already exist.
pub async fn record_turn(storage: &Storage, chat: &Chat, turn: &Turn) -> Result<()> {
    storage.append_message(&chat.id, &turn.user).await?;
    storage.append_message(&chat.id, &turn.reply.message).await?;
    if turn.renamed {
        storage.rename_chat(&chat.id, &chat.title).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use unibot_shared::{DEFAULT_CHAT_TITLE, Sender, UnibotError};

    /// Scripted responder that records every input it sees.
    struct Scripted {
        reply: Result<Option<String>>,
        seen: Mutex<Vec<String>>,
    }

    impl Scripted {
        fn new(reply: Result<Option<String>>) -> Self {
            Self {
                reply,
                seen: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> usize {
            self.seen.lock().unwrap().len()
        }
    }

    impl Responder for &Scripted {
        fn respond(&self, input: &str) -> impl Future<Output = Result<Option<String>>> + Send {
            self.seen.lock().unwrap().push(input.to_string());
            let reply = match &self.reply {
                Ok(r) => Ok(r.clone()),
                Err(e) => Err(UnibotError::Network(e.to_string())),
            };
            async move { reply }
        }
    }

    fn conversation(responder: &Scripted) -> Conversation<&Scripted> {
        Conversation::new(responder).with_rng(StdRng::seed_from_u64(3))
    }

    #[tokio::test]
    async fn greeting_is_answered_locally() {
        let backend = Scripted::new(Ok(Some("remote".into())));
        let mut conv = conversation(&backend);

        let turn = conv.send("hello").await.unwrap();
        assert_eq!(turn.reply.source, ReplySource::Local);
        assert_eq!(turn.reply.message.sender, Sender::Ai);
        assert_eq!(backend.calls(), 0);
    }

    #[tokio::test]
    async fn remote_reply_is_cleaned() {
        let backend = Scripted::new(Ok(Some(
            "DePaul University is a private Catholic research university located in Chicago, \
             Illinois. It was founded in 1898. Orientation is on 9/2/2025."
                .into(),
        )));
        let mut conv = conversation(&backend);

        let turn = conv.send("  When is orientation?  ").await.unwrap();
        assert_eq!(turn.reply.source, ReplySource::Remote);
        assert_eq!(turn.reply.message.content, "Orientation is on 9/2/2025.");
        assert_eq!(turn.user.content, "When is orientation?");
        assert_eq!(
            backend.seen.lock().unwrap().as_slice(),
            ["When is orientation?"]
        );
    }

    #[tokio::test]
    async fn failure_becomes_apology() {
        let backend = Scripted::new(Err(UnibotError::Network("connection refused".into())));
        let mut conv = conversation(&backend);

        let turn = conv.send("When do grades post?").await.unwrap();
        assert_eq!(turn.reply.source, ReplySource::Fallback);
        assert_eq!(turn.reply.message.content, APOLOGY);
        assert_eq!(conv.chat().messages.len(), 2);
    }

    /// Collects formatted log output for assertions.
    #[derive(Clone, Default)]
    struct LogBuffer(std::sync::Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn failure_is_logged_as_error() {
        let logs = LogBuffer::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(move || writer.clone())
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let backend = Scripted::new(Err(UnibotError::Network("connection refused".into())));
        let mut conv = conversation(&backend);
        conv.send("When do grades post?").await.unwrap();

        let output = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        let line = output
            .lines()
            .find(|l| l.contains("inference request failed"))
            .expect("failure logged");
        assert!(line.contains("ERROR"), "{line}");
        assert!(line.contains("connection refused"), "{line}");
    }

    #[tokio::test]
    async fn empty_remote_reply_uses_placeholder() {
        let backend = Scripted::new(Ok(None));
        let mut conv = conversation(&backend);

        let turn = conv.send("Is the gym open?").await.unwrap();
        assert_eq!(turn.reply.message.content, EMPTY_RESPONSE);
    }

    #[tokio::test]
    async fn blank_input_is_ignored() {
        let backend = Scripted::new(Ok(Some("x".into())));
        let mut conv = conversation(&backend);

        assert!(conv.send("   ").await.is_none());
        assert!(conv.chat().messages.is_empty());
        assert_eq!(conv.chat().title, DEFAULT_CHAT_TITLE);
        assert_eq!(backend.calls(), 0);
    }

    #[tokio::test]
    async fn first_message_names_the_chat() {
        let backend = Scripted::new(Ok(Some("Room 300.".into())));
        let mut conv = conversation(&backend);

        let first = conv.send("Where is the registrar?").await.unwrap();
        assert!(first.renamed);
        assert_eq!(conv.chat().title, "Where is the registrar?");

        let second = conv.send("And the bursar?").await.unwrap();
        assert!(!second.renamed);
        assert_eq!(conv.chat().title, "Where is the registrar?");
    }

    #[tokio::test]
    async fn record_turn_persists_messages_and_title() {
        let dir = std::env::temp_dir().join(format!("unibot-conv-{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(&dir).unwrap();
        let storage = Storage::open(&dir.join("history.db")).await.unwrap();

        let backend = Scripted::new(Ok(Some("Room 300.".into())));
        let mut conv = conversation(&backend);
        storage.insert_chat(conv.chat()).await.unwrap();

        let turn = conv.send("Where is the registrar?").await.unwrap();
        record_turn(&storage, conv.chat(), &turn).await.unwrap();

        let stored = storage.get_chat(&conv.chat().id).await.unwrap().unwrap();
        assert_eq!(stored.title, "Where is the registrar?");
        assert_eq!(stored.messages.len(), 2);
        assert_eq!(stored.messages[1].content, "Room 300.");

        let _ = std::fs::remove_dir_all(&dir);
    }
}
