//! Conversation logic for unibot.
//!
//! This crate ties together the inference client, chat history storage, and
//! calendar detection into the chat loop used by the CLI: local answers for
//! greetings, cleanup of remote answers, a fixed apology when the endpoint
//! fails, and "add to calendar" offers for dates in AI replies.

pub mod cleaning;
pub mod conversation;
pub mod greetings;
pub mod offers;
pub mod typewriter;
