//! Shared types, error model, and configuration for unibot.
//!
//! This crate is the foundation depended on by all other unibot crates.
//! It provides:
//! - [`UnibotError`], the unified error type
//! - Domain types ([`Chat`], [`Message`], [`Sender`], [`ChatId`])
//! - Configuration ([`AppConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, CalendarConfig, ChatConfig, InferenceConfig, config_dir, config_file_path,
    init_config, load_config, load_config_from, validate_api_url,
};
pub use error::{Result, UnibotError};
pub use types::{Chat, ChatId, DEFAULT_CHAT_TITLE, Message, Sender};
