//! Application configuration for unibot.
//!
//! User config lives at `~/.unibot/unibot.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Result, UnibotError};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "unibot.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".unibot";

/// Default chat history database file name (inside the config dir).
const HISTORY_DB_NAME: &str = "history.db";

// ---------------------------------------------------------------------------
// Config structs (matching unibot.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Inference endpoint settings.
    #[serde(default)]
    pub inference: InferenceConfig,

    /// Chat client behavior.
    #[serde(default)]
    pub chat: ChatConfig,

    /// Calendar link settings.
    #[serde(default)]
    pub calendar: CalendarConfig,
}

/// `[inference]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferenceConfig {
    /// Chat endpoint receiving `{input, model}` POST requests.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Name of the env var that overrides `api_url` when set.
    #[serde(default = "default_api_url_env")]
    pub api_url_env: String,

    /// Model identifier sent with every request.
    #[serde(default = "default_model")]
    pub model: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            api_url_env: default_api_url_env(),
            model: default_model(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl InferenceConfig {
    /// The endpoint to use: the env override if set and non-empty, else `api_url`.
    pub fn resolved_api_url(&self) -> String {
        match std::env::var(&self.api_url_env) {
            Ok(val) if !val.trim().is_empty() => val.trim().to_string(),
            _ => self.api_url.clone(),
        }
    }
}

fn default_api_url() -> String {
    "http://localhost:8000/chat".into()
}
fn default_api_url_env() -> String {
    "UNIBOT_API_URL".into()
}
fn default_model() -> String {
    "detrained".into()
}
fn default_timeout_secs() -> u64 {
    30
}

/// `[chat]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Delay between revealed characters of a reply, in ms. 0 disables the effect.
    #[serde(default = "default_typing_delay")]
    pub typing_delay_ms: u64,

    /// Chat history database path. Defaults to `~/.unibot/history.db`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub history_db: Option<String>,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            typing_delay_ms: default_typing_delay(),
            history_db: None,
        }
    }
}

impl ChatConfig {
    /// Resolve the history database path.
    pub fn history_db_path(&self) -> Result<PathBuf> {
        match &self.history_db {
            Some(p) => Ok(expand_home(p)),
            None => Ok(config_dir()?.join(HISTORY_DB_NAME)),
        }
    }
}

fn default_typing_delay() -> u64 {
    10
}

/// `[calendar]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CalendarConfig {
    /// IANA zone used to resolve relative dates. Local zone when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,

    /// Location pre-filled on new events.
    #[serde(default)]
    pub default_location: String,
}

impl CalendarConfig {
    /// Parse the configured zone, if any.
    pub fn tz(&self) -> Result<Option<Tz>> {
        match self.timezone.as_deref() {
            None => Ok(None),
            Some(name) => name
                .parse::<Tz>()
                .map(Some)
                .map_err(|e| UnibotError::config(format!("invalid timezone '{name}': {e}"))),
        }
    }
}

/// Expand a leading `~/` to the user's home directory.
fn expand_home(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.unibot/`).
pub fn config_dir() -> Result<PathBuf> {
    let home =
        dirs::home_dir().ok_or_else(|| UnibotError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.unibot/unibot.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| UnibotError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| UnibotError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| UnibotError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| UnibotError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| UnibotError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Check that the resolved inference endpoint is a usable http(s) URL.
pub fn validate_api_url(config: &AppConfig) -> Result<Url> {
    let raw = config.inference.resolved_api_url();
    if raw.trim().is_empty() {
        return Err(UnibotError::config(format!(
            "no inference endpoint configured. Set [inference] api_url or the {} environment variable.",
            config.inference.api_url_env
        )));
    }

    let url = Url::parse(&raw)
        .map_err(|e| UnibotError::config(format!("invalid inference URL '{raw}': {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(UnibotError::config(format!(
            "inference URL must use http or https, got '{other}'"
        ))),
    }
}
