//! CLI command definitions, routing, and tracing setup.

use std::time::Duration;

use chrono::{DateTime, Local, TimeZone, Utc};
use chrono_tz::Tz;
use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;
use unibot_calendar::{CalendarEvent, CalendarLinks, EventEdits, Provider, extract_dates, resolve};
use unibot_core::conversation::Conversation;
use unibot_core::offers::{CalendarOffer, calendar_offers};
use unibot_inference::{InferenceClient, InferenceOptions};
use unibot_shared::{AppConfig, ChatId, Message, Sender, init_config, load_config, validate_api_url};
use unibot_storage::Storage;

use crate::chat::{self, ChatOptions};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// unibot: ask the university chatbot from your terminal.
#[derive(Parser)]
#[command(
    name = "unibot",
    version,
    about = "Chat with the university assistant and turn dates in its answers into calendar events.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Inference endpoint, overriding config and environment.
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Start an interactive chat.
    Chat {
        /// Resume an existing chat by ID.
        #[arg(long)]
        chat: Option<String>,

        /// Print replies at once instead of typing them out.
        #[arg(long)]
        no_typing: bool,
    },

    /// Ask a single question and print the answer.
    Ask {
        /// Question text.
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },

    /// Print the date expressions found in some text.
    Dates {
        /// Text to scan.
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },

    /// Build a calendar event from a date expression and print its links.
    Event(EventArgs),

    /// Browse or delete saved chats.
    History {
        #[command(subcommand)]
        action: HistoryAction,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Arguments for `unibot event`.
#[derive(Args)]
pub(crate) struct EventArgs {
    /// Date expression, e.g. "May 15, 2025" or "next friday at 2pm".
    date: String,

    /// Text the date appeared in; used for the title and description.
    #[arg(long)]
    context: Option<String>,

    /// Override the inferred title.
    #[arg(long)]
    title: Option<String>,

    /// Override the start time (e.g. 2025-05-15T14:00).
    #[arg(long)]
    start: Option<String>,

    /// Override the end time.
    #[arg(long)]
    end: Option<String>,

    #[arg(long)]
    location: Option<String>,

    #[arg(long)]
    description: Option<String>,

    /// Print the event and links as JSON.
    #[arg(long)]
    json: bool,
}

/// History subcommands.
#[derive(Subcommand)]
pub(crate) enum HistoryAction {
    /// List saved chats, most recent first.
    List,
    /// Print one chat.
    Show { id: String },
    /// Delete one chat and its messages.
    Delete { id: String },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags. Logs go to stderr so they never
/// interleave with chat output.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "unibot=info",
        1 => "unibot=debug",
        _ => "unibot=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let api_url = cli.api_url;
    match cli.command {
        Command::Chat { chat, no_typing } => {
            cmd_chat(chat.as_deref(), no_typing, api_url.as_deref()).await
        }
        Command::Ask { text } => cmd_ask(&text.join(" "), api_url.as_deref()).await,
        Command::Dates { text } => cmd_dates(&text.join(" ")),
        Command::Event(args) => cmd_event(args),
        Command::History { action } => match action {
            HistoryAction::List => cmd_history_list().await,
            HistoryAction::Show { id } => cmd_history_show(&id).await,
            HistoryAction::Delete { id } => cmd_history_delete(&id).await,
        },
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show().await,
        },
    }
}

// ---------------------------------------------------------------------------
// Shared setup
// ---------------------------------------------------------------------------

/// Build the inference client, letting `--api-url` win over config and env.
fn inference_client(config: &AppConfig, api_url: Option<&str>) -> Result<InferenceClient> {
    let mut config = config.clone();
    if let Some(raw) = api_url {
        config.inference.api_url = raw.to_string();
        config.inference.api_url_env.clear();
    }
    let url = validate_api_url(&config)?;
    info!(endpoint = %url, model = %config.inference.model, "using inference endpoint");
    Ok(InferenceClient::new(InferenceOptions::from_config(url, &config))?)
}

fn parse_chat_id(id: &str) -> Result<ChatId> {
    id.parse().map_err(|e| eyre!("invalid chat id '{id}': {e}"))
}

/// Time zone and defaults for turning dates into events.
pub(crate) struct CalendarContext {
    zone: Option<Tz>,
    default_location: String,
}

impl CalendarContext {
    pub(crate) fn from_config(config: &AppConfig) -> Result<Self> {
        Ok(Self {
            zone: config.calendar.tz()?,
            default_location: config.calendar.default_location.clone(),
        })
    }

    /// Calendar offers for an assistant message, resolved against the current time.
    pub(crate) fn offers(&self, message: &Message) -> Vec<CalendarOffer> {
        match self.zone {
            Some(tz) => calendar_offers(
                message,
                &Utc::now().with_timezone(&tz),
                &self.default_location,
            ),
            None => calendar_offers(message, &Local::now(), &self.default_location),
        }
    }

    fn event(&self, date: &str, context: &str, edits: EventEdits) -> Result<CalendarEvent> {
        match self.zone {
            Some(tz) => self.build_event(date, context, &Utc::now().with_timezone(&tz), edits),
            None => self.build_event(date, context, &Local::now(), edits),
        }
    }

    fn build_event<Z: TimeZone>(
        &self,
        date: &str,
        context: &str,
        now: &DateTime<Z>,
        edits: EventEdits,
    ) -> Result<CalendarEvent> {
        let mut event = resolve(date, context, now)
            .ok_or_else(|| eyre!("'{date}' is not a date unibot can resolve"))?;
        event.location = self.default_location.clone();
        Ok(event.apply(edits, &now.timezone())?)
    }

    /// Format an instant in the configured zone.
    pub(crate) fn display_time(&self, instant: &DateTime<Utc>) -> String {
        const FORMAT: &str = "%a %b %-d %Y, %-I:%M %p %Z";
        match self.zone {
            Some(tz) => instant.with_timezone(&tz).format(FORMAT).to_string(),
            None => instant.with_timezone(&Local).format("%a %b %-d %Y, %-I:%M %p").to_string(),
        }
    }

    /// Print an event summary followed by the three provider links.
    pub(crate) fn print_event(&self, event: &CalendarEvent) {
        let links = CalendarLinks::for_event(event);
        println!("  Title:    {}", event.title);
        println!("  Start:    {}", self.display_time(&event.start));
        println!("  End:      {}", self.display_time(&event.end));
        if !event.location.is_empty() {
            println!("  Location: {}", event.location);
        }
        println!();
        for provider in Provider::ALL {
            println!("  {}:", provider.label());
            println!("    {}", links.get(provider));
        }
    }
}

// ---------------------------------------------------------------------------
// Spinner
// ---------------------------------------------------------------------------

/// Spinner shown while waiting on the endpoint.
pub(crate) struct Spinner {
    bar: ProgressBar,
}

impl Spinner {
    pub(crate) fn start(message: &str) -> Self {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
        bar.set_style(style);
        bar.set_message(message.to_string());
        bar.enable_steady_tick(Duration::from_millis(80));
        Self { bar }
    }

    pub(crate) fn finish(self) {
        self.bar.finish_and_clear();
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_chat(resume: Option<&str>, no_typing: bool, api_url: Option<&str>) -> Result<()> {
    let config = load_config()?;
    let client = inference_client(&config, api_url)?;
    let calendar = CalendarContext::from_config(&config)?;

    let db_path = config.chat.history_db_path()?;
    let storage = Storage::open(&db_path).await?;

    let existing = match resume {
        Some(id) => {
            let id = parse_chat_id(id)?;
            let chat = storage
                .get_chat(&id)
                .await?
                .ok_or_else(|| eyre!("no chat with id {id}"))?;
            Some(chat)
        }
        None => None,
    };

    let typing_delay = if no_typing {
        Duration::ZERO
    } else {
        Duration::from_millis(config.chat.typing_delay_ms)
    };

    info!(db = %db_path.display(), resume = existing.is_some(), "starting chat");
    chat::run(
        &storage,
        client,
        existing,
        ChatOptions {
            typing_delay,
            calendar,
        },
    )
    .await
}

async fn cmd_ask(text: &str, api_url: Option<&str>) -> Result<()> {
    let config = load_config()?;
    let client = inference_client(&config, api_url)?;
    let calendar = CalendarContext::from_config(&config)?;

    let spinner = Spinner::start("Thinking...");
    let turn = Conversation::new(client).send(text).await;
    spinner.finish();

    let Some(turn) = turn else {
        return Err(eyre!("question is empty"));
    };

    println!("{}", turn.reply.message.content);

    let offers = calendar.offers(&turn.reply.message);
    for offer in &offers {
        println!();
        println!("[{}] {}", offer.index + 1, offer.date);
        match &offer.event {
            Some(event) => calendar.print_event(event),
            None => println!("  (no calendar date)"),
        }
    }
    Ok(())
}

fn cmd_dates(text: &str) -> Result<()> {
    let dates = extract_dates(text);
    if dates.is_empty() {
        println!("No dates found.");
        return Ok(());
    }
    for (i, date) in dates.iter().enumerate() {
        println!("{:>3}. {date}", i + 1);
    }
    Ok(())
}

fn cmd_event(args: EventArgs) -> Result<()> {
    let config = load_config()?;
    let calendar = CalendarContext::from_config(&config)?;

    let context = args.context.unwrap_or_else(|| args.date.clone());
    let edits = EventEdits {
        title: args.title,
        start: args.start,
        end: args.end,
        location: args.location,
        description: args.description,
    };
    let event = calendar.event(&args.date, &context, edits)?;

    if args.json {
        let out = serde_json::json!({
            "event": event,
            "links": CalendarLinks::for_event(&event),
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        calendar.print_event(&event);
    }
    Ok(())
}

async fn cmd_history_list() -> Result<()> {
    let config = load_config()?;
    let path = config.chat.history_db_path()?;
    if !path.exists() {
        println!("No saved chats.");
        return Ok(());
    }

    let storage = Storage::open_readonly(&path).await?;
    let chats = storage.list_chats().await?;
    if chats.is_empty() {
        println!("No saved chats.");
        return Ok(());
    }

    for chat in chats {
        println!(
            "{}  {}  {:>4} msgs  {}",
            chat.id,
            chat.updated_at.with_timezone(&Local).format("%Y-%m-%d %H:%M"),
            chat.message_count,
            chat.title
        );
    }
    Ok(())
}

async fn cmd_history_show(id: &str) -> Result<()> {
    let config = load_config()?;
    let id = parse_chat_id(id)?;
    let storage = Storage::open_readonly(&config.chat.history_db_path()?).await?;
    let chat = storage
        .get_chat(&id)
        .await?
        .ok_or_else(|| eyre!("no chat with id {id}"))?;

    println!("# {}", chat.title);
    println!();
    for message in &chat.messages {
        let who = match message.sender {
            Sender::User => "you",
            Sender::Ai => "unibot",
        };
        println!(
            "[{}] {who}> {}",
            message.timestamp.with_timezone(&Local).format("%H:%M"),
            message.content
        );
    }
    Ok(())
}

async fn cmd_history_delete(id: &str) -> Result<()> {
    let config = load_config()?;
    let id = parse_chat_id(id)?;
    let storage = Storage::open(&config.chat.history_db_path()?).await?;
    if storage.delete_chat(&id).await? {
        println!("Deleted chat {id}.");
        Ok(())
    } else {
        Err(eyre!("no chat with id {id}"))
    }
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}
