//! Interactive chat loop.

use std::io::Write;
use std::time::Duration;

use color_eyre::eyre::Result;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::warn;
use unibot_calendar::{Segment, highlight};
use unibot_core::conversation::{Conversation, record_turn};
use unibot_core::offers::CalendarOffer;
use unibot_core::typewriter::reveal;
use unibot_inference::InferenceClient;
use unibot_shared::{Chat, Sender};
use unibot_storage::Storage;

use crate::commands::{CalendarContext, Spinner};

const HELP: &str = "Commands: :cal <n> calendar links for date n, :new new chat, :help, :quit";

pub(crate) struct ChatOptions {
    pub typing_delay: Duration,
    pub calendar: CalendarContext,
}

/// A line typed at the prompt that is not a question.
#[derive(Debug, PartialEq, Eq)]
enum ReplCommand {
    Quit,
    New,
    Help,
    Calendar(usize),
    Invalid(String),
}

impl ReplCommand {
    /// `None` for ordinary input.
    fn parse(line: &str) -> Option<Self> {
        let rest = line.strip_prefix(':')?;
        let mut parts = rest.split_whitespace();
        let cmd = parts.next().unwrap_or_default();
        let command = match cmd {
            "q" | "quit" | "exit" => Self::Quit,
            "new" => Self::New,
            "help" | "h" => Self::Help,
            "cal" => match parts.next().map(str::parse::<usize>) {
                Some(Ok(n)) if n > 0 => Self::Calendar(n),
                _ => Self::Invalid("usage: :cal <n>".into()),
            },
            other => Self::Invalid(format!("unknown command ':{other}'. {HELP}")),
        };
        Some(command)
    }
}

/// Render a reply with each detected date marked as `[n: date]`.
fn render_highlighted(text: &str, offers: &[CalendarOffer]) -> String {
    let dates: Vec<&str> = offers.iter().map(|o| o.date.as_str()).collect();
    highlight(text, &dates)
        .into_iter()
        .map(|segment| match segment {
            Segment::Text(t) => t.to_string(),
            Segment::Date { index, text } => format!("[{}: {text}]", index + 1),
        })
        .collect()
}

async fn start_chat(storage: &Storage, client: InferenceClient) -> Result<Conversation<InferenceClient>> {
    let conversation = Conversation::new(client);
    storage.insert_chat(conversation.chat()).await?;
    Ok(conversation)
}

fn print_transcript(chat: &Chat) {
    println!("# {}", chat.title);
    for message in &chat.messages {
        let who = match message.sender {
            Sender::User => "you",
            Sender::Ai => "unibot",
        };
        println!("{who}> {}", message.content);
    }
    println!();
}

fn prompt() -> Result<()> {
    print!("you> ");
    std::io::stdout().flush()?;
    Ok(())
}

/// Run the REPL until `:quit` or end of input.
pub(crate) async fn run(
    storage: &Storage,
    client: InferenceClient,
    existing: Option<Chat>,
    opts: ChatOptions,
) -> Result<()> {
    let mut conversation = match existing {
        Some(chat) => {
            print_transcript(&chat);
            Conversation::resume(chat, client.clone())
        }
        None => start_chat(storage, client.clone()).await?,
    };
    let mut offers: Vec<CalendarOffer> = Vec::new();

    println!("{HELP}");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        prompt()?;
        let Some(line) = lines.next_line().await? else {
            println!();
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match ReplCommand::parse(line) {
            Some(ReplCommand::Quit) => break,
            Some(ReplCommand::New) => {
                conversation = start_chat(storage, client.clone()).await?;
                offers.clear();
                println!("Started a new chat.");
                continue;
            }
            Some(ReplCommand::Help) => {
                println!("{HELP}");
                continue;
            }
            Some(ReplCommand::Calendar(n)) => {
                match offers.get(n - 1) {
                    Some(CalendarOffer {
                        event: Some(event), ..
                    }) => opts.calendar.print_event(event),
                    Some(offer) => println!("'{}' could not be read as a calendar date.", offer.date),
                    None => println!("No date [{n}] in the last reply."),
                }
                continue;
            }
            Some(ReplCommand::Invalid(msg)) => {
                println!("{msg}");
                continue;
            }
            None => {}
        }

        let spinner = Spinner::start("Thinking...");
        let turn = conversation.send(line).await;
        spinner.finish();
        let Some(turn) = turn else {
            continue;
        };

        if let Err(e) = record_turn(storage, conversation.chat(), &turn).await {
            warn!(error = %e, "failed to save chat history");
        }

        offers = opts.calendar.offers(&turn.reply.message);
        let rendered = render_highlighted(&turn.reply.message.content, &offers);

        print!("unibot> ");
        let mut stdout = std::io::stdout();
        reveal(&rendered, opts.typing_delay, |c| {
            print!("{c}");
            let _ = stdout.flush();
        })
        .await;
        println!();
        if !offers.is_empty() {
            println!("(:cal <n> for calendar links)");
        }
    }

    Ok(())
}
