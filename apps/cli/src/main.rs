//! unibot CLI: terminal client for the university chatbot.
//!
//! Sends questions to the inference endpoint, keeps chat history locally,
//! and turns dates in answers into "add to calendar" links.

mod chat;
mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
