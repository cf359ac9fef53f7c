//! SportMatch CLI - swipe, match and chat from the terminal

mod auth;
mod cli;
mod commands;
mod error;

use clap::{CommandFactory, Parser};

use crate::cli::{Cli, Commands};
use crate::commands::auth_cmd::run_auth;
use crate::commands::chat::run_chat;
use crate::commands::common::Context;
use crate::commands::completions::run_completions;
use crate::commands::deck::run_deck;
use crate::commands::matches::run_matches;
use crate::commands::photo::run_photo;
use crate::commands::profile::run_profile;
use crate::commands::swipe::run_swipe;
use crate::commands::sync::run_sync;
use crate::error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("sportmatch=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };

    if let Commands::Completions { shell, output } = &command {
        return run_completions(*shell, output.as_deref());
    }

    let ctx = Context::open(cli.db_path, cli.act_as).await?;
    match command {
        Commands::Auth { command } => run_auth(command, &ctx).await,
        Commands::Profile { command } => run_profile(command, &ctx).await,
        Commands::Photo { command } => run_photo(command, &ctx).await,
        Commands::Deck { limit, json } => run_deck(limit, json, &ctx).await,
        Commands::Swipe { target, decision } => run_swipe(&target, decision, &ctx).await,
        Commands::Matches { json } => run_matches(json, &ctx).await,
        Commands::Chat { command } => run_chat(command, &ctx).await,
        Commands::Sync => run_sync(&ctx).await,
        Commands::Completions { .. } => Ok(()),
    }
}
