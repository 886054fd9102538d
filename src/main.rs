//! # News Courier
//!
//! A long-running daemon that scrapes news listing pages on independent
//! per-source schedules, deduplicates articles against durable state, and
//! forwards genuinely new ones to Telegram chats.
//!
//! ## Pipeline
//!
//! Each source runs the same cycle on its own timer:
//! 1. **Fetch**: scrape the listing page into an ordered batch
//! 2. **Dedup**: drop links already in the day's ledger partition or the
//!    multi-day notification history
//! 3. **Deliver**: send each new article to the source's Telegram chat
//! 4. **Persist**: append all new articles to the ledger and stamp the
//!    partition's refresh marker
//!
//! ## Durable state
//!
//! Two stores under the state directory keep restarts and day rollovers
//! from re-sending articles: a day-partitioned ledger per source (record of
//! "seen") and one shared notification history (record of "delivered",
//! 72-hour retention).

use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinSet;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt as tfmt, EnvFilter};

mod cli;
mod config;
mod dedup;
mod delivery;
mod error;
mod history;
mod ledger;
mod models;
mod runner;
mod scrapers;
mod telegram;

use cli::Cli;
use config::AppConfig;
use history::NotificationHistory;
use ledger::Ledger;
use runner::BotRunner;
use telegram::TelegramClient;

#[tokio::main]
async fn main() -> ExitCode {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    info!("news_courier starting up");
    let args = Cli::parse();

    // Config problems are fatal: never reach the scheduler half-configured.
    let config = match AppConfig::load(&args.config) {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Startup aborted");
            return ExitCode::FAILURE;
        }
    };
    if args.telegram_token.trim().is_empty() {
        error!("Startup aborted: empty Telegram token");
        return ExitCode::FAILURE;
    }

    let state_dir = Path::new(&args.state_dir);
    let history = match NotificationHistory::load(&state_dir.join("history.json")) {
        Ok(history) => Arc::new(Mutex::new(history)),
        Err(e) => {
            error!(error = %e, "Failed to load notification history");
            return ExitCode::FAILURE;
        }
    };

    let telegram = TelegramClient::new(&args.telegram_token);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut tasks = JoinSet::new();

    let bot_names: Vec<String> = config
        .bots
        .iter()
        .map(|bot| bot.ledger_name.clone())
        .collect();

    for bot in config.bots {
        let ledger = match Ledger::open(state_dir, &bot.ledger_name) {
            Ok(ledger) => ledger,
            Err(e) => {
                error!(ledger = %bot.ledger_name, error = %e, "Failed to open ledger");
                return ExitCode::FAILURE;
            }
        };
        let runner = BotRunner::new(bot, ledger, Arc::clone(&history), telegram.clone());
        tasks.spawn(runner.run(shutdown_rx.clone()));
    }

    if !args.no_command_loop {
        tasks.spawn(telegram::run_command_loop(
            telegram.clone(),
            bot_names,
            shutdown_rx.clone(),
        ));
    }
    drop(shutdown_rx);

    info!(tasks = tasks.len(), "All tasks started");

    // In-flight cycles finish their delivery+persist step before exit; the
    // shutdown signal is only observed between cycles.
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received; letting in-flight cycles finish"),
        Err(e) => warn!(error = %e, "Failed to listen for shutdown signal; exiting"),
    }
    let _ = shutdown_tx.send(true);

    while let Some(joined) = tasks.join_next().await {
        if let Err(e) = joined {
            error!(error = %e, "Task ended abnormally");
        }
    }

    info!("news_courier stopped");
    ExitCode::SUCCESS
}
