//! Command-line interface definitions for News Courier.
//!
//! All options can be provided via command-line flags or environment
//! variables. The Telegram token is environment-only by default so it stays
//! out of shell history.

use clap::Parser;

/// Command-line arguments for the News Courier daemon.
///
/// # Examples
///
/// ```sh
/// # Run with the default config path and state directory
/// TELEGRAM_BOT_TOKEN=123:abc news_courier
///
/// # Explicit paths
/// TELEGRAM_BOT_TOKEN=123:abc news_courier -c ./bots.yaml -s /var/lib/news_courier
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Path to the YAML file listing bot sources
    #[arg(short, long, default_value = "bots.yaml")]
    pub config: String,

    /// Directory holding ledger partitions and the notification history
    #[arg(short, long, default_value = "./state", env = "NEWS_COURIER_STATE_DIR")]
    pub state_dir: String,

    /// Telegram Bot API token
    #[arg(long, env = "TELEGRAM_BOT_TOKEN", hide_env_values = true)]
    pub telegram_token: String,

    /// Disable the Telegram command poll loop (scrape-and-forward only)
    #[arg(long, default_value_t = false)]
    pub no_command_loop: bool,
}
