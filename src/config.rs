//! Typed bot configuration, loaded and validated once at startup.
//!
//! The config file is a small YAML document listing one entry per bot:
//!
//! ```yaml
//! bots:
//!   - source_url: "https://vnexpress.net/thoi-su"
//!     chat_id: "-1001234567890"
//!     ledger_name: "thoi-su"
//!     poll_interval_minutes: 5
//! ```
//!
//! Validation is strict and fatal: a process must never reach the scheduler
//! with an unconfigured or half-configured source.

use serde::Deserialize;
use tracing::info;
use url::Url;

use crate::error::ConfigError;

/// Static per-source configuration. Immutable for the process lifetime;
/// one instance drives one scheduler task.
#[derive(Debug, Clone, Deserialize)]
pub struct BotConfig {
    /// Listing page to scrape.
    pub source_url: String,
    /// Telegram chat the new articles are forwarded to.
    pub chat_id: String,
    /// Name of this source's ledger (one partition directory per ledger).
    pub ledger_name: String,
    /// Minutes between cycles for this source.
    pub poll_interval_minutes: u64,
}

/// Top-level configuration document.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub bots: Vec<BotConfig>,
}

impl AppConfig {
    /// Read and validate the YAML config file.
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_string(),
            source,
        })?;
        let config: AppConfig =
            serde_yaml::from_str(&raw).map_err(|source| ConfigError::Parse {
                path: path.to_string(),
                source,
            })?;
        config.validate()?;
        info!(path, bots = config.bots.len(), "Loaded bot configuration");
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.bots.is_empty() {
            return Err(ConfigError::Invalid("no bots configured".to_string()));
        }
        for bot in &self.bots {
            if bot.chat_id.trim().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "bot '{}' has an empty chat_id",
                    bot.ledger_name
                )));
            }
            if bot.ledger_name.trim().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "bot for '{}' has an empty ledger_name",
                    bot.source_url
                )));
            }
            if bot.poll_interval_minutes == 0 {
                return Err(ConfigError::Invalid(format!(
                    "bot '{}' has a zero poll interval",
                    bot.ledger_name
                )));
            }
            Url::parse(&bot.source_url).map_err(|e| {
                ConfigError::Invalid(format!(
                    "bot '{}' has an invalid source_url '{}': {}",
                    bot.ledger_name, bot.source_url, e
                ))
            })?;
        }
        // Two bots sharing a ledger would race on the same partition file.
        let mut names: Vec<&str> = self.bots.iter().map(|b| b.ledger_name.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        if names.len() != self.bots.len() {
            return Err(ConfigError::Invalid(
                "ledger_name values must be unique".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(yaml: &str) -> Result<(), ConfigError> {
        let config: AppConfig = serde_yaml::from_str(yaml).unwrap();
        config.validate()
    }

    #[test]
    fn test_valid_config() {
        let yaml = r#"
bots:
  - source_url: "https://vnexpress.net/thoi-su"
    chat_id: "-100123"
    ledger_name: "thoi-su"
    poll_interval_minutes: 5
  - source_url: "https://vnexpress.net/the-gioi"
    chat_id: "-100456"
    ledger_name: "the-gioi"
    poll_interval_minutes: 1
"#;
        assert!(parse(yaml).is_ok());
    }

    #[test]
    fn test_empty_bots_rejected() {
        assert!(matches!(
            parse("bots: []"),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_zero_interval_rejected() {
        let yaml = r#"
bots:
  - source_url: "https://vnexpress.net/thoi-su"
    chat_id: "-100123"
    ledger_name: "thoi-su"
    poll_interval_minutes: 0
"#;
        assert!(matches!(parse(yaml), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_bad_url_rejected() {
        let yaml = r#"
bots:
  - source_url: "not a url"
    chat_id: "-100123"
    ledger_name: "thoi-su"
    poll_interval_minutes: 5
"#;
        assert!(matches!(parse(yaml), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_duplicate_ledger_names_rejected() {
        let yaml = r#"
bots:
  - source_url: "https://vnexpress.net/thoi-su"
    chat_id: "-100123"
    ledger_name: "news"
    poll_interval_minutes: 5
  - source_url: "https://vnexpress.net/the-gioi"
    chat_id: "-100456"
    ledger_name: "news"
    poll_interval_minutes: 5
"#;
        assert!(matches!(parse(yaml), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_missing_field_is_parse_error() {
        let yaml = r#"
bots:
  - source_url: "https://vnexpress.net/thoi-su"
    chat_id: "-100123"
"#;
        let parsed: Result<AppConfig, _> = serde_yaml::from_str(yaml);
        assert!(parsed.is_err());
    }
}
