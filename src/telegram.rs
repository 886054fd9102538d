//! Thin Telegram Bot API client: the notification sink plus a command
//! poll loop for liveness queries.
//!
//! Only two methods are used: `sendMessage` for deliveries and `getUpdates`
//! (long polling) so chat members can ask `/start` whether the process is
//! alive. The command loop is an adapter only; it never reads or mutates
//! pipeline state.

use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::sleep;
use tracing::{debug, info, instrument, warn};

use crate::error::DeliveryError;

const API_BASE: &str = "https://api.telegram.org";

/// Seconds the server holds a `getUpdates` call open.
const POLL_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Deserialize)]
struct ApiEnvelope<T> {
    ok: bool,
    description: Option<String>,
    result: Option<T>,
}

/// One incoming update from `getUpdates`.
#[derive(Debug, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
}

#[derive(Debug, Deserialize)]
pub struct Message {
    pub chat: Chat,
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Chat {
    pub id: i64,
}

/// Handle to one bot token's API surface. Cheap to clone.
#[derive(Debug, Clone)]
pub struct TelegramClient {
    http: reqwest::Client,
    base: String,
}

impl TelegramClient {
    pub fn new(token: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base: format!("{API_BASE}/bot{token}"),
        }
    }

    /// Attempt one delivery of `text` to `chat_id`.
    ///
    /// `silent` maps to `disable_notification` (no client-side alert).
    /// Non-2xx responses and `ok=false` envelopes are both failures.
    #[instrument(level = "debug", skip(self, text))]
    pub async fn send_message(
        &self,
        chat_id: &str,
        text: &str,
        silent: bool,
    ) -> Result<(), DeliveryError> {
        let response = self
            .http
            .post(format!("{}/sendMessage", self.base))
            .json(&json!({
                "chat_id": chat_id,
                "text": text,
                "disable_notification": silent,
                "disable_web_page_preview": false,
            }))
            .send()
            .await?;

        let status = response.status().as_u16();
        let envelope: ApiEnvelope<serde_json::Value> = response.json().await?;
        if !envelope.ok {
            return Err(DeliveryError::Rejected {
                status,
                description: envelope
                    .description
                    .unwrap_or_else(|| "no description".to_string()),
            });
        }
        debug!(chat_id, "Delivered message");
        Ok(())
    }

    /// Long-poll for updates past `offset`.
    pub async fn get_updates(&self, offset: i64) -> Result<Vec<Update>, DeliveryError> {
        let response = self
            .http
            .get(format!("{}/getUpdates", self.base))
            .query(&[
                ("offset", offset.to_string()),
                ("timeout", POLL_TIMEOUT_SECS.to_string()),
            ])
            .timeout(Duration::from_secs(POLL_TIMEOUT_SECS + 10))
            .send()
            .await?;

        let status = response.status().as_u16();
        let envelope: ApiEnvelope<Vec<Update>> = response.json().await?;
        if !envelope.ok {
            return Err(DeliveryError::Rejected {
                status,
                description: envelope
                    .description
                    .unwrap_or_else(|| "no description".to_string()),
            });
        }
        Ok(envelope.result.unwrap_or_default())
    }
}

/// Build the reply for a liveness command.
fn liveness_reply(bot_names: &[String]) -> String {
    format!("news_courier is running\nsources: {}", bot_names.join(", "))
}

/// Is this message text a command we answer?
fn is_liveness_command(text: &str) -> bool {
    let command = text.split_whitespace().next().unwrap_or("");
    // Commands arrive as "/start" or "/start@BotName" in group chats.
    let command = command.split('@').next().unwrap_or(command);
    matches!(command, "/start" | "/status")
}

/// Answer `/start` and `/status` until shutdown is signalled.
///
/// Poll failures are logged and retried after a short pause; the loop never
/// touches the ledger or the history.
#[instrument(level = "info", skip_all)]
pub async fn run_command_loop(
    client: TelegramClient,
    bot_names: Vec<String>,
    mut shutdown: watch::Receiver<bool>,
) {
    info!("Command loop started");
    let mut offset = 0i64;
    loop {
        let updates = tokio::select! {
            result = client.get_updates(offset) => result,
            _ = shutdown.changed() => {
                info!("Command loop stopping");
                return;
            }
        };

        let updates = match updates {
            Ok(updates) => updates,
            Err(e) => {
                warn!(error = %e, "getUpdates failed; retrying shortly");
                sleep(Duration::from_secs(5)).await;
                continue;
            }
        };

        for update in updates {
            offset = offset.max(update.update_id + 1);
            let Some(message) = update.message else {
                continue;
            };
            let Some(text) = message.text else {
                continue;
            };
            if !is_liveness_command(&text) {
                continue;
            }
            let chat_id = message.chat.id.to_string();
            debug!(chat_id = %chat_id, command = %text, "Answering liveness command");
            if let Err(e) = client
                .send_message(&chat_id, &liveness_reply(&bot_names), true)
                .await
            {
                warn!(error = %e, chat_id = %chat_id, "Failed to answer liveness command");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_liveness_commands_recognized() {
        assert!(is_liveness_command("/start"));
        assert!(is_liveness_command("/status"));
        assert!(is_liveness_command("/start@news_courier_bot"));
        assert!(is_liveness_command("/start now"));
        assert!(!is_liveness_command("hello"));
        assert!(!is_liveness_command("/stop"));
        assert!(!is_liveness_command(""));
    }

    #[test]
    fn test_liveness_reply_lists_sources() {
        let reply = liveness_reply(&["thoi-su".to_string(), "the-gioi".to_string()]);
        assert!(reply.contains("running"));
        assert!(reply.contains("thoi-su, the-gioi"));
    }

    #[test]
    fn test_update_envelope_parses() {
        let raw = r#"{
            "ok": true,
            "result": [
                {"update_id": 42, "message": {"chat": {"id": -100123}, "text": "/start"}}
            ]
        }"#;
        let envelope: ApiEnvelope<Vec<Update>> = serde_json::from_str(raw).unwrap();
        assert!(envelope.ok);
        let updates = envelope.result.unwrap();
        assert_eq!(updates[0].update_id, 42);
        assert_eq!(updates[0].message.as_ref().unwrap().chat.id, -100123);
    }

    #[test]
    fn test_error_envelope_parses() {
        let raw = r#"{"ok": false, "description": "Unauthorized"}"#;
        let envelope: ApiEnvelope<Vec<Update>> = serde_json::from_str(raw).unwrap();
        assert!(!envelope.ok);
        assert_eq!(envelope.description.as_deref(), Some("Unauthorized"));
    }
}
