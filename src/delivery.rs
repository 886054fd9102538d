//! Best-effort delivery of newly classified articles to a channel.
//!
//! Each article gets exactly one send attempt per cycle. A failure is logged
//! and the batch continues; the article stays out of the history so the next
//! cycle retries it if it is still on the page. A success is recorded in the
//! notification history before the next send starts. A fixed pause between
//! consecutive sends keeps the sink's rate limiter happy without blocking
//! other sources' cycles.

use std::time::Duration;

use chrono::Utc;
use tokio::sync::Mutex;
use tokio::time::sleep;
use tracing::{error, info, instrument, warn};

use crate::error::DeliveryError;
use crate::history::NotificationHistory;
use crate::models::Article;

/// Pause between consecutive sends within one batch.
pub const SEND_DELAY: Duration = Duration::from_millis(1500);

/// One send attempt to a destination channel.
///
/// [`crate::telegram::TelegramClient`] is the production implementation;
/// tests substitute their own.
pub trait NotificationSink {
    async fn send(
        &self,
        chat_id: &str,
        text: &str,
        silent: bool,
    ) -> Result<(), DeliveryError>;
}

impl NotificationSink for crate::telegram::TelegramClient {
    async fn send(
        &self,
        chat_id: &str,
        text: &str,
        silent: bool,
    ) -> Result<(), DeliveryError> {
        self.send_message(chat_id, text, silent).await
    }
}

/// Outcome counts for one delivered batch.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    pub sent: usize,
    pub failed: usize,
}

/// Send each article once, marking successes in the history as we go.
///
/// `delay` is [`SEND_DELAY`] in production; tests pass zero.
#[instrument(level = "info", skip_all, fields(chat_id, batch = articles.len()))]
pub async fn deliver_batch<S: NotificationSink>(
    sink: &S,
    chat_id: &str,
    articles: &[Article],
    history: &Mutex<NotificationHistory>,
    delay: Duration,
) -> DeliveryReport {
    let mut report = DeliveryReport::default();
    for (i, article) in articles.iter().enumerate() {
        if i > 0 {
            sleep(delay).await;
        }
        match sink.send(chat_id, &article.to_message(), false).await {
            Ok(()) => {
                report.sent += 1;
                // Persist before the next send so a crash cannot lose the
                // fact that this article went out.
                if let Err(e) = history.lock().await.mark_sent(&article.link, Utc::now()) {
                    error!(link = %article.link, error = %e, "Failed to persist notification history");
                }
            }
            Err(e) => {
                report.failed += 1;
                warn!(link = %article.link, error = %e, "Delivery failed; will retry next cycle");
            }
        }
    }
    info!(sent = report.sent, failed = report.failed, "Batch delivery finished");
    report
}
