//! Per-source scheduler and the Fetch → Dedup → Deliver → Persist cycle.
//!
//! Each configured source gets one [`BotRunner`] task with its own interval.
//! A cycle runs to completion before the next tick is honored, so at most
//! one cycle per source is ever in flight and two ticks can never race on
//! the same ledger partition. Missed ticks are skipped, not queued.
//!
//! The notification history is shared across all sources; its async mutex
//! serializes every read-modify-write on the map.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{watch, Mutex};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info, instrument};

use crate::config::BotConfig;
use crate::dedup;
use crate::delivery::{self, NotificationSink, SEND_DELAY};
use crate::error::StoreError;
use crate::history::NotificationHistory;
use crate::ledger::{self, Ledger};
use crate::models::{Article, LedgerRow};
use crate::scrapers;

/// What one cycle did, for the tick log line.
#[derive(Debug, Default)]
pub struct CycleReport {
    pub fetched: usize,
    pub fresh: usize,
    pub sent: usize,
    pub failed: usize,
    pub appended: usize,
}

/// One source's pipeline: configuration, its ledger, the shared history,
/// and the delivery sink.
pub struct BotRunner<S: NotificationSink> {
    config: BotConfig,
    ledger: Ledger,
    history: Arc<Mutex<NotificationHistory>>,
    sink: S,
}

impl<S: NotificationSink> BotRunner<S> {
    pub fn new(
        config: BotConfig,
        ledger: Ledger,
        history: Arc<Mutex<NotificationHistory>>,
        sink: S,
    ) -> Self {
        Self {
            config,
            ledger,
            history,
            sink,
        }
    }

    /// Tick until shutdown. A cycle already in progress always finishes;
    /// the shutdown signal is only observed between cycles.
    #[instrument(level = "info", skip_all, fields(ledger = %self.config.ledger_name))]
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let period = Duration::from_secs(self.config.poll_interval_minutes * 60);
        let mut ticks = interval(period);
        ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);
        info!(
            source = %self.config.source_url,
            interval_minutes = self.config.poll_interval_minutes,
            "Bot runner started"
        );

        loop {
            tokio::select! {
                _ = ticks.tick() => {}
                _ = shutdown.changed() => {
                    info!("Bot runner stopping");
                    return;
                }
            }

            match self.run_cycle().await {
                Ok(report) => info!(
                    fetched = report.fetched,
                    fresh = report.fresh,
                    sent = report.sent,
                    failed = report.failed,
                    appended = report.appended,
                    "Cycle complete"
                ),
                Err(e) => error!(error = %e, "Cycle persistence failed; will retry next tick"),
            }
        }
    }

    /// One full cycle for this source.
    async fn run_cycle(&self) -> Result<CycleReport, StoreError> {
        let batch = scrapers::fetch_batch(&self.config.source_url).await;
        self.process_batch(batch, Utc::now()).await
    }

    /// Dedup, deliver, and persist an already-fetched batch.
    ///
    /// The ledger append covers every fresh article, delivered or not: the
    /// ledger records "seen", the history records "delivered".
    async fn process_batch(
        &self,
        batch: Vec<Article>,
        now: DateTime<Utc>,
    ) -> Result<CycleReport, StoreError> {
        let mut report = CycleReport {
            fetched: batch.len(),
            ..CycleReport::default()
        };

        let key = ledger::current_partition_key(now);
        let mut partition = self.ledger.ensure_partition(&key)?;
        let ledger_links = partition.existing_links();
        let history_links = self.history.lock().await.links();

        let fresh = dedup::classify(batch, &ledger_links, &history_links);
        report.fresh = fresh.len();
        if fresh.is_empty() {
            self.ledger.touch_updated_marker(&mut partition, now)?;
            return Ok(report);
        }

        let delivered = delivery::deliver_batch(
            &self.sink,
            &self.config.chat_id,
            &fresh,
            &self.history,
            SEND_DELAY,
        )
        .await;
        report.sent = delivered.sent;
        report.failed = delivered.failed;

        let rows = fresh.iter().map(LedgerRow::from_article).collect();
        report.appended = self.ledger.append_rows(&mut partition, rows)?;
        self.ledger.touch_updated_marker(&mut partition, now)?;
        Ok(report)
    }
}
