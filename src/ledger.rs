//! Day-partitioned, append-only ledger of seen articles.
//!
//! Each configured source owns one ledger directory under the state dir.
//! One partition holds one day's rows and is persisted as a single JSON
//! document named after its key (`DD-MM-YYYY.json`). Partition keys are
//! computed in a fixed UTC+7 offset, matching the deployment the sources
//! publish in, so "today" rolls over at the source's midnight rather than
//! the host's.
//!
//! # Rotation
//!
//! On the first cycle of a new day the most recent partition file is renamed
//! to the new key and its rows are cleared, so a ledger retains a bounded
//! number of partition files instead of growing one per day. Exactly one
//! partition matches the current key at any time; cleared rows are gone, which
//! is why deduplication also consults the multi-day notification history.
//!
//! # Durability
//!
//! Every mutation is flushed synchronously via a temp-file rename, so a
//! partition file is always either the previous complete document or the new
//! complete document. A failed flush surfaces as [`StoreError`] and aborts
//! the calling cycle's persistence step.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::error::StoreError;
use crate::models::LedgerRow;

/// Partition keys look like `06-05-2025`.
const PARTITION_KEY_FORMAT: &str = "%d-%m-%Y";

/// Offset of the ledger's civil day (UTC+7).
const LEDGER_UTC_OFFSET_HOURS: i32 = 7;

/// Column names of the fixed row schema, recorded in every partition file.
const COLUMNS: [&str; 4] = ["Title", "Summary", "Link", "UpdatedTime"];

/// Compute the partition key for `now` in the ledger's fixed timezone.
pub fn current_partition_key(now: DateTime<Utc>) -> String {
    let offset = FixedOffset::east_opt(LEDGER_UTC_OFFSET_HOURS * 3600)
        .expect("static offset is in range");
    now.with_timezone(&offset)
        .format(PARTITION_KEY_FORMAT)
        .to_string()
}

/// One day's worth of recorded articles, loaded into memory and mirrored to
/// a JSON file by [`Ledger`].
#[derive(Debug, Serialize, Deserialize)]
pub struct Partition {
    /// Date key in `DD-MM-YYYY` form.
    pub key: String,
    /// Header row of the fixed schema.
    pub columns: Vec<String>,
    /// Human-readable last-refresh stamp, overwritten each cycle.
    pub updated_at: Option<String>,
    /// Recorded rows, in append order. A link appears at most once.
    pub rows: Vec<LedgerRow>,
}

impl Partition {
    fn empty(key: &str) -> Self {
        Self {
            key: key.to_string(),
            columns: COLUMNS.iter().map(|c| c.to_string()).collect(),
            updated_at: None,
            rows: Vec::new(),
        }
    }

    /// All links currently recorded in this partition.
    pub fn existing_links(&self) -> HashSet<String> {
        self.rows.iter().map(|row| row.link.clone()).collect()
    }
}

/// Handle to one source's ledger directory.
#[derive(Debug, Clone)]
pub struct Ledger {
    name: String,
    dir: PathBuf,
}

impl Ledger {
    /// Open (creating if needed) the ledger directory for `name`.
    pub fn open(state_dir: &Path, name: &str) -> Result<Self, StoreError> {
        let dir = state_dir.join(name);
        fs::create_dir_all(&dir)?;
        Ok(Self {
            name: name.to_string(),
            dir,
        })
    }

    /// Ledger name, used for logging and the liveness command.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Return the partition for `key`, creating or rotating as needed.
    ///
    /// If a file for `key` exists it is loaded as-is. Otherwise, if an older
    /// partition file exists, the most recent one is retitled to `key` and
    /// its rows cleared; with no prior file at all a fresh empty partition is
    /// written.
    #[instrument(level = "debug", skip(self), fields(ledger = %self.name))]
    pub fn ensure_partition(&self, key: &str) -> Result<Partition, StoreError> {
        let path = self.partition_path(key);
        if path.exists() {
            return self.read_partition(&path);
        }

        if let Some(latest) = self.latest_partition_key()? {
            let old_path = self.partition_path(&latest);
            fs::rename(&old_path, &path)?;
            let mut partition = self.read_partition(&path)?;
            partition.key = key.to_string();
            partition.rows.clear();
            partition.updated_at = None;
            self.flush(&partition)?;
            info!(
                ledger = %self.name,
                from = %latest,
                to = %key,
                "Rotated ledger partition to new day"
            );
            return Ok(partition);
        }

        let partition = Partition::empty(key);
        self.flush(&partition)?;
        info!(ledger = %self.name, %key, "Created ledger partition");
        Ok(partition)
    }

    /// Append `rows` whose links are not already present, then flush.
    ///
    /// The caller is expected to have filtered already; the re-check makes
    /// append idempotent per link within a partition.
    pub fn append_rows(
        &self,
        partition: &mut Partition,
        rows: Vec<LedgerRow>,
    ) -> Result<usize, StoreError> {
        let mut existing = partition.existing_links();
        let mut appended = 0usize;
        for row in rows {
            if existing.contains(&row.link) {
                debug!(ledger = %self.name, link = %row.link, "Skipping already-recorded row");
                continue;
            }
            existing.insert(row.link.clone());
            partition.rows.push(row);
            appended += 1;
        }
        if appended > 0 {
            self.flush(partition)?;
        }
        debug!(ledger = %self.name, key = %partition.key, appended, "Appended ledger rows");
        Ok(appended)
    }

    /// Overwrite the partition's last-refresh stamp and flush.
    pub fn touch_updated_marker(
        &self,
        partition: &mut Partition,
        ts: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let offset = FixedOffset::east_opt(LEDGER_UTC_OFFSET_HOURS * 3600)
            .expect("static offset is in range");
        let stamp = ts
            .with_timezone(&offset)
            .format("%d-%m-%Y %H:%M:%S")
            .to_string();
        partition.updated_at = Some(stamp);
        self.flush(partition)
    }

    fn partition_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    fn read_partition(&self, path: &Path) -> Result<Partition, StoreError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Most recent partition key among existing files, by calendar date.
    fn latest_partition_key(&self) -> Result<Option<String>, StoreError> {
        let mut latest: Option<(NaiveDate, String)> = None;
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            let name = entry.file_name();
            let Some(stem) = name.to_str().and_then(|n| n.strip_suffix(".json")) else {
                continue;
            };
            let Ok(date) = NaiveDate::parse_from_str(stem, PARTITION_KEY_FORMAT) else {
                continue;
            };
            if latest.as_ref().is_none_or(|(d, _)| date > *d) {
                latest = Some((date, stem.to_string()));
            }
        }
        Ok(latest.map(|(_, key)| key))
    }

    /// Temp-file-then-rename so the partition file never holds a half-written
    /// document.
    fn flush(&self, partition: &Partition) -> Result<(), StoreError> {
        let path = self.partition_path(&partition.key);
        let tmp = path.with_extension("json.tmp");
        let json = serde_json::to_string_pretty(partition)?;
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }
}
