//! Time-bounded history of links already delivered to a channel.
//!
//! The history exists because the ledger's current partition is cleared on
//! rotation: without a second, multi-day record, the first cycle of a new
//! day would re-deliver everything still on the source's front page. Entries
//! older than the retention window are evicted lazily at load time; there is
//! no background sweep.
//!
//! `mark_sent` persists synchronously before the caller moves to the next
//! article. A crash between a successful send and its `mark_sent` therefore
//! re-delivers at most that one article on the next cycle (at-least-once
//! across crashes, accepted trade-off).

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info};

use crate::error::StoreError;

/// How long a delivered link is remembered.
const RETENTION_HOURS: i64 = 72;

/// Durable mapping from delivered link to last-sent timestamp.
#[derive(Debug)]
pub struct NotificationHistory {
    path: PathBuf,
    entries: HashMap<String, DateTime<Utc>>,
}

impl NotificationHistory {
    /// Load the history file, evicting entries older than the retention
    /// window. A missing file yields an empty history (cold start).
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        Self::load_at(path, Utc::now())
    }

    fn load_at(path: &Path, now: DateTime<Utc>) -> Result<Self, StoreError> {
        let entries = if path.exists() {
            let raw = fs::read_to_string(path)?;
            let stored: HashMap<String, DateTime<Utc>> = serde_json::from_str(&raw)?;
            let before = stored.len();
            let cutoff = now - Duration::hours(RETENTION_HOURS);
            let entries: HashMap<_, _> = stored
                .into_iter()
                .filter(|(_, sent_at)| *sent_at >= cutoff)
                .collect();
            if entries.len() < before {
                debug!(
                    evicted = before - entries.len(),
                    retained = entries.len(),
                    "Evicted expired notification history entries"
                );
            }
            entries
        } else {
            HashMap::new()
        };
        info!(path = %path.display(), entries = entries.len(), "Loaded notification history");
        Ok(Self {
            path: path.to_path_buf(),
            entries,
        })
    }

    /// Links currently remembered as delivered.
    pub fn links(&self) -> HashSet<String> {
        self.entries.keys().cloned().collect()
    }

    /// Record a successful delivery and flush to disk before returning.
    pub fn mark_sent(&mut self, link: &str, sent_at: DateTime<Utc>) -> Result<(), StoreError> {
        self.entries.insert(link.to_string(), sent_at);
        self.save()
    }

    fn save(&self) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(&self.entries)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    #[cfg(test)]
    fn contains(&self, link: &str) -> bool {
        self.entries.contains_key(link)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_cold_start_is_empty() {
        let dir = TempDir::new().unwrap();
        let history = NotificationHistory::load(&dir.path().join("history.json")).unwrap();
        assert!(history.links().is_empty());
    }

    #[test]
    fn test_mark_sent_roundtrips() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("history.json");
        let sent_at = Utc::now();

        let mut history = NotificationHistory::load(&path).unwrap();
        history.mark_sent("http://a/1", sent_at).unwrap();

        let reloaded = NotificationHistory::load(&path).unwrap();
        assert!(reloaded.contains("http://a/1"));
        assert_eq!(reloaded.entries["http://a/1"], sent_at);
    }

    #[test]
    fn test_retention_window_evicts_on_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("history.json");
        let now = Utc::now();

        let mut history = NotificationHistory::load(&path).unwrap();
        history
            .mark_sent("http://a/old", now - Duration::hours(RETENTION_HOURS + 1))
            .unwrap();
        history
            .mark_sent("http://a/fresh", now - Duration::hours(1))
            .unwrap();

        let reloaded = NotificationHistory::load_at(&path, now).unwrap();
        assert!(!reloaded.contains("http://a/old"));
        assert!(reloaded.contains("http://a/fresh"));
    }

    #[test]
    fn test_mark_sent_upserts_timestamp() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("history.json");
        let mut history = NotificationHistory::load(&path).unwrap();

        let first = Utc::now() - Duration::hours(2);
        let second = Utc::now();
        history.mark_sent("http://a/1", first).unwrap();
        history.mark_sent("http://a/1", second).unwrap();

        assert_eq!(history.entries.len(), 1);
        assert_eq!(history.entries["http://a/1"], second);
    }
}
