//! Core data types shared across the pipeline.
//!
//! - [`Article`]: one raw item scraped from a news listing. The link is the
//!   sole identity key; title and summary may drift between scrapes of the
//!   same link without affecting identity.
//! - [`LedgerRow`]: the fixed 4-column row schema persisted in a ledger
//!   partition (`Title`, `Summary`, `Link`, `UpdatedTime`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A raw article as scraped from a news source listing.
///
/// Created once per fetch cycle and discarded after processing; anything
/// worth keeping lands in the ledger or the notification history.
#[derive(Debug, Clone)]
pub struct Article {
    /// Headline text.
    pub title: String,
    /// Short teaser/summary text; may be empty for sources without one.
    pub summary: String,
    /// Canonical article URL. The identity key for deduplication.
    pub link: String,
    /// When this scrape observed the article.
    pub observed_at: DateTime<Utc>,
}

impl Article {
    /// The message body sent to the notification channel.
    pub fn to_message(&self) -> String {
        if self.summary.is_empty() {
            format!("{}\n{}", self.title, self.link)
        } else {
            format!("{}\n{}\n{}", self.title, self.summary, self.link)
        }
    }
}

/// One recorded row in a ledger partition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerRow {
    pub title: String,
    pub summary: String,
    pub link: String,
    /// RFC 3339 timestamp of the scrape that observed this row.
    pub updated_time: String,
}

impl LedgerRow {
    /// Build a row from a scraped article, stamped with its observation time.
    pub fn from_article(article: &Article) -> Self {
        Self {
            title: article.title.clone(),
            summary: article.summary.clone(),
            link: article.link.clone(),
            updated_time: article.observed_at.to_rfc3339(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article(title: &str, summary: &str, link: &str) -> Article {
        Article {
            title: title.to_string(),
            summary: summary.to_string(),
            link: link.to_string(),
            observed_at: Utc::now(),
        }
    }

    #[test]
    fn test_message_includes_all_fields() {
        let a = article("T1", "S1", "http://a/1");
        assert_eq!(a.to_message(), "T1\nS1\nhttp://a/1");
    }

    #[test]
    fn test_message_skips_empty_summary() {
        let a = article("T1", "", "http://a/1");
        assert_eq!(a.to_message(), "T1\nhttp://a/1");
    }

    #[test]
    fn test_ledger_row_from_article() {
        let a = article("T1", "S1", "http://a/1");
        let row = LedgerRow::from_article(&a);
        assert_eq!(row.title, "T1");
        assert_eq!(row.link, "http://a/1");
        assert_eq!(row.updated_time, a.observed_at.to_rfc3339());
    }

    #[test]
    fn test_ledger_row_roundtrip() {
        let row = LedgerRow {
            title: "T".to_string(),
            summary: "S".to_string(),
            link: "http://a/1".to_string(),
            updated_time: "2025-05-06T08:00:00+00:00".to_string(),
        };
        let json = serde_json::to_string(&row).unwrap();
        let back: LedgerRow = serde_json::from_str(&json).unwrap();
        assert_eq!(back.link, row.link);
        assert_eq!(back.updated_time, row.updated_time);
    }
}
