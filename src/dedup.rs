//! Classification of a scraped batch into genuinely-new articles.
//!
//! An article is NEW only when its link is absent from **both** the current
//! ledger partition and the notification history. The double check matters
//! on the first cycle after a partition rotation: the fresh partition knows
//! nothing, but the history still remembers the last three days of sends.
//!
//! This is a pure filter. Persisting anything is the caller's job.

use std::collections::HashSet;

use itertools::Itertools;
use tracing::debug;

use crate::models::Article;

/// Return the articles whose links are unseen by both stores, preserving
/// batch order. Duplicate links within the batch itself collapse to their
/// first occurrence.
pub fn classify(
    batch: Vec<Article>,
    ledger_links: &HashSet<String>,
    history_links: &HashSet<String>,
) -> Vec<Article> {
    let total = batch.len();
    let fresh: Vec<Article> = batch
        .into_iter()
        .unique_by(|article| article.link.clone())
        .filter(|article| {
            !ledger_links.contains(&article.link) && !history_links.contains(&article.link)
        })
        .collect();
    debug!(total, fresh = fresh.len(), "Classified scraped batch");
    fresh
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn article(link: &str) -> Article {
        Article {
            title: format!("title {link}"),
            summary: String::new(),
            link: link.to_string(),
            observed_at: Utc::now(),
        }
    }

    fn links(items: &[&str]) -> HashSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_all_new_when_both_stores_empty() {
        let batch = vec![article("http://a/1"), article("http://a/2")];
        let fresh = classify(batch, &HashSet::new(), &HashSet::new());
        assert_eq!(fresh.len(), 2);
    }

    #[test]
    fn test_link_in_ledger_is_seen() {
        let batch = vec![article("http://a/1"), article("http://a/2")];
        let fresh = classify(batch, &links(&["http://a/1"]), &HashSet::new());
        assert_eq!(fresh.len(), 1);
        assert_eq!(fresh[0].link, "http://a/2");
    }

    #[test]
    fn test_link_in_history_is_seen_even_after_rotation() {
        // Rotated partition: ledger empty, history still remembers.
        let batch = vec![article("http://a/1")];
        let fresh = classify(batch, &HashSet::new(), &links(&["http://a/1"]));
        assert!(fresh.is_empty());
    }

    #[test]
    fn test_order_matches_fetch_order() {
        let batch = vec![
            article("http://a/3"),
            article("http://a/1"),
            article("http://a/2"),
        ];
        let fresh = classify(batch, &HashSet::new(), &HashSet::new());
        let order: Vec<&str> = fresh.iter().map(|a| a.link.as_str()).collect();
        assert_eq!(order, vec!["http://a/3", "http://a/1", "http://a/2"]);
    }

    #[test]
    fn test_in_batch_duplicates_collapse_to_first() {
        let mut first = article("http://a/1");
        first.title = "first".to_string();
        let mut second = article("http://a/1");
        second.title = "second".to_string();

        let fresh = classify(vec![first, second], &HashSet::new(), &HashSet::new());
        assert_eq!(fresh.len(), 1);
        assert_eq!(fresh[0].title, "first");
    }
}
