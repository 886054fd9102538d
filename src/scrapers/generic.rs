//! Fallback listing parser for hosts without a dedicated adapter.
//!
//! Scans `article` elements for their first headline anchor (`h1`-`h3`) and
//! takes the first paragraph as the summary. Noisy on some sites, but the
//! dedup stage downstream makes over-collection harmless.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use tracing::debug;
use url::Url;

use super::resolve_link;
use crate::models::Article;

static ITEM: Lazy<Selector> = Lazy::new(|| Selector::parse("article").expect("static selector"));
static HEADLINE: Lazy<Selector> =
    Lazy::new(|| Selector::parse("h1 a[href], h2 a[href], h3 a[href]").expect("static selector"));
static PARAGRAPH: Lazy<Selector> = Lazy::new(|| Selector::parse("p").expect("static selector"));

const MAX_ITEMS: usize = 40;

/// Extract articles from an arbitrary listing page, in page order.
pub fn parse_listing(html: &str, base: &Url, observed_at: DateTime<Utc>) -> Vec<Article> {
    let document = Html::parse_document(html);
    let mut articles = Vec::new();

    for item in document.select(&ITEM).take(MAX_ITEMS) {
        let Some(anchor) = item.select(&HEADLINE).next() else {
            continue;
        };
        let title = anchor.text().collect::<Vec<_>>().join(" ").trim().to_string();
        let Some(link) = anchor
            .value()
            .attr("href")
            .and_then(|href| resolve_link(base, href))
        else {
            continue;
        };
        if title.is_empty() {
            continue;
        }

        let summary = item
            .select(&PARAGRAPH)
            .next()
            .map(|el| el.text().collect::<Vec<_>>().join(" ").trim().to_string())
            .unwrap_or_default();

        articles.push(Article {
            title,
            summary,
            link,
            observed_at,
        });
    }

    debug!(count = articles.len(), "Parsed listing with generic adapter");
    articles
}
