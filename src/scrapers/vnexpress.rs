//! VnExpress listing parser.
//!
//! Section pages (e.g. `https://vnexpress.net/thoi-su`) list stories as
//! `article.item-news` cards with a `.title-news a` headline anchor and a
//! `.description a` teaser. The headline anchor's `href` is the canonical
//! article URL.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use tracing::debug;
use url::Url;

use super::resolve_link;
use crate::models::Article;

static ITEM: Lazy<Selector> =
    Lazy::new(|| Selector::parse("article.item-news").expect("static selector"));
static TITLE: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".title-news a").expect("static selector"));
static DESCRIPTION: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".description a").expect("static selector"));

/// Keep batches to the first page of listings.
const MAX_ITEMS: usize = 40;

/// Extract articles from a section page, in page order.
pub fn parse_listing(html: &str, base: &Url, observed_at: DateTime<Utc>) -> Vec<Article> {
    let document = Html::parse_document(html);
    let mut articles = Vec::new();

    for item in document.select(&ITEM).take(MAX_ITEMS) {
        let Some(anchor) = item.select(&TITLE).next() else {
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
            .select(&DESCRIPTION)
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

    debug!(count = articles.len(), "Parsed VnExpress listing");
    articles
}
