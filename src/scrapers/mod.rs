//! Fetch adapters for news listing pages.
//!
//! A fetch adapter turns a source URL into an ordered batch of
//! `(title, summary, link)` articles. Errors never escape this boundary:
//! any network or parse failure is logged and yields an empty batch, which
//! the pipeline treats as a valid "nothing new this cycle" outcome.
//!
//! # Dispatch
//!
//! [`vnexpress`] knows the markup of the deployment's primary source;
//! [`generic`] is a best-effort fallback for any other host, scanning
//! headline anchors inside `article` elements.

pub mod generic;
pub mod vnexpress;

use chrono::Utc;
use tracing::{info, instrument, warn};
use url::Url;

use crate::models::Article;

/// Fetch and parse one listing page.
///
/// Never fails: an unreachable or unparseable page yields an empty batch.
#[instrument(level = "info", skip_all, fields(%source_url))]
pub async fn fetch_batch(source_url: &str) -> Vec<Article> {
    let base = match Url::parse(source_url) {
        Ok(base) => base,
        Err(e) => {
            // Config validation should have caught this; treat as empty page.
            warn!(error = %e, "Source URL failed to parse");
            return Vec::new();
        }
    };

    let html = match fetch_page(source_url).await {
        Ok(html) => html,
        Err(e) => {
            warn!(error = %e, "Fetch failed; proceeding with empty batch");
            return Vec::new();
        }
    };

    let observed_at = Utc::now();
    let host = base.host_str().unwrap_or_default();
    let batch = if host.contains("vnexpress") {
        vnexpress::parse_listing(&html, &base, observed_at)
    } else {
        generic::parse_listing(&html, &base, observed_at)
    };

    info!(count = batch.len(), "Scraped listing page");
    batch
}

async fn fetch_page(url: &str) -> Result<String, reqwest::Error> {
    let response = reqwest::get(url).await?.error_for_status()?;
    response.text().await
}

/// Resolve `href` against the listing page, dropping anchors that do not
/// resolve or point at fragments.
pub(crate) fn resolve_link(base: &Url, href: &str) -> Option<String> {
    if href.is_empty() || href.starts_with('#') {
        return None;
    }
    base.join(href).ok().map(|url| url.to_string())
}
