//! Error taxonomy for the pipeline.
//!
//! Each error type maps to one recovery policy:
//! - [`ConfigError`]: fatal at startup, the process never reaches scheduling.
//! - [`StoreError`]: aborts the current cycle's persistence step; the process
//!   continues to the next scheduled tick.
//! - [`DeliveryError`]: recovered per-article; a failed send never aborts the
//!   batch and the article is simply not marked sent.
//!
//! Fetch failures have no type here: the fetch adapter swallows them and
//! yields an empty batch (see `scrapers`).

use thiserror::Error;

/// Fatal configuration problem detected at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// The ledger or history durable store could not complete an operation.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("store state is corrupt or unreadable: {0}")]
    Serde(#[from] serde_json::Error),
}

/// A single notification send failed.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("request to notification sink failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("notification sink rejected the message ({status}): {description}")]
    Rejected { status: u16, description: String },
}
