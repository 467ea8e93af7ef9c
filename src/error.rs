//! Typed errors for each stage of the tracking pipeline.

use crate::amazon::models::Field;
use thiserror::Error;

/// The product page could not be retrieved.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Rate limited by Amazon (503). Try increasing --delay or using a proxy.")]
    RateLimited,

    #[error("Request failed with status: {0}")]
    Status(u16),

    #[error("Request blocked: {0}")]
    Blocked(&'static str),

    #[error("Network error: {0}")]
    Network(#[from] wreq::Error),
}

/// The page body could not be interpreted as markup at all.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Page could not be parsed as markup: {0}")]
    Unparsable(&'static str),
}

/// Failure at the persistence boundary.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Invalid timestamp in store: {0}")]
    Timestamp(#[from] chrono::ParseError),

    #[error("Store task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("Store connection lock poisoned")]
    Poisoned,

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Why a single identifier in a batch produced no observation.
#[derive(Debug, Error)]
pub enum TrackError {
    #[error("Identifier must not be empty")]
    EmptyIdentifier,

    #[error(transparent)]
    Transport(#[from] FetchError),

    #[error(transparent)]
    Parse(#[from] ExtractError),

    #[error("Required field missing from page: {0}")]
    MissingRequiredField(Field),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Batch cancelled before this identifier was fetched")]
    Cancelled,

    #[error("Pipeline task did not complete: {0}")]
    Internal(String),
}

impl TrackError {
    /// Stable machine-readable name of the failure class.
    pub fn kind(&self) -> &'static str {
        match self {
            TrackError::EmptyIdentifier => "empty_identifier",
            TrackError::Transport(_) => "transport",
            TrackError::Parse(_) => "parse",
            TrackError::MissingRequiredField(_) => "missing_required_field",
            TrackError::Store(_) => "store",
            TrackError::Cancelled => "cancelled",
            TrackError::Internal(_) => "internal",
        }
    }
}

/// Failure to answer a history query.
#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("No data found for ASIN {0}")]
    NotFound(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Startup configuration that prevents the tracker from running.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(
        "No store configured. Pass --db, set ASIN_TRACKER_DB, or add `store` to config.toml."
    )]
    MissingStoreTarget,
}
