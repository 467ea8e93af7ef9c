//! asin-tracker - Amazon listing tracker with an append-only observation history
//!
//! Fetches product pages with TLS fingerprint emulation, extracts title, price,
//! rating and review count, and records each capture so its history can be
//! queried later from the CLI or the HTTP service.

pub mod amazon;
pub mod config;
pub mod error;
pub mod format;
pub mod server;
pub mod store;
pub mod tracker;

pub use amazon::models::{Field, Observation, NOT_AVAILABLE};
pub use amazon::regions::Region;
pub use config::Config;
pub use error::{HistoryError, TrackError};
pub use store::{MemoryStore, ObservationStore, SqliteStore};
pub use tracker::{BatchResult, FieldPolicy, TrackOutcome, Tracker};
