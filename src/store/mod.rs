//! Append-only persistence for observations.

pub mod memory;
pub mod sqlite;

use crate::amazon::models::Observation;
use crate::error::StoreError;
use async_trait::async_trait;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Storage for observations, keyed by ASIN.
///
/// Appends are additive: an observation is never updated or replaced, and a
/// query returns every observation recorded for the ASIN, oldest first.
#[async_trait]
pub trait ObservationStore: Send + Sync {
    /// Records a new observation.
    async fn append(&self, observation: &Observation) -> Result<(), StoreError>;

    /// Returns all observations for `asin` ordered by capture time ascending.
    async fn query(&self, asin: &str) -> Result<Vec<Observation>, StoreError>;
}
