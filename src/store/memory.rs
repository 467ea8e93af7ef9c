//! In-process observation store.

use crate::amazon::models::Observation;
use crate::error::StoreError;
use crate::store::ObservationStore;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Keeps observations in memory for the life of the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    observations: RwLock<HashMap<String, Vec<Observation>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of stored observations across all ASINs.
    pub async fn len(&self) -> usize {
        self.observations.read().await.values().map(Vec::len).sum()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl ObservationStore for MemoryStore {
    async fn append(&self, observation: &Observation) -> Result<(), StoreError> {
        self.observations
            .write()
            .await
            .entry(observation.asin.clone())
            .or_default()
            .push(observation.clone());
        Ok(())
    }

    async fn query(&self, asin: &str) -> Result<Vec<Observation>, StoreError> {
        let mut history =
            self.observations.read().await.get(asin).cloned().unwrap_or_default();
        // Stable sort keeps insertion order for equal timestamps.
        history.sort_by_key(|o| o.captured_at);
        Ok(history)
    }
}
