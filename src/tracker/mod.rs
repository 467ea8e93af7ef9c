//! The tracking pipeline: fetch, extract, normalize, persist, and read back.

pub mod batch;
pub mod normalizer;
pub mod policy;

use crate::amazon::client::ProductFetcher;
use crate::amazon::extractor::Extractor;
use crate::amazon::models::Observation;
use crate::error::HistoryError;
use crate::store::ObservationStore;
use std::sync::Arc;
use tracing::debug;

pub use batch::{BatchResult, TrackOutcome};
pub use normalizer::normalize;
pub use policy::FieldPolicy;

/// Default number of identifiers processed at once within a batch.
pub const DEFAULT_CONCURRENCY: usize = 4;

/// Coordinates the fetcher and the store for batch tracking and history lookups.
///
/// The fetcher and store are held behind `Arc` so a single tracker, created
/// at startup, can serve every request for the life of the process.
pub struct Tracker<F, S> {
    fetcher: Arc<F>,
    store: Arc<S>,
    extractor: Extractor,
    policy: FieldPolicy,
    concurrency: usize,
}

impl<F, S> Tracker<F, S>
where
    F: ProductFetcher + 'static,
    S: ObservationStore + 'static,
{
    /// Creates a tracker with the default field policy and concurrency.
    pub fn new(fetcher: F, store: S) -> Self {
        Self::from_shared(Arc::new(fetcher), Arc::new(store))
    }

    /// Creates a tracker around an already shared fetcher and store.
    pub fn from_shared(fetcher: Arc<F>, store: Arc<S>) -> Self {
        Self {
            fetcher,
            store,
            extractor: Extractor::new(),
            policy: FieldPolicy::default(),
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    /// Sets the required-field policy.
    pub fn with_policy(mut self, policy: FieldPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Sets how many identifiers may be in flight at once (at least 1).
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn policy(&self) -> &FieldPolicy {
        &self.policy
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Returns every observation for `asin`, oldest first.
    ///
    /// An identifier with no stored observations, whether never submitted or
    /// only ever failed, is reported as [`HistoryError::NotFound`].
    pub async fn history(&self, asin: &str) -> Result<Vec<Observation>, HistoryError> {
        let asin = asin.trim();
        let history = self.store.query(asin).await?;
        debug!("History for {}: {} observations", asin, history.len());

        if history.is_empty() {
            return Err(HistoryError::NotFound(asin.to_string()));
        }

        Ok(history)
    }
}
