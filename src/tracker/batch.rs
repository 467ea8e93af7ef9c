//! Batch coordination: one pipeline pass per identifier, failures isolated.

use crate::amazon::client::ProductFetcher;
use crate::amazon::extractor::Extractor;
use crate::amazon::models::Observation;
use crate::error::TrackError;
use crate::store::ObservationStore;
use crate::tracker::normalizer::normalize;
use crate::tracker::policy::FieldPolicy;
use crate::tracker::Tracker;
use chrono::Utc;
use serde::ser::{Serialize, Serializer};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// The outcome for one submitted identifier.
#[derive(Debug)]
pub struct TrackOutcome {
    pub asin: String,
    pub result: Result<Observation, TrackError>,
}

impl TrackOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    pub fn observation(&self) -> Option<&Observation> {
        self.result.as_ref().ok()
    }

    pub fn error(&self) -> Option<&TrackError> {
        self.result.as_ref().err()
    }
}

/// Outcomes for a whole batch, in submission order, one per identifier.
#[derive(Debug, Default)]
pub struct BatchResult {
    pub outcomes: Vec<TrackOutcome>,
}

impl BatchResult {
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.len() - self.succeeded()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TrackOutcome> {
        self.outcomes.iter()
    }

    /// Successful observations, in submission order.
    pub fn observations(&self) -> impl Iterator<Item = &Observation> {
        self.outcomes.iter().filter_map(TrackOutcome::observation)
    }
}

impl<'a> IntoIterator for &'a BatchResult {
    type Item = &'a TrackOutcome;
    type IntoIter = std::slice::Iter<'a, TrackOutcome>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[derive(serde::Serialize)]
struct ErrorView<'a> {
    kind: &'a str,
    message: String,
}

#[derive(serde::Serialize)]
struct OutcomeView<'a> {
    asin: &'a str,
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    observation: Option<&'a Observation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<ErrorView<'a>>,
}

impl Serialize for TrackOutcome {
    fn serialize<Ser: Serializer>(&self, serializer: Ser) -> Result<Ser::Ok, Ser::Error> {
        OutcomeView {
            asin: &self.asin,
            success: self.is_success(),
            observation: self.observation(),
            error: self.error().map(|e| ErrorView { kind: e.kind(), message: e.to_string() }),
        }
        .serialize(serializer)
    }
}

#[derive(serde::Serialize)]
struct BatchView<'a> {
    requested: usize,
    succeeded: usize,
    failed: usize,
    results: &'a [TrackOutcome],
}

impl Serialize for BatchResult {
    fn serialize<Ser: Serializer>(&self, serializer: Ser) -> Result<Ser::Ok, Ser::Error> {
        BatchView {
            requested: self.len(),
            succeeded: self.succeeded(),
            failed: self.failed(),
            results: &self.outcomes,
        }
        .serialize(serializer)
    }
}

/// Everything one identifier's pipeline pass needs, owned so it can run on
/// its own task.
struct Pass<F, S> {
    fetcher: Arc<F>,
    store: Arc<S>,
    extractor: Extractor,
    policy: FieldPolicy,
}

impl<F: ProductFetcher, S: ObservationStore> Pass<F, S> {
    async fn run(&self, asin: &str) -> Result<Observation, TrackError> {
        let page = self.fetcher.fetch(asin).await?;
        debug!("Fetched {} ({} bytes, status {})", asin, page.body.len(), page.status);

        let fields = self.extractor.extract(&page)?;
        self.policy.check(&fields)?;

        let observation = normalize(asin, fields, Utc::now());
        self.store.append(&observation).await?;

        Ok(observation)
    }
}

impl<F, S> Tracker<F, S>
where
    F: ProductFetcher + 'static,
    S: ObservationStore + 'static,
{
    /// Tracks every identifier in `asins` and returns one outcome per input.
    pub async fn track_batch(&self, asins: &[String]) -> BatchResult {
        self.track_batch_until(asins, CancellationToken::new()).await
    }

    /// Like [`Tracker::track_batch`], but stops starting new fetches once
    /// `cancel` fires.
    ///
    /// Identifiers that never started are reported as
    /// [`TrackError::Cancelled`]. Observations already appended are kept.
    pub async fn track_batch_until(
        &self,
        asins: &[String],
        cancel: CancellationToken,
    ) -> BatchResult {
        info!("Tracking {} ASINs (concurrency {})", asins.len(), self.concurrency);

        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks = JoinSet::new();

        for (index, asin) in asins.iter().enumerate() {
            let asin = asin.trim().to_string();
            let pass = Pass {
                fetcher: Arc::clone(&self.fetcher),
                store: Arc::clone(&self.store),
                extractor: self.extractor,
                policy: self.policy.clone(),
            };
            let semaphore = Arc::clone(&semaphore);
            let cancel = cancel.clone();

            tasks.spawn(async move {
                let result = if asin.is_empty() {
                    Err(TrackError::EmptyIdentifier)
                } else {
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => Err(TrackError::Cancelled),
                        permit = semaphore.acquire_owned() => match permit {
                            Ok(_permit) if !cancel.is_cancelled() => pass.run(&asin).await,
                            _ => Err(TrackError::Cancelled),
                        },
                    }
                };

                match &result {
                    Ok(obs) => info!("Tracked {}: {} ({})", asin, obs.title, obs.price),
                    Err(TrackError::Cancelled) => debug!("Skipped {}: batch cancelled", asin),
                    Err(e) => warn!("Failed to track {}: {}", asin, e),
                }

                (index, TrackOutcome { asin, result })
            });
        }

        let mut slots: Vec<Option<TrackOutcome>> =
            std::iter::repeat_with(|| None).take(asins.len()).collect();

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, outcome)) => slots[index] = Some(outcome),
                Err(e) => warn!("Tracking task did not complete: {}", e),
            }
        }

        let outcomes = slots
            .into_iter()
            .zip(asins)
            .map(|(slot, asin)| {
                slot.unwrap_or_else(|| TrackOutcome {
                    asin: asin.trim().to_string(),
                    result: Err(TrackError::Internal("task aborted".to_string())),
                })
            })
            .collect();

        let batch = BatchResult { outcomes };
        info!("Batch complete: {} succeeded, {} failed", batch.succeeded(), batch.failed());
        batch
    }
}
