//! Request handlers for the tracking API.

use crate::amazon::client::ProductFetcher;
use crate::amazon::models::Observation;
use crate::error::HistoryError;
use crate::store::ObservationStore;
use crate::tracker::{BatchResult, Tracker};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};

/// Body of a batch submission.
#[derive(Debug, Deserialize)]
pub struct TrackRequest {
    pub asins: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub message: String,
}

pub type ApiError = (StatusCode, Json<ErrorBody>);

pub async fn healthz() -> StatusCode {
    StatusCode::OK
}

/// `POST /track_asin`: tracks a batch and returns one result per identifier.
pub async fn track_asins<F, S>(
    State(tracker): State<Arc<Tracker<F, S>>>,
    Json(request): Json<TrackRequest>,
) -> Json<BatchResult>
where
    F: ProductFetcher + 'static,
    S: ObservationStore + 'static,
{
    info!("Batch submitted: {} ASINs", request.asins.len());
    Json(tracker.track_batch(&request.asins).await)
}

/// `GET /get_data/{asin}`: full observation history, oldest first.
pub async fn get_history<F, S>(
    State(tracker): State<Arc<Tracker<F, S>>>,
    Path(asin): Path<String>,
) -> Result<Json<Vec<Observation>>, ApiError>
where
    F: ProductFetcher + 'static,
    S: ObservationStore + 'static,
{
    match tracker.history(&asin).await {
        Ok(history) => Ok(Json(history)),
        Err(HistoryError::NotFound(_)) => {
            Err(api_error(StatusCode::NOT_FOUND, "No data found for this ASIN"))
        }
        Err(HistoryError::Store(e)) => {
            error!("History query for {} failed: {}", asin, e);
            Err(api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
        }
    }
}

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (status, Json(ErrorBody { message: message.into() }))
}
