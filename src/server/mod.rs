//! HTTP service exposing batch tracking and history lookups.

pub mod handlers;

use crate::amazon::client::ProductFetcher;
use crate::store::ObservationStore;
use crate::tracker::Tracker;
use anyhow::{Context, Result};
use axum::routing::{get, post};
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Builds the API router around a shared tracker.
pub fn router<F, S>(tracker: Arc<Tracker<F, S>>) -> Router
where
    F: ProductFetcher + 'static,
    S: ObservationStore + 'static,
{
    Router::new()
        .route("/healthz", get(handlers::healthz))
        .route("/track_asin", post(handlers::track_asins::<F, S>))
        .route("/get_data/{asin}", get(handlers::get_history::<F, S>))
        .with_state(tracker)
}

/// Binds `bind` and serves until `shutdown` is cancelled.
pub async fn serve<F, S>(
    tracker: Arc<Tracker<F, S>>,
    bind: &str,
    shutdown: CancellationToken,
) -> Result<()>
where
    F: ProductFetcher + 'static,
    S: ObservationStore + 'static,
{
    let addr: SocketAddr = bind.parse().with_context(|| format!("Invalid bind address {}", bind))?;
    let listener =
        TcpListener::bind(addr).await.with_context(|| format!("Failed to bind {}", addr))?;

    serve_on(listener, tracker, shutdown).await
}

/// Serves on an already bound listener until `shutdown` is cancelled.
pub async fn serve_on<F, S>(
    listener: TcpListener,
    tracker: Arc<Tracker<F, S>>,
    shutdown: CancellationToken,
) -> Result<()>
where
    F: ProductFetcher + 'static,
    S: ObservationStore + 'static,
{
    info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router(tracker))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .context("Server error")?;

    info!("Server stopped");
    Ok(())
}
