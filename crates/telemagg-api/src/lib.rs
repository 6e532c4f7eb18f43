//! telemagg-api — read-only HTTP API over the snapshot store.
//!
//! Handlers only ever load the current snapshot reference; they never wait
//! on ingestion and share no lock with the worker.
//!
//! # API Routes
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | GET | `/metrics/all` | Full snapshot (503 before first ingest) |
//! | GET | `/metrics/{entity_id}` | One entity's metrics |
//! | GET | `/metrics/{entity_id}/{metric_name}` | One metric value |
//! | GET | `/health` | 503 until the first ingest, then 200 |
//! | GET | `/metrics-exposition` | Prometheus exposition |

pub mod error;
pub mod handlers;

use axum::Router;
use axum::routing::get;
use tower_http::LatencyUnit;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use telemagg_core::{EntityMetrics, MetricValue, SnapshotRef};
use telemagg_metrics::IngestionMetrics;
use telemagg_store::SnapshotStore;

pub use error::ApiError;

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    pub store: SnapshotStore,
    pub metrics: IngestionMetrics,
}

impl ApiState {
    pub fn new(store: SnapshotStore, metrics: IngestionMetrics) -> Self {
        Self { store, metrics }
    }

    /// The full current snapshot.
    pub fn list_all(&self) -> Result<SnapshotRef, ApiError> {
        Ok(self.store.read()?)
    }

    pub fn get_entity(&self, id: &str) -> Result<EntityMetrics, ApiError> {
        let snapshot = self.store.read()?;
        snapshot
            .entity(id)
            .cloned()
            .ok_or_else(|| ApiError::EntityNotFound(id.to_string()))
    }

    pub fn get_metric(&self, id: &str, metric: &str) -> Result<MetricValue, ApiError> {
        let snapshot = self.store.read()?;
        if let Some(value) = snapshot.metric(id, metric) {
            return Ok(value.clone());
        }
        match snapshot.metric_names(id) {
            Some(valid_metrics) => Err(ApiError::MetricNotFound {
                entity_id: id.to_string(),
                metric: metric.to_string(),
                valid_metrics,
            }),
            None => Err(ApiError::EntityNotFound(id.to_string())),
        }
    }

    pub fn is_ready(&self) -> bool {
        self.metrics.is_ready()
    }
}

/// Build the complete API router.
pub fn build_router(state: ApiState) -> Router {
    Router::new()
        .route("/metrics/all", get(handlers::list_all))
        .route("/metrics/{entity_id}", get(handlers::get_entity))
        .route("/metrics/{entity_id}/{metric_name}", get(handlers::get_metric))
        .route("/health", get(handlers::health))
        .route("/metrics-exposition", get(handlers::metrics_exposition))
        .with_state(state)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(
                    DefaultOnResponse::new()
                        .level(Level::INFO)
                        .latency_unit(LatencyUnit::Micros),
                ),
        )
}
