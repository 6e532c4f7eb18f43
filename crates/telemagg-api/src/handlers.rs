//! REST API handlers.
//!
//! Each handler loads the current snapshot once and answers from that
//! reference, so a response never mixes two snapshots.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::json;

use crate::ApiState;

/// Body of a single-metric lookup.
#[derive(Debug, Serialize)]
struct MetricResponse<'a> {
    entity_id: &'a str,
    metric: &'a str,
    value: String,
}

// ── Snapshot reads ─────────────────────────────────────────────

/// GET /metrics/all
pub async fn list_all(State(state): State<ApiState>) -> Response {
    match state.list_all() {
        Ok(snapshot) => Json(&*snapshot).into_response(),
        Err(e) => e.into_response(),
    }
}

/// GET /metrics/{entity_id}
pub async fn get_entity(
    State(state): State<ApiState>,
    Path(entity_id): Path<String>,
) -> Response {
    match state.get_entity(&entity_id) {
        Ok(metrics) => Json(metrics).into_response(),
        Err(e) => e.into_response(),
    }
}

/// GET /metrics/{entity_id}/{metric_name}
pub async fn get_metric(
    State(state): State<ApiState>,
    Path((entity_id, metric_name)): Path<(String, String)>,
) -> Response {
    match state.get_metric(&entity_id, &metric_name) {
        Ok(value) => Json(MetricResponse {
            entity_id: &entity_id,
            metric: &metric_name,
            value,
        })
        .into_response(),
        Err(e) => e.into_response(),
    }
}

// ── Health ─────────────────────────────────────────────────────

/// GET /health
pub async fn health(State(state): State<ApiState>) -> Response {
    if state.is_ready() {
        (
            StatusCode::OK,
            Json(json!({
                "status": "ready",
                "generation": state.store.generation(),
                "published_at_ms": state.store.published_at_ms(),
            })),
        )
            .into_response()
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "initializing" })),
        )
            .into_response()
    }
}

// ── Prometheus ─────────────────────────────────────────────────

/// GET /metrics-exposition
pub async fn metrics_exposition(State(state): State<ApiState>) -> impl IntoResponse {
    let body = telemagg_metrics::render_prometheus(&state.metrics.snapshot());
    (
        StatusCode::OK,
        [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
        body,
    )
}
