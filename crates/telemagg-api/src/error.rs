//! API error shapes.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

use telemagg_store::StoreError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("data unavailable; waiting for initial ingestion")]
    Unavailable,

    #[error("entity '{0}' not found")]
    EntityNotFound(String),

    #[error("metric '{metric}' not found for entity '{entity_id}'; valid metrics are: {}", .valid_metrics.join(", "))]
    MetricNotFound {
        entity_id: String,
        metric: String,
        valid_metrics: Vec<String>,
    },
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::EntityNotFound(_) | ApiError::MetricNotFound { .. } => StatusCode::NOT_FOUND,
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Unavailable => ApiError::Unavailable,
        }
    }
}

/// Error body for every non-2xx response.
#[derive(Debug, Serialize)]
struct ErrorBody {
    success: bool,
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    valid_metrics: Option<Vec<String>>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error = self.to_string();
        let valid_metrics = match self {
            ApiError::MetricNotFound { valid_metrics, .. } => Some(valid_metrics),
            _ => None,
        };
        (
            status,
            Json(ErrorBody {
                success: false,
                error,
                valid_metrics,
            }),
        )
            .into_response()
    }
}
