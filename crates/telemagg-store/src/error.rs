//! Error types for the snapshot store.

use thiserror::Error;

/// Result type alias for store reads.
pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("no snapshot published yet; waiting for initial ingestion")]
    Unavailable,
}
