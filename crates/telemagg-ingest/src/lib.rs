//! telemagg-ingest — the writer side of telemagg.
//!
//! Drives one ingestion cycle per interval: fetch the upstream payload,
//! parse and validate it into a snapshot, and publish it to the
//! [`SnapshotStore`](telemagg_store::SnapshotStore).
//!
//! # Architecture
//!
//! ```text
//! IngestionWorker (single task, Initializing → Running)
//!   └── IngestionPipeline::run_cycle()
//!         └── RetryPolicy::run()          ← retries NetworkError only
//!               ├── Fetch::fetch()        ← HttpFetcher, bounded by timeout
//!               └── SnapshotParser::parse ← SchemaError / RowShapeError
//!   ├── Success → SnapshotStore::publish + IngestionMetrics::record_success
//!   └── Failure → IngestionMetrics::record_failure, previous snapshot kept
//! ```
//!
//! # Backoff
//!
//! The delay before attempt `k` (k ≥ 2) is `base * 2^(k-2)`: with a 1s base
//! and 3 attempts the worker waits 1s, then 2s, then reports failure.
//!
//! # Shutdown
//!
//! The worker watches a `tokio::sync::watch` channel before each fetch,
//! during the fetch and backoff, and during the inter-cycle sleep. An
//! interrupted cycle publishes nothing and its connection is closed.

pub mod client;
pub mod error;
pub mod outcome;
pub mod pipeline;
pub mod retry;
pub mod scheduler;

pub use client::{Fetch, HttpFetcher};
pub use error::{IngestError, IngestResult};
pub use outcome::IngestionOutcome;
pub use pipeline::IngestionPipeline;
pub use retry::{RetryPolicy, RetryReport, Retryable};
pub use scheduler::{IngestionWorker, WorkerState};
