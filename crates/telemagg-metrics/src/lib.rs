//! telemagg-metrics — observability for the ingestion pipeline.
//!
//! Tracks cycle outcomes (success/failure counters, per-kind failures),
//! latency gauges, the readiness flag, and renders everything in the
//! Prometheus text exposition format.
//!
//! # Architecture
//!
//! ```text
//! IngestionMetrics
//!   ├── record_success() / record_failure() ← called once per cycle
//!   ├── mark_ready()  → false → true, exactly once
//!   └── snapshot()    → MetricsSnapshot (plain values)
//!
//! Prometheus exposition
//!   └── render_prometheus() → text/plain for /metrics-exposition
//! ```

pub mod prometheus;
pub mod recorder;

pub use prometheus::render_prometheus;
pub use recorder::{IngestionMetrics, MetricsSnapshot};
