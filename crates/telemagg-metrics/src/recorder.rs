//! Metrics recorder — lock-free counters and gauges for the ingestion cycle.
//!
//! Fields are independent atomics; readers may observe a success counter
//! from one cycle next to a latency gauge from the previous one, which is
//! acceptable for scraping.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::Serialize;
use tracing::info;

use telemagg_core::ErrorKind;

#[derive(Default)]
struct Counters {
    success_total: AtomicU64,
    failure_total: AtomicU64,
    network_failures: AtomicU64,
    schema_failures: AtomicU64,
    row_shape_failures: AtomicU64,
    /// Latency gauges in microseconds.
    last_fetch_latency_us: AtomicU64,
    last_parse_latency_us: AtomicU64,
    /// Epoch seconds of the last published snapshot; 0 = never.
    last_success_timestamp: AtomicU64,
    snapshot_entities: AtomicU64,
    ready: AtomicBool,
}

/// Shared ingestion metrics. Cloning yields another handle to the same counters.
#[derive(Clone, Default)]
pub struct IngestionMetrics {
    inner: Arc<Counters>,
}

/// Point-in-time copy of every metric.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    pub ingestion_success_total: u64,
    pub ingestion_failure_total: u64,
    pub network_failures: u64,
    pub schema_failures: u64,
    pub row_shape_failures: u64,
    pub last_fetch_latency_ms: f64,
    pub last_parse_latency_ms: f64,
    pub last_success_timestamp: u64,
    pub snapshot_entities: u64,
    pub is_ready: bool,
}

impl MetricsSnapshot {
    /// Failed-cycle counts paired with the kind they were recorded under.
    pub fn failures_by_kind(&self) -> [(ErrorKind, u64); 3] {
        [
            (ErrorKind::Network, self.network_failures),
            (ErrorKind::Schema, self.schema_failures),
            (ErrorKind::RowShape, self.row_shape_failures),
        ]
    }
}

impl IngestionMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a successful cycle whose snapshot was published.
    pub fn record_success(&self, fetch_latency: Duration, parse_latency: Duration, entities: usize) {
        let c = &self.inner;
        c.success_total.fetch_add(1, Ordering::Relaxed);
        c.last_fetch_latency_us
            .store(fetch_latency.as_micros() as u64, Ordering::Relaxed);
        c.last_parse_latency_us
            .store(parse_latency.as_micros() as u64, Ordering::Relaxed);
        c.snapshot_entities.store(entities as u64, Ordering::Relaxed);
        c.last_success_timestamp.store(epoch_secs(), Ordering::Relaxed);
    }

    /// Record a failed cycle.
    pub fn record_failure(&self, kind: ErrorKind) {
        let c = &self.inner;
        c.failure_total.fetch_add(1, Ordering::Relaxed);
        let by_kind = match kind {
            ErrorKind::Network => &c.network_failures,
            ErrorKind::Schema => &c.schema_failures,
            ErrorKind::RowShape => &c.row_shape_failures,
        };
        by_kind.fetch_add(1, Ordering::Relaxed);
    }

    /// Flip readiness on. Returns `true` only for the call that flipped it.
    pub fn mark_ready(&self) -> bool {
        let flipped = !self.inner.ready.swap(true, Ordering::AcqRel);
        if flipped {
            info!("service is ready: first snapshot published");
        }
        flipped
    }

    pub fn is_ready(&self) -> bool {
        self.inner.ready.load(Ordering::Acquire)
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let c = &self.inner;
        MetricsSnapshot {
            ingestion_success_total: c.success_total.load(Ordering::Relaxed),
            ingestion_failure_total: c.failure_total.load(Ordering::Relaxed),
            network_failures: c.network_failures.load(Ordering::Relaxed),
            schema_failures: c.schema_failures.load(Ordering::Relaxed),
            row_shape_failures: c.row_shape_failures.load(Ordering::Relaxed),
            last_fetch_latency_ms: us_to_ms(c.last_fetch_latency_us.load(Ordering::Relaxed)),
            last_parse_latency_ms: us_to_ms(c.last_parse_latency_us.load(Ordering::Relaxed)),
            last_success_timestamp: c.last_success_timestamp.load(Ordering::Relaxed),
            snapshot_entities: c.snapshot_entities.load(Ordering::Relaxed),
            is_ready: self.is_ready(),
        }
    }
}

fn us_to_ms(us: u64) -> f64 {
    us as f64 / 1000.0
}

fn epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
