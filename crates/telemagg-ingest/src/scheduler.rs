//! Ingestion worker — the single writer that drives periodic cycles.
//!
//! The worker runs one cycle immediately on start, then alternates
//! `cycle → sleep(interval)` until shutdown. The interval is measured from
//! the start of the sleep, so cycle duration adds to the period.

use std::time::{Duration, Instant};

use tokio::sync::watch;
use tracing::{error, info};

use telemagg_metrics::IngestionMetrics;
use telemagg_store::SnapshotStore;

use crate::client::Fetch;
use crate::outcome::IngestionOutcome;
use crate::pipeline::IngestionPipeline;

/// Lifecycle of the worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    /// No snapshot has been published yet.
    Initializing,
    /// At least one snapshot has been published.
    Running,
}

pub struct IngestionWorker<F> {
    pipeline: IngestionPipeline<F>,
    store: SnapshotStore,
    metrics: IngestionMetrics,
    interval: Duration,
    state: WorkerState,
}

impl<F: Fetch> IngestionWorker<F> {
    pub fn new(
        pipeline: IngestionPipeline<F>,
        store: SnapshotStore,
        metrics: IngestionMetrics,
        interval: Duration,
    ) -> Self {
        Self {
            pipeline,
            store,
            metrics,
            interval,
            state: WorkerState::Initializing,
        }
    }

    pub fn state(&self) -> WorkerState {
        self.state
    }

    /// Run one cycle and apply its outcome to the store and metrics.
    ///
    /// Only a `Success` publishes; a failure leaves the previous snapshot
    /// (if any) in place.
    pub async fn run_cycle(&mut self) -> IngestionOutcome {
        let started = Instant::now();
        let outcome = self.pipeline.run_cycle().await;

        match &outcome {
            IngestionOutcome::Success {
                snapshot,
                fetch_latency,
                parse_latency,
                attempts,
            } => {
                let generation = self.store.publish(snapshot.clone());
                self.metrics
                    .record_success(*fetch_latency, *parse_latency, snapshot.len());
                self.metrics.mark_ready();
                if self.state == WorkerState::Initializing {
                    self.state = WorkerState::Running;
                }
                info!(
                    generation,
                    entities = snapshot.len(),
                    attempts,
                    cycle_ms = started.elapsed().as_millis() as u64,
                    "store updated"
                );
            }
            IngestionOutcome::Failure {
                kind,
                detail,
                attempts,
            } => {
                self.metrics.record_failure(*kind);
                error!(
                    %kind,
                    attempts,
                    state = ?self.state,
                    %detail,
                    "ingestion cycle failed; retaining previous snapshot"
                );
            }
        }

        outcome
    }

    /// Run cycles until the shutdown signal fires.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        info!(
            interval_ms = self.interval.as_millis() as u64,
            max_attempts = self.pipeline.retry_policy().max_attempts(),
            "ingestion worker started"
        );

        loop {
            if *shutdown.borrow() {
                break;
            }

            tokio::select! {
                _ = self.run_cycle() => {}
                _ = shutdown.changed() => {
                    info!("shutdown during ingestion cycle; discarding in-flight fetch");
                    break;
                }
            }

            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                _ = shutdown.changed() => break,
            }
        }

        info!(state = ?self.state, "ingestion worker stopped");
    }
}
