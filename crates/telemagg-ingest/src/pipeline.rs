//! One ingestion cycle: fetch → status check → parse → validate.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::debug;

use telemagg_core::{Snapshot, SnapshotParser};

use crate::client::Fetch;
use crate::error::IngestResult;
use crate::outcome::IngestionOutcome;
use crate::retry::RetryPolicy;

/// Fetch + parse pipeline wrapped in a retry policy.
pub struct IngestionPipeline<F> {
    fetcher: F,
    parser: SnapshotParser,
    retry: RetryPolicy,
}

struct Attempt {
    snapshot: Snapshot,
    fetch_latency: Duration,
    parse_latency: Duration,
}

impl<F: Fetch> IngestionPipeline<F> {
    pub fn new(fetcher: F, parser: SnapshotParser, retry: RetryPolicy) -> Self {
        Self {
            fetcher,
            parser,
            retry,
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// Run a full cycle. Never fails: errors become [`IngestionOutcome::Failure`].
    pub async fn run_cycle(&self) -> IngestionOutcome {
        let report = self.retry.run(|attempt| self.attempt(attempt)).await;

        match report.result {
            Ok(a) => IngestionOutcome::Success {
                snapshot: Arc::new(a.snapshot),
                fetch_latency: a.fetch_latency,
                parse_latency: a.parse_latency,
                attempts: report.attempts,
            },
            Err(e) => IngestionOutcome::Failure {
                kind: e.kind(),
                detail: e.to_string(),
                attempts: report.attempts,
            },
        }
    }

    async fn attempt(&self, attempt: u32) -> IngestResult<Attempt> {
        let started = Instant::now();
        let body = self.fetcher.fetch().await?;
        let fetch_latency = started.elapsed();

        let started = Instant::now();
        let snapshot = self.parser.parse(&body)?;
        let parse_latency = started.elapsed();

        debug!(
            attempt,
            bytes = body.len(),
            entities = snapshot.len(),
            fetch_ms = fetch_latency.as_millis() as u64,
            "attempt succeeded"
        );

        Ok(Attempt {
            snapshot,
            fetch_latency,
            parse_latency,
        })
    }
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use telemagg_core::ErrorKind;

    fn pipeline(script: Vec<IngestResult<String>>, max_attempts: u32) -> IngestionPipeline<ScriptedFetcher> {
        IngestionPipeline::new(
            ScriptedFetcher::new(script),
            SnapshotParser::default(),
            RetryPolicy::new(max_attempts, Duration::from_secs(1)),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn success_reports_snapshot_and_latencies() {
        let p = pipeline(vec![ok("entity_id,bw,lat\nA,1.0,2.0\nB,3.0,4.0")], 3);

        match p.run_cycle().await {
            IngestionOutcome::Success {
                snapshot, attempts, ..
            } => {
                assert_eq!(attempts, 1);
                assert_eq!(snapshot.len(), 2);
                assert_eq!(snapshot.metric("B", "lat").map(String::as_str), Some("4.0"));
            }
            other => panic!("expected success, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn network_failures_retry_then_succeed() {
        let p = pipeline(vec![http_500(), http_500(), ok("entity_id,bw\nA,1\n")], 3);
        let start = tokio::time::Instant::now();

        let outcome = p.run_cycle().await;
        assert!(outcome.is_success());
        assert_eq!(outcome.attempts(), 3);
        assert!(start.elapsed() >= Duration::from_secs(3));
        assert_eq!(p.fetcher.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_retries_report_network_failure() {
        let p = pipeline(vec![http_500()], 2);

        match p.run_cycle().await {
            IngestionOutcome::Failure { kind, attempts, detail } => {
                assert_eq!(kind, ErrorKind::Network);
                assert_eq!(attempts, 2);
                assert!(detail.contains("500"));
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn malformed_payload_fails_without_retry() {
        let p = pipeline(
            vec![ok("switch_id,m1,m2\nSW-01,1,UP\nSW-02,2"), ok("switch_id,m1,m2\n")],
            5,
        );

        let outcome = p.run_cycle().await;
        match outcome {
            IngestionOutcome::Failure { kind, attempts, .. } => {
                assert_eq!(kind, ErrorKind::RowShape);
                assert_eq!(attempts, 1);
            }
            other => panic!("expected failure, got {other:?}"),
        }
        assert_eq!(p.fetcher.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn missing_identifier_is_schema_failure() {
        let p = pipeline(vec![ok("host,bw\nA,1\n")], 3);
        match p.run_cycle().await {
            IngestionOutcome::Failure { kind, .. } => assert_eq!(kind, ErrorKind::Schema),
            other => panic!("expected failure, got {other:?}"),
        }
    }
}
