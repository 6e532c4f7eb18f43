//! Result of one ingestion cycle.

use std::time::Duration;

use telemagg_core::{ErrorKind, SnapshotRef};

/// Tagged outcome of a cycle; errors are already absorbed into `Failure`.
#[derive(Debug, Clone)]
pub enum IngestionOutcome {
    Success {
        snapshot: SnapshotRef,
        fetch_latency: Duration,
        parse_latency: Duration,
        attempts: u32,
    },
    Failure {
        kind: ErrorKind,
        detail: String,
        attempts: u32,
    },
}

impl IngestionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, IngestionOutcome::Success { .. })
    }

    pub fn attempts(&self) -> u32 {
        match self {
            IngestionOutcome::Success { attempts, .. } | IngestionOutcome::Failure { attempts, .. } => {
                *attempts
            }
        }
    }
}
