//! Bounded exponential backoff.

use std::future::Future;
use std::time::Duration;

use tracing::{error, warn};

use crate::error::IngestError;

/// Errors that know whether another attempt could succeed.
pub trait Retryable {
    fn is_retryable(&self) -> bool;
}

impl Retryable for IngestError {
    fn is_retryable(&self) -> bool {
        self.kind().is_retryable()
    }
}

/// Retry policy parameterized by attempt budget and base delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
}

/// Result of running an operation under a [`RetryPolicy`].
#[derive(Debug)]
pub struct RetryReport<T, E> {
    pub result: Result<T, E>,
    /// Attempts made, including the first.
    pub attempts: u32,
    /// Total time spent sleeping between attempts.
    pub waited: Duration,
}

impl RetryPolicy {
    /// `max_attempts` counts every attempt including the first; values
    /// below 1 are raised to 1.
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay before attempt `attempt` (1-based): zero for the first,
    /// `base * 2^(attempt-2)` afterwards.
    pub fn delay_before(&self, attempt: u32) -> Duration {
        if attempt < 2 {
            return Duration::ZERO;
        }
        let factor = 1u32.checked_shl(attempt - 2).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }

    /// Run `op` until it succeeds, fails with a non-retryable error, or the
    /// attempt budget is spent.
    pub async fn run<T, E, F, Fut>(&self, mut op: F) -> RetryReport<T, E>
    where
        E: Retryable + std::fmt::Display,
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut waited = Duration::ZERO;
        let mut attempt = 1;

        loop {
            match op(attempt).await {
                Ok(value) => {
                    return RetryReport {
                        result: Ok(value),
                        attempts: attempt,
                        waited,
                    };
                }
                Err(e) if !e.is_retryable() => {
                    return RetryReport {
                        result: Err(e),
                        attempts: attempt,
                        waited,
                    };
                }
                Err(e) if attempt >= self.max_attempts => {
                    error!(
                        attempts = attempt,
                        error = %e,
                        "max attempts exceeded"
                    );
                    return RetryReport {
                        result: Err(e),
                        attempts: attempt,
                        waited,
                    };
                }
                Err(e) => {
                    let delay = self.delay_before(attempt + 1);
                    warn!(
                        attempt,
                        max_attempts = self.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "attempt failed, backing off"
                    );
                    tokio::time::sleep(delay).await;
                    waited += delay;
                    attempt += 1;
                }
            }
        }
    }
}
