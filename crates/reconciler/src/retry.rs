use std::{future::Future, time::Duration};

use {
    onair_config::ReconcilerConfig,
    rand::Rng,
    tracing::{debug, warn},
};

use crate::error::{SinkError, SinkResult};

/// Bounded retry with linear backoff and jitter, shared by every sink call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one.
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&ReconcilerConfig::default())
    }
}

impl RetryPolicy {
    #[must_use]
    pub fn from_config(cfg: &ReconcilerConfig) -> Self {
        Self {
            max_attempts: cfg.retry_attempts.max(1),
            base_delay: Duration::from_millis(cfg.retry_base_delay_ms),
            max_jitter: Duration::from_millis(cfg.retry_jitter_ms),
        }
    }

    /// No waiting between attempts.
    #[must_use]
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay: Duration::ZERO,
            max_jitter: Duration::ZERO,
        }
    }

    /// Delay after the `attempt`-th failure (1-based).
    fn backoff(&self, attempt: u32) -> Duration {
        let jitter_ms = self.max_jitter.as_millis() as u64;
        let jitter = if jitter_ms == 0 {
            Duration::ZERO
        } else {
            Duration::from_millis(rand::rng().random_range(0..=jitter_ms))
        };
        self.base_delay.saturating_mul(attempt) + jitter
    }

    /// Run `request` until it succeeds, fails with a non-retryable error,
    /// or the attempt budget is spent. The last error is returned.
    pub async fn run<T, F, Fut>(&self, operation: &'static str, mut request: F) -> SinkResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = SinkResult<T>>,
    {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            let err = match request().await {
                Ok(value) => return Ok(value),
                Err(err) if !err.is_retryable() => return Err(err),
                Err(err) => err,
            };

            if attempt >= self.max_attempts {
                warn!(
                    operation,
                    attempt,
                    max_attempts = self.max_attempts,
                    error = %err,
                    "sink operation failed after all attempts"
                );
                return Err(err);
            }

            let mut wait = self.backoff(attempt);
            if let SinkError::RateLimited { retry_after } = &err {
                wait = wait.max(*retry_after);
                warn!(
                    operation,
                    attempt,
                    retry_after_secs = retry_after.as_secs(),
                    "sink rate limited, waiting before retry"
                );
            } else {
                debug!(
                    operation,
                    attempt,
                    wait_ms = wait.as_millis() as u64,
                    error = %err,
                    "sink operation failed, retrying"
                );
            }
            tokio::time::sleep(wait).await;
        }
    }
}
