// src/fetch/retry.rs

use std::{fmt, future::Future, time::Duration};
use tokio::time::sleep;
use tracing::{error, warn};

/// Bounded retry with exponential backoff: attempt `n` (1-based) that fails
/// waits `initial_backoff * 2^(n-1)` before attempt `n + 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    pub initial_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(100),
        }
    }
}

impl RetryPolicy {
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.initial_backoff.saturating_mul(factor)
    }

    /// Run `op` until it yields something `should_retry` rejects, or the
    /// attempts run out. The last result is returned either way.
    pub async fn run<T, F, Fut, R>(&self, label: &str, mut op: F, should_retry: R) -> T
    where
        T: fmt::Display,
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = T>,
        R: Fn(&T) -> bool,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            let out = op(attempt).await;
            if !should_retry(&out) {
                return out;
            }
            if attempt >= max_attempts {
                error!(%label, attempts = attempt, error = %out, "exhausted retries");
                return out;
            }
            let delay = self.backoff(attempt);
            warn!(
                %label,
                attempt,
                delay_ms = delay.as_millis() as u64,
                error = %out,
                "retrying"
            );
            sleep(delay).await;
            attempt += 1;
        }
    }
}
