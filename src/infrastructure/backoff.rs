//! Bounded exponential-backoff retry executor
//!
//! Runs an async operation up to `max_attempts` times. Between failed attempts it
//! sleeps for the current delay and then doubles it, capped at `max_delay`. The
//! first success is returned at once; there is no sleep after the final attempt.
//!
//! The executor does not classify failures. An operation that knows a failure is
//! permanent should return `Ok` with an empty value (e.g. `Ok(None)`) so no
//! attempts are wasted on it.

use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

use super::config::RetryConfig;
use super::sync_error::{SyncError, SyncResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    max_attempts: u32,
    initial_delay: Duration,
    max_delay: Duration,
}

impl BackoffPolicy {
    pub fn new(max_attempts: u32, initial_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_delay,
            max_delay,
        }
    }

    pub fn from_config(config: &RetryConfig) -> Self {
        Self::new(
            config.max_attempts,
            config.initial_delay(),
            config.max_delay(),
        )
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Sleeps taken between attempts when every attempt fails.
    pub fn delays(&self) -> Vec<Duration> {
        let mut delays = Vec::with_capacity(self.max_attempts as usize);
        let mut delay = self.initial_delay;
        for _ in 1..self.max_attempts {
            delays.push(delay);
            delay = self.next_delay(delay);
        }
        delays
    }

    fn next_delay(&self, current: Duration) -> Duration {
        current.saturating_mul(2).min(self.max_delay)
    }

    /// Execute `op` under this policy. `operation` labels log lines and the final error.
    pub async fn execute<T, F, Fut>(&self, operation: &str, mut op: F) -> SyncResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = SyncResult<T>>,
    {
        let mut delay = self.initial_delay;
        let mut attempt = 1;

        loop {
            match op().await {
                Ok(value) => {
                    if attempt > 1 {
                        debug!("{} succeeded on attempt {}", operation, attempt);
                    }
                    return Ok(value);
                }
                Err(err) if attempt >= self.max_attempts => {
                    warn!(
                        "❌ {} failed on final attempt {}/{}: {}",
                        operation, attempt, self.max_attempts, err
                    );
                    return Err(SyncError::RetriesExhausted {
                        operation: operation.to_string(),
                        attempts: self.max_attempts,
                        last: Box::new(err),
                    });
                }
                Err(err) => {
                    warn!(
                        "🔄 {} attempt {}/{} failed, retrying in {:?}: {}",
                        operation, attempt, self.max_attempts, delay, err
                    );
                    sleep(delay).await;
                    delay = self.next_delay(delay);
                    attempt += 1;
                }
            }
        }
    }
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}
