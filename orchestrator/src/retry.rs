//! Bounded retry with exponential backoff for model calls
//!
//! Only transient errors (`ModelUnavailable`, `RateLimited`) are retried.
//! Backoff starts at `initial_backoff`, doubles per retry and is capped at
//! `max_backoff`; a rate-limit hint from the server raises the wait to at
//! least the hinted duration. A hint longer than `max_backoff` is not
//! waited out: the error is returned at once.

use std::future::Future;
use std::time::Duration;

use som_agent::config::RetrySectionConfig;
use som_agent::LlmError;

/// Result of a retried operation together with how many attempts it took
#[derive(Debug)]
pub struct Attempted<T> {
    pub result: Result<T, LlmError>,
    pub attempts: u32,
}

impl<T> Attempted<T> {
    /// Attempts beyond the first
    pub fn retries(&self) -> u32 {
        self.attempts.saturating_sub(1)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first; at least 1
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetrySectionConfig::default())
    }
}

impl RetryPolicy {
    pub fn from_config(config: &RetrySectionConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            initial_backoff: Duration::from_millis(config.initial_backoff_ms),
            max_backoff: Duration::from_millis(config.max_backoff_ms),
        }
    }

    /// Single attempt, no waiting
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            initial_backoff: Duration::ZERO,
            max_backoff: Duration::ZERO,
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn with_backoff(mut self, initial: Duration, max: Duration) -> Self {
        self.initial_backoff = initial;
        self.max_backoff = max;
        self
    }

    /// Wait before retry number `retry` (1-based) after `error`; never more
    /// than `max_backoff`
    pub fn backoff(&self, retry: u32, error: &LlmError) -> Duration {
        let factor = 2u32.saturating_pow(retry.saturating_sub(1));
        let delay = self
            .initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff);
        match error {
            LlmError::RateLimited {
                retry_after: Some(hint),
            } => delay.max(*hint).min(self.max_backoff),
            _ => delay,
        }
    }

    /// Whether the server asked for a longer pause than the policy allows
    fn hint_exceeds_cap(&self, error: &LlmError) -> bool {
        matches!(
            error,
            LlmError::RateLimited { retry_after: Some(hint) } if *hint > self.max_backoff
        )
    }

    /// Run `op` until it succeeds, fails permanently or attempts run out
    pub async fn run<T, F, Fut>(&self, mut op: F) -> Attempted<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, LlmError>>,
    {
        let mut attempt = 1;
        loop {
            match op().await {
                Ok(value) => {
                    return Attempted {
                        result: Ok(value),
                        attempts: attempt,
                    }
                }
                Err(e) if self.hint_exceeds_cap(&e) => {
                    tracing::warn!(
                        attempts = attempt,
                        max_backoff_ms = self.max_backoff.as_millis() as u64,
                        error = %e,
                        "Rate-limit hint exceeds the backoff cap, not retrying"
                    );
                    return Attempted {
                        result: Err(e),
                        attempts: attempt,
                    };
                }
                Err(e) if e.is_transient() && attempt < self.max_attempts => {
                    let wait = self.backoff(attempt, &e);
                    tracing::warn!(
                        attempt,
                        max_attempts = self.max_attempts,
                        wait_ms = wait.as_millis() as u64,
                        error = %e,
                        "Transient model error, backing off"
                    );
                    tokio::time::sleep(wait).await;
                    attempt += 1;
                }
                Err(e) => {
                    if e.is_transient() {
                        tracing::warn!(attempts = attempt, error = %e, "Retries exhausted");
                    }
                    return Attempted {
                        result: Err(e),
                        attempts: attempt,
                    };
                }
            }
        }
    }
}
