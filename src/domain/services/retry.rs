//! Bounded retry with exponential backoff
//!
//! Sleeping goes through the `Clock` port.

use std::time::Duration;

use crate::domain::ports::Clock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub multiplier: u32,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_secs(1),
            multiplier: 2,
            max_backoff: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    pub fn with_initial_backoff(mut self, backoff: Duration) -> Self {
        self.initial_backoff = backoff;
        self
    }

    /// Delay after the given failed attempt (1-based): 1s, 2s, 4s, ... capped
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let factor = self
            .multiplier
            .checked_pow(attempt.saturating_sub(1))
            .unwrap_or(u32::MAX);
        self.initial_backoff
            .checked_mul(factor)
            .unwrap_or(self.max_backoff)
            .min(self.max_backoff)
    }
}

/// The last error and how many attempts were made
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryError<E> {
    pub error: E,
    pub attempts: u32,
}

/// Run `op` until it succeeds, fails with a non-transient error, or the
/// attempt budget is spent. `op` receives the 1-based attempt number.
/// `on_retry` is told about each failure that will be retried.
pub fn retry_with<T, E>(
    policy: &RetryPolicy,
    clock: &dyn Clock,
    mut op: impl FnMut(u32) -> Result<T, E>,
    is_transient: impl Fn(&E) -> bool,
    mut on_retry: impl FnMut(u32, &E, Duration),
) -> Result<T, RetryError<E>> {
    let max = policy.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match op(attempt) {
            Ok(value) => return Ok(value),
            Err(error) => {
                if attempt >= max || !is_transient(&error) {
                    return Err(RetryError {
                        error,
                        attempts: attempt,
                    });
                }
                let delay = policy.backoff_for(attempt);
                on_retry(attempt, &error, delay);
                clock.sleep(delay);
                attempt += 1;
            }
        }
    }
}

pub fn retry<T, E>(
    policy: &RetryPolicy,
    clock: &dyn Clock,
    op: impl FnMut(u32) -> Result<T, E>,
    is_transient: impl Fn(&E) -> bool,
) -> Result<T, RetryError<E>> {
    retry_with(policy, clock, op, is_transient, |_, _, _| {})
}
