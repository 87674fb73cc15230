//! Retry logic.
//!
//! # Responsibilities
//! - Invoke the protected operation up to `max_attempts` times
//! - Pause between attempts according to the configured [`Backoff`]
//! - Report one terminal outcome per run
//!
//! # Design Decisions
//! - Every error is retryable; the executor does not inspect error types
//! - No state survives between runs
//! - The pause suspends only the calling task

use std::future::Future;
use std::time::Duration;

use crate::observability::metrics;
use crate::resilience::backoff::Backoff;
use crate::resilience::clock::{Sleeper, TokioSleeper};
use crate::resilience::error::PolicyError;
use crate::resilience::outcome::CallOutcome;

/// Immutable retry configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    max_attempts: u32,
    backoff: Backoff,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff: Backoff) -> Result<Self, PolicyError> {
        if max_attempts == 0 {
            return Err(PolicyError::InvalidMaxAttempts(max_attempts));
        }
        if let Backoff::Exponential { multiplier, .. } = backoff {
            if multiplier < 1.0 || multiplier.is_nan() {
                return Err(PolicyError::InvalidMultiplier(multiplier));
            }
        }
        Ok(Self {
            max_attempts,
            backoff,
        })
    }

    /// A single attempt, no retries.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            backoff: Backoff::fixed(Duration::ZERO),
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn backoff(&self) -> &Backoff {
        &self.backoff
    }

    /// Longest a full run can take when every attempt uses `per_attempt`.
    pub fn worst_case_duration(&self, per_attempt: Duration) -> Duration {
        let pauses: Duration = (1..self.max_attempts)
            .map(|attempt| self.backoff.max_delay(attempt))
            .sum();
        per_attempt * self.max_attempts + pauses
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Backoff::fixed(Duration::from_millis(500)),
        }
    }
}

/// Runs an operation with bounded re-invocation on failure.
#[derive(Debug, Clone)]
pub struct RetryExecutor<S = TokioSleeper> {
    policy: RetryPolicy,
    sleeper: S,
}

impl RetryExecutor<TokioSleeper> {
    pub fn new(policy: RetryPolicy) -> Self {
        Self::with_sleeper(policy, TokioSleeper)
    }
}

impl<S: Sleeper> RetryExecutor<S> {
    pub fn with_sleeper(policy: RetryPolicy, sleeper: S) -> Self {
        Self { policy, sleeper }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Run `operation` until it succeeds or `max_attempts` is reached.
    ///
    /// Returns the first success, or the cause of the last failed attempt.
    pub async fn run<T, E, Op, Fut>(&self, mut operation: Op) -> CallOutcome<T, E>
    where
        Op: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        let mut attempt = 0;
        loop {
            attempt += 1;

            match operation().await {
                Ok(value) => {
                    if attempt > 1 {
                        tracing::debug!(attempt, "Operation succeeded after retry");
                    }
                    metrics::record_retry_attempt("success");
                    return CallOutcome::Success(value);
                }
                Err(e) => {
                    metrics::record_retry_attempt("failure");

                    if attempt >= self.policy.max_attempts {
                        tracing::warn!(
                            attempt,
                            max_attempts = self.policy.max_attempts,
                            error = %e,
                            "Attempts exhausted"
                        );
                        return CallOutcome::Failure(e);
                    }

                    let delay = self.policy.backoff.delay(attempt);
                    tracing::warn!(attempt, delay = ?delay, error = %e, "Attempt failed, retrying");
                    self.sleeper.sleep(delay).await;
                }
            }
        }
    }
}
