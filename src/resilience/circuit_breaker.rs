//! Circuit breaker guarding a single dependency.
//!
//! # States
//! - Closed: calls pass through, terminal outcomes fill the sliding window
//! - Open: calls are rejected and routed to the fallback
//! - Half-Open: a fixed number of probe calls decide the next state
//!
//! # State Transitions
//! ```text
//! Closed → Open: window holds >= minimum_number_of_calls and failure rate >= threshold
//! Open → Half-Open: first call after wait_duration_in_open_state
//! Half-Open → Closed: all probes reported, failure rate < threshold
//! Half-Open → Open: all probes reported, failure rate >= threshold
//! ```
//!
//! # Design Decisions
//! - One lock per breaker; it guards admission and recording, never the operation itself
//! - Each transition starts a new generation; outcomes admitted under an older generation are dropped
//! - Open → Half-Open is evaluated lazily on the next call, there is no background timer
//! - A call dropped before reporting back records nothing and returns its half-open slot

use serde::Serialize;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use crate::observability::metrics;
use crate::resilience::clock::{Clock, Sleeper, SystemClock, TokioSleeper};
use crate::resilience::error::{PolicyError, ResilienceError};
use crate::resilience::outcome::{CallOutcome, OutcomeKind};
use crate::resilience::retries::RetryExecutor;
use crate::resilience::window::SlidingWindow;

/// Externally visible breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BreakerState {
    Closed,
    Open,
    HalfOpen,
}

impl BreakerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            BreakerState::Closed => "closed",
            BreakerState::Open => "open",
            BreakerState::HalfOpen => "half_open",
        }
    }
}

impl fmt::Display for BreakerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable breaker configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct BreakerConfig {
    /// Number of terminal outcomes kept while Closed.
    pub sliding_window_size: usize,
    /// Failure percentage (0-100) at or above which the circuit opens.
    pub failure_rate_threshold: f32,
    /// How long the circuit stays Open before probing.
    pub wait_duration_in_open_state: Duration,
    /// Probe calls admitted while Half-Open.
    pub permitted_calls_in_half_open_state: usize,
    /// Outcomes required before the failure rate is evaluated. Values above
    /// the window size behave as the window size.
    pub minimum_number_of_calls: usize,
}

impl BreakerConfig {
    pub fn validate(&self) -> Result<(), PolicyError> {
        if self.sliding_window_size == 0 {
            return Err(PolicyError::InvalidWindowSize(self.sliding_window_size));
        }
        if !(0.0..=100.0).contains(&self.failure_rate_threshold) {
            return Err(PolicyError::InvalidFailureRateThreshold(
                self.failure_rate_threshold,
            ));
        }
        if self.permitted_calls_in_half_open_state == 0 {
            return Err(PolicyError::InvalidHalfOpenCalls(
                self.permitted_calls_in_half_open_state,
            ));
        }
        if self.minimum_number_of_calls == 0 {
            return Err(PolicyError::InvalidMinimumCalls(self.minimum_number_of_calls));
        }
        Ok(())
    }

    fn evaluation_threshold(&self) -> usize {
        self.minimum_number_of_calls.min(self.sliding_window_size)
    }
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            sliding_window_size: 5,
            failure_rate_threshold: 60.0,
            wait_duration_in_open_state: Duration::from_secs(1),
            permitted_calls_in_half_open_state: 3,
            minimum_number_of_calls: 5,
        }
    }
}

/// Probe bookkeeping for one Half-Open period.
#[derive(Debug)]
struct HalfOpenTrial {
    permitted: usize,
    outcomes: SlidingWindow,
}

impl HalfOpenTrial {
    fn new(size: usize) -> Self {
        Self {
            permitted: 0,
            outcomes: SlidingWindow::new(size),
        }
    }
}

#[derive(Debug)]
enum Phase {
    Closed,
    Open { opened_at: Instant },
    HalfOpen(HalfOpenTrial),
}

impl Phase {
    fn state(&self) -> BreakerState {
        match self {
            Phase::Closed => BreakerState::Closed,
            Phase::Open { .. } => BreakerState::Open,
            Phase::HalfOpen(_) => BreakerState::HalfOpen,
        }
    }
}

#[derive(Debug)]
struct Inner {
    phase: Phase,
    window: SlidingWindow,
    generation: u64,
}

/// Admission ticket handed out under the lock. Dropping it before
/// [`Permit::settle`] (a cancelled call) hands a half-open slot back.
struct Permit<'a, S> {
    breaker: &'a CircuitBreaker<S>,
    generation: u64,
    settled: bool,
}

impl<S> Permit<'_, S> {
    fn settle(mut self, kind: OutcomeKind) {
        self.settled = true;
        self.breaker.on_outcome(self.generation, kind);
    }
}

impl<S> Drop for Permit<'_, S> {
    fn drop(&mut self) {
        if !self.settled {
            self.breaker.release(self.generation);
        }
    }
}

/// Point-in-time view of a breaker.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BreakerSnapshot {
    pub name: String,
    pub state: BreakerState,
    pub buffered_calls: usize,
    pub failed_calls: usize,
    pub failure_rate: Option<f32>,
    pub half_open_permitted: usize,
    pub half_open_completed: usize,
}

/// Retry + circuit breaker around one guarded dependency.
///
/// Share one instance (behind an `Arc`) between every call site that talks to
/// the same dependency.
///
/// # Example
/// ```no_run
/// use resilient_fetch::resilience::{BreakerConfig, CircuitBreaker, RetryExecutor, RetryPolicy};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let retry = RetryExecutor::new(RetryPolicy::default());
/// let breaker = CircuitBreaker::new("upstream", BreakerConfig::default(), retry)?;
///
/// let value = breaker
///     .call(|| async { Ok::<_, std::io::Error>("fresh".to_string()) }, |_| "fallback value".to_string())
///     .await;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct CircuitBreaker<S = TokioSleeper> {
    name: String,
    config: BreakerConfig,
    retry: RetryExecutor<S>,
    clock: Arc<dyn Clock>,
    inner: Mutex<Inner>,
}

impl<S: Sleeper> CircuitBreaker<S> {
    pub fn new(
        name: impl Into<String>,
        config: BreakerConfig,
        retry: RetryExecutor<S>,
    ) -> Result<Self, PolicyError> {
        config.validate()?;
        let name = name.into();
        metrics::record_breaker_state(&name, BreakerState::Closed);

        Ok(Self {
            inner: Mutex::new(Inner {
                phase: Phase::Closed,
                window: SlidingWindow::new(config.sliding_window_size),
                generation: 0,
            }),
            name,
            config,
            retry,
            clock: Arc::new(SystemClock),
        })
    }

    /// Replace the time source.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &BreakerConfig {
        &self.config
    }

    pub fn retry(&self) -> &RetryExecutor<S> {
        &self.retry
    }

    /// Current state. An Open breaker whose wait has elapsed still reports
    /// Open until the next call arrives.
    pub fn state(&self) -> BreakerState {
        self.lock().phase.state()
    }

    pub fn snapshot(&self) -> BreakerSnapshot {
        let inner = self.lock();
        let (half_open_permitted, half_open_completed) = match &inner.phase {
            Phase::HalfOpen(trial) => (trial.permitted, trial.outcomes.len()),
            _ => (0, 0),
        };

        BreakerSnapshot {
            name: self.name.clone(),
            state: inner.phase.state(),
            buffered_calls: inner.window.len(),
            failed_calls: inner.window.failures(),
            failure_rate: inner.window.failure_rate(),
            half_open_permitted,
            half_open_completed,
        }
    }

    /// Force the breaker back to Closed with an empty window.
    pub fn reset(&self) {
        let mut inner = self.lock();
        self.transition(&mut inner, Phase::Closed);
    }

    /// Run `operation` through the breaker and the retry executor, substituting
    /// `fallback` on rejection or exhaustion. A panic in `fallback` unwinds to
    /// the caller.
    pub async fn call<T, E, Op, Fut, Fb>(&self, operation: Op, fallback: Fb) -> T
    where
        Op: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: fmt::Display,
        Fb: FnOnce(ResilienceError<E>) -> T,
    {
        match self.execute(operation).await {
            Ok(value) => value,
            Err(e) => {
                tracing::debug!(breaker = %self.name, reason = e.reason(), error = %e, "Invoking fallback");
                metrics::record_fallback(&self.name, e.reason());
                fallback(e)
            }
        }
    }

    /// Same as [`call`](Self::call) but hands the failure back instead of
    /// invoking a fallback.
    pub async fn execute<T, E, Op, Fut>(&self, operation: Op) -> Result<T, ResilienceError<E>>
    where
        Op: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: fmt::Display,
    {
        let Some(permit) = self.try_acquire() else {
            metrics::record_breaker_call(&self.name, "rejected");
            return Err(ResilienceError::CircuitOpen {
                name: self.name.clone(),
            });
        };

        let outcome = self.retry.run(operation).await;
        permit.settle(outcome.kind());
        metrics::record_breaker_call(&self.name, outcome.kind().as_str());

        match outcome {
            CallOutcome::Success(value) => Ok(value),
            CallOutcome::Failure(last) => {
                let attempts = self.retry.policy().max_attempts();
                if attempts > 1 {
                    Err(ResilienceError::RetryExhausted { attempts, last })
                } else {
                    Err(ResilienceError::OperationFailure(last))
                }
            }
        }
    }
}

impl<S> CircuitBreaker<S> {
    /// Decide under the lock whether a call may proceed.
    fn try_acquire(&self) -> Option<Permit<'_, S>> {
        let mut inner = self.lock();

        let opened_at = match inner.phase {
            Phase::Open { opened_at } => Some(opened_at),
            _ => None,
        };
        if let Some(opened_at) = opened_at {
            let elapsed = self.clock.now().saturating_duration_since(opened_at);
            if elapsed < self.config.wait_duration_in_open_state {
                tracing::debug!(breaker = %self.name, "Call rejected, circuit open");
                return None;
            }
            let trial = HalfOpenTrial::new(self.config.permitted_calls_in_half_open_state);
            self.transition(&mut inner, Phase::HalfOpen(trial));
        }

        let generation = inner.generation;
        let admitted = match &mut inner.phase {
            Phase::Closed => true,
            Phase::HalfOpen(trial) => {
                if trial.permitted < self.config.permitted_calls_in_half_open_state {
                    trial.permitted += 1;
                    tracing::debug!(
                        breaker = %self.name,
                        probe = trial.permitted,
                        "Half-open probe admitted"
                    );
                    true
                } else {
                    tracing::debug!(breaker = %self.name, "Call rejected, half-open probes in flight");
                    false
                }
            }
            Phase::Open { .. } => false,
        };

        if !admitted {
            return None;
        }
        Some(Permit {
            breaker: self,
            generation,
            settled: false,
        })
    }

    /// Record the terminal outcome of an admitted call and evaluate transitions.
    fn on_outcome(&self, generation: u64, kind: OutcomeKind) {
        let mut guard = self.lock();
        let inner = &mut *guard;

        if inner.generation != generation {
            tracing::debug!(
                breaker = %self.name,
                outcome = kind.as_str(),
                "Discarding outcome admitted before the last transition"
            );
            return;
        }

        let threshold = self.config.failure_rate_threshold;
        let next = match &mut inner.phase {
            Phase::Closed => {
                inner.window.push(kind);
                match inner.window.failure_rate() {
                    Some(rate)
                        if inner.window.len() >= self.config.evaluation_threshold()
                            && rate >= threshold =>
                    {
                        tracing::warn!(
                            breaker = %self.name,
                            failure_rate = rate,
                            threshold,
                            buffered_calls = inner.window.len(),
                            "Failure rate threshold reached"
                        );
                        Some(Phase::Open {
                            opened_at: self.clock.now(),
                        })
                    }
                    _ => None,
                }
            }
            Phase::HalfOpen(trial) => {
                trial.outcomes.push(kind);
                if trial.outcomes.len() < self.config.permitted_calls_in_half_open_state {
                    None
                } else {
                    let rate = trial.outcomes.failure_rate().unwrap_or(0.0);
                    tracing::info!(
                        breaker = %self.name,
                        failure_rate = rate,
                        threshold,
                        "Half-open trial complete"
                    );
                    if rate >= threshold {
                        Some(Phase::Open {
                            opened_at: self.clock.now(),
                        })
                    } else {
                        Some(Phase::Closed)
                    }
                }
            }
            Phase::Open { .. } => None,
        };

        if let Some(next) = next {
            self.transition(inner, next);
        }
    }

    /// An admitted call went away without an outcome. Closed records nothing;
    /// Half-Open frees the probe slot so the trial can still complete.
    fn release(&self, generation: u64) {
        let mut inner = self.lock();
        if inner.generation != generation {
            return;
        }
        if let Phase::HalfOpen(trial) = &mut inner.phase {
            trial.permitted = trial.permitted.saturating_sub(1);
            tracing::debug!(
                breaker = %self.name,
                permitted = trial.permitted,
                "Half-open probe cancelled, slot returned"
            );
        }
    }

    fn transition(&self, inner: &mut Inner, next: Phase) {
        let from = inner.phase.state();
        let to = next.state();

        // Closed and Open both start from an empty window.
        if to != BreakerState::HalfOpen {
            inner.window.clear();
        }
        inner.phase = next;
        inner.generation += 1;

        match to {
            BreakerState::Open => {
                tracing::warn!(breaker = %self.name, from = %from, to = %to, "Circuit breaker state changed")
            }
            _ => {
                tracing::info!(breaker = %self.name, from = %from, to = %to, "Circuit breaker state changed")
            }
        }
        metrics::record_transition(&self.name, from, to);
        metrics::record_breaker_state(&self.name, to);
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
