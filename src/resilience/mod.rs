//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! caller
//!     → circuit_breaker.rs (is the call permitted at all?)
//!         → rejected: fallback(CircuitOpen)
//!     → retries.rs (run the operation, pause via clock.rs Sleeper between attempts)
//!     → circuit_breaker.rs (record one terminal outcome in window.rs, maybe transition)
//!         → failure: fallback(RetryExhausted | OperationFailure)
//! ```
//!
//! # Design Decisions
//! - One retry sequence produces exactly one window entry
//! - The breaker lock is never held while the operation runs
//! - Time and sleeping are injected so the state machine is testable without waiting
//! - Half-open trials are evaluated once, after all permitted probes report back

pub mod backoff;
pub mod circuit_breaker;
pub mod clock;
pub mod error;
pub mod outcome;
pub mod retries;
pub mod window;

pub use backoff::Backoff;
pub use circuit_breaker::{BreakerConfig, BreakerSnapshot, BreakerState, CircuitBreaker};
pub use clock::{Clock, ManualClock, RecordingSleeper, Sleeper, SystemClock, TokioSleeper};
pub use error::{PolicyError, ResilienceError};
pub use outcome::{CallOutcome, OutcomeKind};
pub use retries::{RetryExecutor, RetryPolicy};
pub use window::SlidingWindow;
