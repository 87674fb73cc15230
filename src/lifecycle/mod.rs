//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Validated config → RetryExecutor → CircuitBreaker → UpstreamClient → DataService
//!
//! Shutdown (shutdown.rs):
//!     trigger() → broadcast to the HTTP server → drain in-flight requests → exit
//!
//! Signals (signals.rs):
//!     Ctrl+C → Shutdown::trigger()
//! ```
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - One breaker per guarded dependency, created at startup, shared by reference

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use signals::shutdown_signal;
