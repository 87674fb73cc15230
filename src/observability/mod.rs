//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! resilience + http + upstream produce:
//!     → logging.rs (structured tracing events)
//!     → metrics.rs (breaker counters, state gauge, retry counters)
//!
//! Consumers:
//!     → stdout (fmt layer, filtered by RUST_LOG or config log level)
//!     → Prometheus scrape endpoint (optional)
//! ```
//!
//! # Design Decisions
//! - Metric calls are no-ops until an exporter is installed
//! - RUST_LOG overrides the configured level

pub mod logging;
pub mod metrics;
