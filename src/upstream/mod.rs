//! Upstream subsystem.
//!
//! # Data Flow
//! ```text
//! DataService::fetch_data
//!     → CircuitBreaker::call
//!         → client.rs (one HTTP GET per attempt, bounded by timeouts)
//! ```
//!
//! # Design Decisions
//! - Timeouts belong to the client, not to the resilience layer
//! - Any transport error or non-2xx status counts as a failed attempt

pub mod client;

pub use client::{UpstreamClient, UpstreamError};
