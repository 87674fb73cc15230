//! HTTP subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request id, timeout, trace spans)
//!     → handlers.rs
//!         GET  /                     → DataService::fetch_data (body or fallback)
//!         GET  /status/breaker       → breaker snapshot (JSON)
//!         POST /status/breaker/reset → close the breaker, return snapshot
//! ```

pub mod handlers;
pub mod server;

pub use server::{AppState, HttpServer};
