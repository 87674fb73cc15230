//! Metrics collection and exposition.
//!
//! # Metrics
//! - `breaker_calls_total` (counter): terminal call outcomes by breaker and outcome
//! - `breaker_state` (gauge): 0=closed, 1=open, 2=half-open
//! - `breaker_transitions_total` (counter): state changes by breaker, from, to
//! - `fallback_invocations_total` (counter): fallbacks by breaker and reason
//! - `retry_attempts_total` (counter): individual attempts by outcome
//! - `http_requests_total` (counter) / `http_request_duration_seconds` (histogram)

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Instant;

use crate::resilience::BreakerState;

/// Install the Prometheus exporter with its own HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_breaker_call(breaker: &str, outcome: &'static str) {
    counter!("breaker_calls_total", "breaker" => breaker.to_string(), "outcome" => outcome)
        .increment(1);
}

pub fn record_breaker_state(breaker: &str, state: BreakerState) {
    let value = match state {
        BreakerState::Closed => 0.0,
        BreakerState::Open => 1.0,
        BreakerState::HalfOpen => 2.0,
    };
    gauge!("breaker_state", "breaker" => breaker.to_string()).set(value);
}

pub fn record_transition(breaker: &str, from: BreakerState, to: BreakerState) {
    counter!(
        "breaker_transitions_total",
        "breaker" => breaker.to_string(),
        "from" => from.as_str(),
        "to" => to.as_str()
    )
    .increment(1);
}

pub fn record_fallback(breaker: &str, reason: &'static str) {
    counter!("fallback_invocations_total", "breaker" => breaker.to_string(), "reason" => reason)
        .increment(1);
}

pub fn record_retry_attempt(outcome: &'static str) {
    counter!("retry_attempts_total", "outcome" => outcome).increment(1);
}

pub fn record_request(path: &str, status: u16, start: Instant) {
    let status = status.to_string();
    counter!("http_requests_total", "path" => path.to_string(), "status" => status.clone())
        .increment(1);
    histogram!("http_request_duration_seconds", "path" => path.to_string(), "status" => status)
        .record(start.elapsed().as_secs_f64());
}
