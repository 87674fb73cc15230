//! Request handlers.

use axum::{extract::State, Json};
use std::time::Instant;

use crate::http::server::AppState;
use crate::observability::metrics;
use crate::resilience::BreakerSnapshot;

/// Fetch from the upstream. Always answers 200; the body is either the
/// upstream response or the fallback value.
pub async fn fetch(State(state): State<AppState>) -> String {
    let start = Instant::now();
    let body = state.service.fetch_data().await;
    metrics::record_request("/", 200, start);
    body
}

pub async fn breaker_status(State(state): State<AppState>) -> Json<BreakerSnapshot> {
    Json(state.service.breaker().snapshot())
}

pub async fn reset_breaker(State(state): State<AppState>) -> Json<BreakerSnapshot> {
    let breaker = state.service.breaker();
    breaker.reset();
    tracing::info!(breaker = %breaker.name(), "Circuit breaker reset via API");
    Json(breaker.snapshot())
}
