//! Startup orchestration.
//!
//! # Responsibilities
//! - Turn validated configuration into resilience policies
//! - Build the shared breaker and the upstream client
//! - Hand the composed service to the HTTP layer

use std::sync::Arc;
use thiserror::Error;

use crate::config::AppConfig;
use crate::resilience::{CircuitBreaker, PolicyError, RetryExecutor};
use crate::service::DataService;
use crate::upstream::{UpstreamClient, UpstreamError};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid resilience policy: {0}")]
    Policy(#[from] PolicyError),

    #[error(transparent)]
    Upstream(#[from] UpstreamError),
}

/// Build the data service and its circuit breaker from configuration.
pub fn build_service(config: &AppConfig) -> Result<DataService, StartupError> {
    let policy = config.retry.to_policy()?;
    let breaker = CircuitBreaker::new(
        config.circuit_breaker.name.clone(),
        config.circuit_breaker.to_breaker_config(),
        RetryExecutor::new(policy),
    )?;
    let client = UpstreamClient::new(&config.upstream)?;

    tracing::info!(
        breaker = %breaker.name(),
        upstream = %client.url(),
        max_attempts = config.retry.max_attempts,
        window = config.circuit_breaker.sliding_window_size,
        threshold = config.circuit_breaker.failure_rate_threshold,
        "Resilience layer initialized"
    );

    Ok(DataService::new(
        client,
        Arc::new(breaker),
        config.upstream.fallback_value.clone(),
    ))
}
