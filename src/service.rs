//! Data service: the guarded upstream fetch with its fallback.

use std::sync::Arc;

use crate::resilience::{CircuitBreaker, ResilienceError};
use crate::upstream::{UpstreamClient, UpstreamError};

/// Fetches data from the upstream through the shared breaker.
#[derive(Debug, Clone)]
pub struct DataService {
    client: UpstreamClient,
    breaker: Arc<CircuitBreaker>,
    fallback_value: String,
}

impl DataService {
    pub fn new(client: UpstreamClient, breaker: Arc<CircuitBreaker>, fallback_value: String) -> Self {
        Self {
            client,
            breaker,
            fallback_value,
        }
    }

    pub fn breaker(&self) -> &Arc<CircuitBreaker> {
        &self.breaker
    }

    /// Upstream body, or the fallback value when the breaker says no.
    ///
    /// The guarded call runs on its own task: once admitted it finishes its
    /// retry sequence and reports to the breaker even if the caller goes away.
    pub async fn fetch_data(&self) -> String {
        let service = self.clone();
        match tokio::spawn(async move { service.guarded_fetch().await }).await {
            Ok(body) => body,
            Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
            Err(e) => {
                tracing::error!(error = %e, "Guarded fetch task cancelled");
                self.fallback_value.clone()
            }
        }
    }

    async fn guarded_fetch(&self) -> String {
        let client = &self.client;
        self.breaker
            .call(
                || async move {
                    tracing::info!(url = %client.url(), "Making request to upstream");
                    client.fetch().await
                },
                |cause| self.fallback(cause),
            )
            .await
    }

    fn fallback(&self, cause: ResilienceError<UpstreamError>) -> String {
        if cause.is_rejection() {
            tracing::debug!(breaker = %self.breaker.name(), "Circuit open, serving fallback value");
        } else {
            tracing::warn!(
                breaker = %self.breaker.name(),
                reason = cause.reason(),
                error = %cause,
                "Serving fallback value"
            );
        }
        self.fallback_value.clone()
    }
}
