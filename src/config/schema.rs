//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.
//! Durations are expressed in milliseconds.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::resilience::{Backoff, BreakerConfig, PolicyError, RetryPolicy};

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// The guarded dependency.
    pub upstream: UpstreamConfig,

    /// Retry configuration.
    pub retry: RetryConfig,

    /// Circuit breaker configuration.
    pub circuit_breaker: CircuitBreakerConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Total time allowed for one inbound request, in milliseconds.
    pub request_timeout_ms: u64,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            request_timeout_ms: 30_000,
        }
    }
}

/// Upstream service configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// URL fetched by every guarded call.
    pub url: String,

    /// Connection establishment timeout in milliseconds.
    pub connect_timeout_ms: u64,

    /// Per-attempt request timeout in milliseconds.
    pub request_timeout_ms: u64,

    /// Value returned when the breaker rejects or every attempt fails.
    pub fallback_value: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:6060/service2".to_string(),
            connect_timeout_ms: 1_000,
            request_timeout_ms: 5_000,
            fallback_value: "fallback value".to_string(),
        }
    }
}

/// Shape of the pause between retry attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BackoffKind {
    Fixed,
    Exponential,
}

/// Retry configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts per call, including the first one.
    pub max_attempts: u32,

    /// Pause after the first failed attempt in milliseconds.
    pub wait_duration_ms: u64,

    /// Fixed or exponential pauses.
    pub backoff: BackoffKind,

    /// Growth factor for exponential backoff.
    pub multiplier: f64,

    /// Upper bound for exponential backoff in milliseconds.
    pub max_wait_duration_ms: u64,

    /// Add up to 10% random extra delay.
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            wait_duration_ms: 500,
            backoff: BackoffKind::Fixed,
            multiplier: 2.0,
            max_wait_duration_ms: 10_000,
            jitter: false,
        }
    }
}

impl RetryConfig {
    pub fn backoff(&self) -> Backoff {
        let initial = Duration::from_millis(self.wait_duration_ms);
        let backoff = match self.backoff {
            BackoffKind::Fixed => Backoff::fixed(initial),
            BackoffKind::Exponential => Backoff::exponential(
                initial,
                self.multiplier,
                Duration::from_millis(self.max_wait_duration_ms),
            ),
        };
        if self.jitter {
            backoff.with_jitter()
        } else {
            backoff
        }
    }

    pub fn to_policy(&self) -> Result<RetryPolicy, PolicyError> {
        RetryPolicy::new(self.max_attempts, self.backoff())
    }
}

/// Circuit breaker configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CircuitBreakerConfig {
    /// Breaker identifier for logging/metrics.
    pub name: String,

    /// Number of terminal call outcomes kept in the window.
    pub sliding_window_size: usize,

    /// Failure percentage (0-100) that opens the circuit.
    pub failure_rate_threshold: f32,

    /// Time spent Open before probing, in milliseconds.
    pub wait_duration_in_open_state_ms: u64,

    /// Probe calls allowed while Half-Open.
    pub permitted_calls_in_half_open_state: usize,

    /// Outcomes needed before the failure rate is evaluated.
    pub minimum_number_of_calls: usize,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            name: "upstream".to_string(),
            sliding_window_size: 5,
            failure_rate_threshold: 60.0,
            wait_duration_in_open_state_ms: 1_000,
            permitted_calls_in_half_open_state: 3,
            minimum_number_of_calls: 5,
        }
    }
}

impl CircuitBreakerConfig {
    pub fn to_breaker_config(&self) -> BreakerConfig {
        BreakerConfig {
            sliding_window_size: self.sliding_window_size,
            failure_rate_threshold: self.failure_rate_threshold,
            wait_duration_in_open_state: Duration::from_millis(self.wait_duration_in_open_state_ms),
            permitted_calls_in_half_open_state: self.permitted_calls_in_half_open_state,
            minimum_number_of_calls: self.minimum_number_of_calls,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
