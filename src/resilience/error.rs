//! Resilience error types.

use thiserror::Error;

/// Why a guarded call ended up in the fallback.
#[derive(Debug, Error)]
pub enum ResilienceError<E> {
    /// The wrapped action failed and no retries were configured.
    #[error("operation failed: {0}")]
    OperationFailure(E),

    /// The breaker refused to forward the call.
    #[error("circuit breaker '{name}' is open")]
    CircuitOpen { name: String },

    /// Every attempt failed; `last` is the cause of the final one.
    #[error("all {attempts} attempts failed, last error: {last}")]
    RetryExhausted { attempts: u32, last: E },
}

impl<E> ResilienceError<E> {
    pub fn is_rejection(&self) -> bool {
        matches!(self, ResilienceError::CircuitOpen { .. })
    }

    /// Short label used for logs and metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            ResilienceError::OperationFailure(_) => "operation_failure",
            ResilienceError::CircuitOpen { .. } => "circuit_open",
            ResilienceError::RetryExhausted { .. } => "retry_exhausted",
        }
    }
}

/// Invalid retry or breaker parameters.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PolicyError {
    #[error("max_attempts must be at least 1 (got {0})")]
    InvalidMaxAttempts(u32),

    #[error("sliding_window_size must be at least 1 (got {0})")]
    InvalidWindowSize(usize),

    #[error("failure_rate_threshold must be within 0..=100 (got {0})")]
    InvalidFailureRateThreshold(f32),

    #[error("permitted_calls_in_half_open_state must be at least 1 (got {0})")]
    InvalidHalfOpenCalls(usize),

    #[error("minimum_number_of_calls must be at least 1 (got {0})")]
    InvalidMinimumCalls(usize),

    #[error("backoff multiplier must be at least 1.0 (got {0})")]
    InvalidMultiplier(f64),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let open: ResilienceError<String> = ResilienceError::CircuitOpen {
            name: "upstream".into(),
        };
        assert_eq!(open.to_string(), "circuit breaker 'upstream' is open");
        assert!(open.is_rejection());

        let exhausted = ResilienceError::RetryExhausted {
            attempts: 3,
            last: "500".to_string(),
        };
        assert_eq!(exhausted.to_string(), "all 3 attempts failed, last error: 500");
        assert!(!exhausted.is_rejection());
        assert_eq!(exhausted.reason(), "retry_exhausted");
    }
}
