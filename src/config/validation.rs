//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (attempts, thresholds, window sizes)
//! - Validate addresses and the upstream URL
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>
//! - Range rules for retry/breaker settings come from the resilience types themselves

use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;
use url::Url;

use crate::config::schema::AppConfig;
use crate::resilience::PolicyError;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("{field}: invalid socket address '{value}'")]
    InvalidAddress { field: &'static str, value: String },

    #[error("upstream.url: {0}")]
    InvalidUrl(String),

    #[error("{field} must be greater than zero")]
    ZeroTimeout { field: &'static str },

    #[error(
        "listener.request_timeout_ms ({listener_ms}) is shorter than the longest guarded call ({required_ms} ms)"
    )]
    TimeoutTooShort { listener_ms: u64, required_ms: u64 },

    #[error("{section}: {source}")]
    Policy {
        section: &'static str,
        source: PolicyError,
    },
}

pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }
    if config.listener.request_timeout_ms == 0 {
        errors.push(ValidationError::ZeroTimeout {
            field: "listener.request_timeout_ms",
        });
    }

    match Url::parse(&config.upstream.url) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
        Ok(url) => errors.push(ValidationError::InvalidUrl(format!(
            "unsupported scheme '{}'",
            url.scheme()
        ))),
        Err(e) => errors.push(ValidationError::InvalidUrl(e.to_string())),
    }
    if config.upstream.connect_timeout_ms == 0 {
        errors.push(ValidationError::ZeroTimeout {
            field: "upstream.connect_timeout_ms",
        });
    }
    if config.upstream.request_timeout_ms == 0 {
        errors.push(ValidationError::ZeroTimeout {
            field: "upstream.request_timeout_ms",
        });
    }

    match config.retry.to_policy() {
        Ok(policy) => {
            // An admitted call must be able to finish its whole retry sequence.
            let per_attempt = Duration::from_millis(config.upstream.request_timeout_ms);
            let required_ms = policy.worst_case_duration(per_attempt).as_millis() as u64;
            if config.listener.request_timeout_ms > 0
                && config.listener.request_timeout_ms < required_ms
            {
                errors.push(ValidationError::TimeoutTooShort {
                    listener_ms: config.listener.request_timeout_ms,
                    required_ms,
                });
            }
        }
        Err(source) => errors.push(ValidationError::Policy {
            section: "retry",
            source,
        }),
    }
    if let Err(source) = config.circuit_breaker.to_breaker_config().validate() {
        errors.push(ValidationError::Policy {
            section: "circuit_breaker",
            source,
        });
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&AppConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = AppConfig::default();
        config.listener.bind_address = "not-an-address".into();
        config.upstream.url = "ftp://example.com".into();
        config.upstream.request_timeout_ms = 0;
        config.circuit_breaker.failure_rate_threshold = 150.0;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 4);
        assert!(errors.contains(&ValidationError::Policy {
            section: "circuit_breaker",
            source: PolicyError::InvalidFailureRateThreshold(150.0),
        }));
        assert_eq!(
            errors[1].to_string(),
            "upstream.url: unsupported scheme 'ftp'"
        );
    }

    #[test]
    fn test_listener_timeout_covers_retry_sequence() {
        let mut config = AppConfig::default();
        // 3 attempts x 5000ms + 2 x 500ms pauses.
        config.listener.request_timeout_ms = 15_999;
        assert_eq!(
            validate_config(&config).unwrap_err(),
            vec![ValidationError::TimeoutTooShort {
                listener_ms: 15_999,
                required_ms: 16_000,
            }]
        );

        config.listener.request_timeout_ms = 16_000;
        assert!(validate_config(&config).is_ok());

        config.retry.max_attempts = 1;
        config.listener.request_timeout_ms = 5_000;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_metrics_address_checked_only_when_enabled() {
        let mut config = AppConfig::default();
        config.observability.metrics_address = "bogus".into();
        assert!(validate_config(&config).is_ok());

        config.observability.metrics_enabled = true;
        assert!(validate_config(&config).is_err());
    }
}
