//! Configuration loading from disk.

use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::config::schema::AppConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<AppConfig, ConfigError> {
    let config: AppConfig = toml::from_str(content)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::BackoffKind;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.circuit_breaker.sliding_window_size, 5);
        assert_eq!(config.upstream.fallback_value, "fallback value");
    }

    #[test]
    fn test_partial_sections() {
        let config = parse_config(
            r#"
            [upstream]
            url = "http://127.0.0.1:6060/service2"

            [retry]
            max_attempts = 5
            backoff = "exponential"

            [circuit_breaker]
            name = "service2"
            failure_rate_threshold = 50.0
            "#,
        )
        .unwrap();

        assert_eq!(config.upstream.url, "http://127.0.0.1:6060/service2");
        assert_eq!(config.upstream.request_timeout_ms, 5_000);
        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.retry.backoff, BackoffKind::Exponential);
        assert_eq!(config.circuit_breaker.name, "service2");
        assert_eq!(config.circuit_breaker.permitted_calls_in_half_open_state, 3);
    }

    #[test]
    fn test_syntax_error() {
        let err = parse_config("[retry\nmax_attempts = 3").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_validation_errors_reported() {
        let err = parse_config(
            r#"
            [retry]
            max_attempts = 0

            [circuit_breaker]
            sliding_window_size = 0
            "#,
        )
        .unwrap_err();

        match err {
            ConfigError::Validation(errors) => assert_eq!(errors.len(), 2),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_file() {
        let err = load_config(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
