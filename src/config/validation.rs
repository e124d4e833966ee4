//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (intervals and timeouts > 0)
//! - Check the metrics endpoint is a usable http(s) URL
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: TelemetryConfig → Result<(), Vec<ValidationError>>

use std::net::SocketAddr;
use thiserror::Error;
use url::Url;

use crate::config::schema::TelemetryConfig;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field}: invalid URL '{value}'")]
    InvalidUrl { field: &'static str, value: String },

    #[error("{field}: invalid socket address '{value}'")]
    InvalidAddress { field: &'static str, value: String },

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("{0} must not be empty")]
    Empty(&'static str),
}

pub fn validate_config(config: &TelemetryConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.server.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "server.bind_address",
            value: config.server.bind_address.clone(),
        });
    }
    if config.server.request_timeout_secs == 0 {
        errors.push(ValidationError::Zero("server.request_timeout_secs"));
    }

    let metrics = &config.metrics;
    if metrics.enabled {
        let scheme_ok = Url::parse(&metrics.url)
            .map(|u| matches!(u.scheme(), "http" | "https"))
            .unwrap_or(false);
        if !scheme_ok {
            errors.push(ValidationError::InvalidUrl {
                field: "metrics.url",
                value: metrics.url.clone(),
            });
        }
        if metrics.source.trim().is_empty() {
            errors.push(ValidationError::Empty("metrics.source"));
        }
        if metrics.interval_secs == 0 {
            errors.push(ValidationError::Zero("metrics.interval_secs"));
        }
        if metrics.request_timeout_secs == 0 {
            errors.push(ValidationError::Zero("metrics.request_timeout_secs"));
        }
    }

    if config.admin.enabled && config.admin.api_key.is_empty() {
        errors.push(ValidationError::Empty("admin.api_key"));
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
        assert_eq!(validate_config(&TelemetryConfig::default()), Ok(()));
    }

    #[test]
    fn test_collects_every_error() {
        let mut config = TelemetryConfig::default();
        config.metrics.url = "ftp://example.com".into();
        config.metrics.interval_secs = 0;
        config.metrics.source = " ".into();
        config.admin.enabled = true;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::InvalidUrl {
                    field: "metrics.url",
                    value: "ftp://example.com".into()
                },
                ValidationError::Empty("metrics.source"),
                ValidationError::Zero("metrics.interval_secs"),
                ValidationError::Empty("admin.api_key"),
            ]
        );
    }

    #[test]
    fn test_disabled_metrics_skip_endpoint_checks() {
        let mut config = TelemetryConfig::default();
        config.metrics.enabled = false;
        config.metrics.url = String::new();
        assert!(validate_config(&config).is_ok());
    }
}
