//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::config::schema::TelemetryConfig;
use crate::config::validation::{validate_config, ValidationError};

pub const ENV_METRICS_URL: &str = "METRICS_URL";
pub const ENV_METRICS_API_KEY: &str = "METRICS_API_KEY";
pub const ENV_METRICS_SOURCE: &str = "METRICS_SOURCE";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load configuration from an optional TOML file, apply environment
/// overrides, then validate.
pub fn load_config(path: Option<&Path>) -> Result<TelemetryConfig, ConfigError> {
    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            toml::from_str(&content)?
        }
        None => TelemetryConfig::default(),
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Overwrite metrics settings with any values `lookup` provides.
pub fn apply_env_overrides(config: &mut TelemetryConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(url) = lookup(ENV_METRICS_URL) {
        config.metrics.url = url;
    }
    if let Some(api_key) = lookup(ENV_METRICS_API_KEY) {
        config.metrics.api_key = api_key;
    }
    if let Some(source) = lookup(ENV_METRICS_SOURCE) {
        config.metrics.source = source;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_env_overrides_file_values() {
        let mut config = TelemetryConfig::default();
        let env: HashMap<&str, &str> = [
            (ENV_METRICS_API_KEY, "secret"),
            (ENV_METRICS_SOURCE, "pizza-prod"),
        ]
        .into_iter()
        .collect();

        apply_env_overrides(&mut config, |key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.metrics.api_key, "secret");
        assert_eq!(config.metrics.source, "pizza-prod");
        assert_eq!(config.metrics.url, TelemetryConfig::default().metrics.url);
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join("pizza_telemetry_loader_test.toml");
        fs::write(
            &path,
            r#"
            [server]
            bind_address = "127.0.0.1:4000"

            [metrics]
            interval_secs = 5
            "#,
        )
        .unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.server.bind_address, "127.0.0.1:4000");
        assert_eq!(config.metrics.interval_secs, 5);

        fs::remove_file(&path).unwrap_or_default();
    }

    #[test]
    fn test_invalid_file_reports_validation_errors() {
        let path = std::env::temp_dir().join("pizza_telemetry_loader_invalid.toml");
        fs::write(&path, "[metrics]\ninterval_secs = 0\n").unwrap();

        let err = load_config(Some(&path)).unwrap_err();
        assert!(err.to_string().contains("metrics.interval_secs must be greater than zero"));

        fs::remove_file(&path).unwrap_or_default();
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = load_config(Some(Path::new("/nonexistent/telemetry.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
