//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the telemetry service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct TelemetryConfig {
    /// HTTP listener settings.
    pub server: ServerConfig,

    /// Metrics backend and export settings.
    pub metrics: MetricsConfig,

    /// Operator snapshot endpoint.
    pub admin: AdminConfig,

    /// Logging settings.
    pub observability: ObservabilityConfig,
}

/// HTTP listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:3000").
    pub bind_address: String,

    /// Request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
            request_timeout_secs: 30,
        }
    }
}

/// Metrics export configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Run the periodic exporter.
    pub enabled: bool,

    /// OTLP/HTTP JSON endpoint receiving the pushes.
    pub url: String,

    /// Bearer token sent with every push.
    pub api_key: String,

    /// Value of the `source` attribute on every metric.
    pub source: String,

    /// Seconds between flushes.
    pub interval_secs: u64,

    /// Timeout for a single push in seconds.
    pub request_timeout_secs: u64,

    /// Push one last time when shutting down.
    pub flush_on_shutdown: bool,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            url: "http://localhost:4318/v1/metrics".to_string(),
            api_key: String::new(),
            source: "jwt-pizza-service".to_string(),
            interval_secs: 100,
            request_timeout_secs: 10,
            flush_on_shutdown: true,
        }
    }
}

/// Admin endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AdminConfig {
    /// Mount `/admin/metrics`.
    pub enabled: bool,

    /// API key for authentication (Bearer token).
    pub api_key: String,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error) or a full filter directive.
    pub log_level: String,

    /// Emit JSON log lines instead of the human-readable format.
    pub json_logs: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}
