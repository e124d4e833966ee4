//! Telemetry error definitions.

use thiserror::Error;

/// Errors raised while pushing a payload to the metrics backend.
///
/// None of these escape the exporter: a failed push is logged and the
/// registry values are simply re-sent, enlarged, on the next tick.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Connection, DNS or body serialization failure.
    #[error("transport error: {0}")]
    Transport(#[source] reqwest::Error),

    /// Backend answered with a non-success status.
    #[error("backend rejected metric with status {0}")]
    Status(reqwest::StatusCode),

    /// No response within the configured client timeout.
    #[error("push timed out after {0} seconds")]
    Timeout(u64),
}

/// Result type for export operations.
pub type ExportResult<T> = Result<T, ExportError>;

/// Errors raised by a host resource probe.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SampleError {
    /// The named reading is not available on this host.
    #[error("{0} unavailable on this host")]
    Unavailable(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ExportError::Status(reqwest::StatusCode::UNAUTHORIZED);
        assert_eq!(
            err.to_string(),
            "backend rejected metric with status 401 Unauthorized"
        );

        let err = ExportError::Timeout(10);
        assert_eq!(err.to_string(), "push timed out after 10 seconds");

        let err = SampleError::Unavailable("load average");
        assert_eq!(err.to_string(), "load average unavailable on this host");
    }
}
