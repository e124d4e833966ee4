//! Pizza service telemetry library.
//!
//! Instrumentation hooks, an in-memory metric registry and a periodic
//! OTLP/JSON exporter for the pizza ordering service.

pub mod admin;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod telemetry;

pub use config::TelemetryConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use telemetry::{Exporter, Instrumentation, MetricRegistry};
