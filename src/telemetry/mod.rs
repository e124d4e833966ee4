//! Telemetry aggregation and export.
//!
//! # Data Flow
//! ```text
//! Request pipeline:
//!     hooks.rs (per-route middleware, business events)
//!     → registry.rs (atomic counters, gauge, accumulators)
//!
//! Every interval:
//!     exporter.rs reads registry.rs + sampler.rs
//!     → encoder.rs (one OTLP/JSON sum per metric)
//!     → POST to metrics backend (fire-and-forget, logged on failure)
//! ```

pub mod encoder;
pub mod error;
pub mod exporter;
pub mod hooks;
pub mod registry;
pub mod sampler;

pub use error::{ExportError, SampleError};
pub use exporter::{Exporter, ExporterHandle, FlushSummary, PushClient};
pub use hooks::{Completion, CompletionGuard, Instrumentation};
pub use registry::{LatencyBucket, MetricRegistry, Outcome, RegistrySnapshot};
pub use sampler::ResourceSampler;
