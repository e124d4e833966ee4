//! HTTP serving subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, trace + timeout layers)
//!     → application routes, each wrapped by telemetry hooks
//!     → /health, /admin/metrics
//! ```

pub mod server;

pub use server::HttpServer;
