//! Observability subsystem.
//!
//! Operator-facing logs only. Business metrics live in `telemetry` and are
//! pushed to the backend rather than scraped.

pub mod logging;

pub use logging::init_logging;
