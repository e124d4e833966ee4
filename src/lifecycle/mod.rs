//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Load config → Init logging → Registry → Spawn exporter → Start listener
//!
//! Shutdown (shutdown.rs):
//!     Signal received (signals.rs) → Trigger broadcast
//!     → Server drains → Exporter loop exits (optional final flush)
//! ```

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
