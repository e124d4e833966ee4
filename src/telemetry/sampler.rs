//! Host resource sampling.
//!
//! Point-in-time CPU load and memory utilization, read fresh on every call.
//! Readings the host cannot provide degrade to a zero sample.

use std::num::NonZeroUsize;
use sysinfo::System;

use crate::telemetry::error::SampleError;

/// Raw host readings.
pub trait ResourceProbe: Send + Sync {
    /// One-minute load average.
    fn load_average(&self) -> Result<f64, SampleError>;

    /// Number of logical processing units.
    fn cpu_count(&self) -> Result<NonZeroUsize, SampleError>;

    /// `(total, free)` memory in bytes.
    fn memory(&self) -> Result<(u64, u64), SampleError>;
}

/// Probe backed by `sysinfo`.
#[derive(Debug, Default, Clone, Copy)]
pub struct HostProbe;

impl ResourceProbe for HostProbe {
    fn load_average(&self) -> Result<f64, SampleError> {
        if !sysinfo::IS_SUPPORTED_SYSTEM {
            return Err(SampleError::Unavailable("load average"));
        }
        Ok(System::load_average().one)
    }

    fn cpu_count(&self) -> Result<NonZeroUsize, SampleError> {
        std::thread::available_parallelism().map_err(|_| SampleError::Unavailable("cpu count"))
    }

    fn memory(&self) -> Result<(u64, u64), SampleError> {
        let mut system = System::new();
        system.refresh_memory();
        let total = system.total_memory();
        if total == 0 {
            return Err(SampleError::Unavailable("memory"));
        }
        Ok((total, system.available_memory()))
    }
}

/// Computes utilization percentages from a probe.
pub struct ResourceSampler {
    probe: Box<dyn ResourceProbe>,
}

impl ResourceSampler {
    pub fn new(probe: impl ResourceProbe + 'static) -> Self {
        Self {
            probe: Box::new(probe),
        }
    }

    /// Sampler reading the current host.
    pub fn host() -> Self {
        Self::new(HostProbe)
    }

    /// Load average per processing unit, rounded to two places, as a percentage.
    pub fn sample_cpu_utilization(&self) -> f64 {
        let ratio = self
            .probe
            .load_average()
            .and_then(|load| Ok(load / self.probe.cpu_count()?.get() as f64));
        match ratio {
            Ok(ratio) => round2(ratio) * 100.0,
            Err(e) => {
                tracing::warn!(error = %e, "CPU sample unavailable, reporting zero");
                0.0
            }
        }
    }

    /// Used memory as a percentage of total, rounded to two places.
    pub fn sample_memory_utilization(&self) -> f64 {
        match self.probe.memory() {
            Ok((total, free)) if total > 0 => {
                let used = total.saturating_sub(free);
                round2(used as f64 / total as f64 * 100.0)
            }
            Ok(_) => {
                tracing::warn!("Host reported zero total memory, reporting zero");
                0.0
            }
            Err(e) => {
                tracing::warn!(error = %e, "Memory sample unavailable, reporting zero");
                0.0
            }
        }
    }
}

impl Default for ResourceSampler {
    fn default() -> Self {
        Self::host()
    }
}

fn round2(value: f64) -> f64 {
    if value.is_finite() {
        (value * 100.0).round() / 100.0
    } else {
        0.0
    }
}
