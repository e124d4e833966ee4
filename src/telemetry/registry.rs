//! Metric registry.
//!
//! # Responsibilities
//! - Hold every counter, gauge and accumulator for the process
//! - Lazily create per-endpoint traffic counters
//! - Provide a read-only snapshot for the exporter and the admin API
//!
//! # Design Decisions
//! - One explicit registry object shared through `Arc`, no ambient globals
//! - Every field is atomic; no cross-field consistency is offered
//! - Entries are never evicted: values are cumulative for the process lifetime

use dashmap::DashMap;
use serde::Serialize;
use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

/// Result of a business event (authentication or order creation).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure,
}

impl Outcome {
    pub fn from_success(success: bool) -> Self {
        if success {
            Outcome::Success
        } else {
            Outcome::Failure
        }
    }
}

/// Collaborators report outcomes as strings; anything but `"success"` is a failure.
impl FromStr for Outcome {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Outcome::from_success(s == "success"))
    }
}

/// Latency accumulator selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LatencyBucket {
    /// Every instrumented HTTP request.
    Http,
    /// Order creation requests only.
    Order,
}

impl LatencyBucket {
    /// Attribute value used on the wire.
    pub fn label(&self) -> &'static str {
        match self {
            LatencyBucket::Http => "http",
            LatencyBucket::Order => "pizza",
        }
    }
}

/// A family of counters keyed by a single label value.
#[derive(Debug, Default)]
pub struct LabeledCounterFamily {
    counters: DashMap<String, AtomicU64>,
}

impl LabeledCounterFamily {
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment the counter for `label`, creating it on first use.
    pub fn increment(&self, label: &str) {
        // Fast path avoids allocating the key once the counter exists.
        if let Some(counter) = self.counters.get(label) {
            counter.fetch_add(1, Ordering::Relaxed);
            return;
        }
        self.counters
            .entry(label.to_string())
            .or_default()
            .fetch_add(1, Ordering::Relaxed);
    }

    /// Current value for `label`, zero if never observed.
    pub fn get(&self, label: &str) -> u64 {
        self.counters
            .get(label)
            .map(|c| c.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.counters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counters.is_empty()
    }

    /// Copy of every (label, count) pair, sorted by label.
    pub fn snapshot(&self) -> BTreeMap<String, u64> {
        self.counters
            .iter()
            .map(|r| (r.key().clone(), r.value().load(Ordering::Relaxed)))
            .collect()
    }
}

/// `f64` running sum stored as its bit pattern.
#[derive(Debug, Default)]
struct AtomicF64 {
    bits: AtomicU64,
}

impl AtomicF64 {
    fn add(&self, value: f64) {
        // fetch_update retries on contention, so concurrent adds are never lost.
        let _ = self
            .bits
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |bits| {
                Some((f64::from_bits(bits) + value).to_bits())
            });
    }

    fn load(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::Acquire))
    }
}

/// Process-wide metric state.
#[derive(Debug, Default)]
pub struct MetricRegistry {
    requests: LabeledCounterFamily,
    active_users: AtomicI64,
    auth_successful: AtomicU64,
    auth_failed: AtomicU64,
    pizzas_sold: AtomicU64,
    failed_creations: AtomicU64,
    revenue: AtomicF64,
    http_latency_ms: AtomicU64,
    order_latency_ms: AtomicU64,
}

impl MetricRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Per-endpoint traffic counters.
    pub fn requests(&self) -> &LabeledCounterFamily {
        &self.requests
    }

    pub fn increment_active(&self) {
        self.active_users.fetch_add(1, Ordering::Relaxed);
    }

    pub fn decrement_active(&self) {
        self.active_users.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn active_users(&self) -> i64 {
        self.active_users.load(Ordering::Relaxed)
    }

    pub fn add_latency(&self, bucket: LatencyBucket, elapsed_ms: u64) {
        let acc = match bucket {
            LatencyBucket::Http => &self.http_latency_ms,
            LatencyBucket::Order => &self.order_latency_ms,
        };
        acc.fetch_add(elapsed_ms, Ordering::Relaxed);
    }

    pub fn latency_ms(&self, bucket: LatencyBucket) -> u64 {
        match bucket {
            LatencyBucket::Http => self.http_latency_ms.load(Ordering::Relaxed),
            LatencyBucket::Order => self.order_latency_ms.load(Ordering::Relaxed),
        }
    }

    pub fn record_auth(&self, outcome: Outcome) {
        match outcome {
            Outcome::Success => self.auth_successful.fetch_add(1, Ordering::Relaxed),
            Outcome::Failure => self.auth_failed.fetch_add(1, Ordering::Relaxed),
        };
    }

    /// Record an order attempt. `price` only counts towards revenue on success.
    ///
    /// Negative or non-finite prices still count the sale but leave revenue unchanged.
    pub fn record_order(&self, outcome: Outcome, price: f64) {
        match outcome {
            Outcome::Success => {
                self.pizzas_sold.fetch_add(1, Ordering::Relaxed);
                if price.is_finite() && price >= 0.0 {
                    self.revenue.add(price);
                } else {
                    tracing::warn!(price, "Ignoring invalid order price for revenue");
                }
            }
            Outcome::Failure => {
                self.failed_creations.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    /// Read every value. Reads are independent, not an atomic cut.
    pub fn snapshot(&self) -> RegistrySnapshot {
        RegistrySnapshot {
            requests: self.requests.snapshot(),
            active_users: self.active_users(),
            auth: AuthCounts {
                successful: self.auth_successful.load(Ordering::Relaxed),
                failed: self.auth_failed.load(Ordering::Relaxed),
            },
            pizzas: PizzaCounts {
                sold: self.pizzas_sold.load(Ordering::Relaxed),
                failed_creations: self.failed_creations.load(Ordering::Relaxed),
                revenue: self.revenue.load(),
            },
            latency: LatencyTotals {
                http_ms: self.latency_ms(LatencyBucket::Http),
                order_ms: self.latency_ms(LatencyBucket::Order),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegistrySnapshot {
    pub requests: BTreeMap<String, u64>,
    pub active_users: i64,
    pub auth: AuthCounts,
    pub pizzas: PizzaCounts,
    pub latency: LatencyTotals,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AuthCounts {
    pub successful: u64,
    pub failed: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PizzaCounts {
    pub sold: u64,
    pub failed_creations: u64,
    pub revenue: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LatencyTotals {
    pub http_ms: u64,
    pub order_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_endpoint_counters_created_lazily() {
        let registry = MetricRegistry::new();
        assert!(registry.requests().is_empty());
        assert_eq!(registry.requests().get("/api/order"), 0);

        for _ in 0..5 {
            registry.requests().increment("/api/order");
        }
        registry.requests().increment("/api/auth");

        assert_eq!(registry.requests().len(), 2);
        assert_eq!(registry.requests().get("/api/order"), 5);
        assert_eq!(registry.requests().get("/api/auth"), 1);
    }

    #[test]
    fn test_gauge_moves_both_ways() {
        let registry = MetricRegistry::new();
        registry.increment_active();
        registry.increment_active();
        registry.decrement_active();
        assert_eq!(registry.active_users(), 1);
        registry.decrement_active();
        registry.decrement_active();
        assert_eq!(registry.active_users(), -1);
    }

    #[test]
    fn test_auth_outcomes() {
        let registry = MetricRegistry::new();
        for outcome in [Outcome::Success, Outcome::Failure, Outcome::Success] {
            registry.record_auth(outcome);
        }
        let snap = registry.snapshot();
        assert_eq!(snap.auth, AuthCounts { successful: 2, failed: 1 });
    }

    #[test]
    fn test_order_failure_ignores_price() {
        let registry = MetricRegistry::new();
        registry.record_order(Outcome::Success, 0.05);
        registry.record_order(Outcome::Failure, 100.0);
        let snap = registry.snapshot();
        assert_eq!(snap.pizzas.sold, 1);
        assert_eq!(snap.pizzas.failed_creations, 1);
        assert_eq!(snap.pizzas.revenue, 0.05);
    }

    #[test]
    fn test_negative_price_does_not_lower_revenue() {
        let registry = MetricRegistry::new();
        registry.record_order(Outcome::Success, 10.0);
        registry.record_order(Outcome::Success, -4.0);
        let snap = registry.snapshot();
        assert_eq!(snap.pizzas.sold, 2);
        assert_eq!(snap.pizzas.revenue, 10.0);
    }

    #[test]
    fn test_non_finite_price_does_not_poison_revenue() {
        let registry = MetricRegistry::new();
        registry.record_order(Outcome::Success, 10.0);
        registry.record_order(Outcome::Success, f64::NAN);
        registry.record_order(Outcome::Success, f64::INFINITY);
        registry.record_order(Outcome::Success, 5.0);
        let snap = registry.snapshot();
        assert_eq!(snap.pizzas.sold, 4);
        assert_eq!(snap.pizzas.revenue, 15.0);
    }

    #[test]
    fn test_latency_buckets_are_separate() {
        let registry = MetricRegistry::new();
        registry.add_latency(LatencyBucket::Http, 12);
        registry.add_latency(LatencyBucket::Http, 8);
        registry.add_latency(LatencyBucket::Order, 40);
        assert_eq!(registry.latency_ms(LatencyBucket::Http), 20);
        assert_eq!(registry.latency_ms(LatencyBucket::Order), 40);
    }

    #[test]
    fn test_outcome_parsing() {
        assert_eq!("success".parse::<Outcome>(), Ok(Outcome::Success));
        assert_eq!("failure".parse::<Outcome>(), Ok(Outcome::Failure));
        assert_eq!("anything".parse::<Outcome>(), Ok(Outcome::Failure));
    }

    #[test]
    fn test_concurrent_updates_are_not_lost() {
        let registry = Arc::new(MetricRegistry::new());
        let mut handles = Vec::new();

        for _ in 0..8 {
            let registry = registry.clone();
            handles.push(std::thread::spawn(move || {
                for _ in 0..1000 {
                    registry.requests().increment("/api/order");
                    registry.record_order(Outcome::Success, 0.5);
                    registry.record_auth(Outcome::Failure);
                    registry.increment_active();
                    registry.decrement_active();
                }
            }));
        }
        for h in handles {
            h.join().unwrap();
        }

        let snap = registry.snapshot();
        assert_eq!(snap.requests["/api/order"], 8000);
        assert_eq!(snap.pizzas.sold, 8000);
        // 0.5 is exact in binary, so the sum is exact regardless of order.
        assert_eq!(snap.pizzas.revenue, 4000.0);
        assert_eq!(snap.auth.failed, 8000);
        assert_eq!(snap.active_users, 0);
    }
}
