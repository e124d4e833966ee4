//! Request instrumentation hooks.
//!
//! # Responsibilities
//! - Count traffic per endpoint
//! - Move the active-user gauge on successful login/logout responses
//! - Accumulate request latency per bucket
//! - Record authentication and order business events
//!
//! # Design Decisions
//! - Hooks are axum middleware attached per route with `from_fn_with_state`
//! - Completion callbacks fire exactly once: with the status when a response
//!   is produced, or as aborted when the request future is dropped
//! - Hooks only touch the registry; no I/O on the request path
//!
//! ```ignore
//! let instr = Instrumentation::new(registry);
//! let app = Router::new().route(
//!     "/api/order",
//!     post(create_order)
//!         .layer(middleware::from_fn_with_state(instr.latency(LatencyBucket::Order), time_latency))
//!         .layer(middleware::from_fn_with_state(instr.endpoint("/api/order"), track_endpoint)),
//! );
//! ```

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use std::time::Instant;

use crate::telemetry::registry::{LatencyBucket, MetricRegistry, Outcome};

/// How a request ended, as seen by a completion callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// A response was produced with this status.
    Finished(StatusCode),
    /// The request future was dropped before producing a response.
    Aborted,
}

impl Completion {
    /// True for a finished response with a 2xx status.
    pub fn is_success(&self) -> bool {
        matches!(self, Completion::Finished(status) if status.is_success())
    }
}

/// Runs its callback exactly once, on `finish` or on drop.
pub struct CompletionGuard<F: FnOnce(Completion)> {
    callback: Option<F>,
}

impl<F: FnOnce(Completion)> CompletionGuard<F> {
    pub fn new(callback: F) -> Self {
        Self {
            callback: Some(callback),
        }
    }

    pub fn finish(mut self, status: StatusCode) {
        if let Some(callback) = self.callback.take() {
            callback(Completion::Finished(status));
        }
    }
}

impl<F: FnOnce(Completion)> Drop for CompletionGuard<F> {
    fn drop(&mut self) {
        if let Some(callback) = self.callback.take() {
            callback(Completion::Aborted);
        }
    }
}

async fn observe_completion<F>(request: Request, next: Next, on_complete: F) -> Response
where
    F: FnOnce(Completion) + Send,
{
    let guard = CompletionGuard::new(on_complete);
    let response = next.run(request).await;
    guard.finish(response.status());
    response
}

/// State for [`track_endpoint`].
#[derive(Clone)]
pub struct EndpointHook {
    registry: Arc<MetricRegistry>,
    endpoint: Arc<str>,
}

/// State for [`time_latency`].
#[derive(Clone)]
pub struct LatencyHook {
    registry: Arc<MetricRegistry>,
    bucket: LatencyBucket,
}

/// Count every request to the endpoint, whatever its eventual status.
pub async fn track_endpoint(State(hook): State<EndpointHook>, request: Request, next: Next) -> Response {
    hook.registry.requests().increment(&hook.endpoint);
    next.run(request).await
}

/// Increment the active-user gauge when the response is 2xx.
pub async fn active_start(
    State(registry): State<Arc<MetricRegistry>>,
    request: Request,
    next: Next,
) -> Response {
    observe_completion(request, next, move |completion| {
        if completion.is_success() {
            registry.increment_active();
        }
    })
    .await
}

/// Decrement the active-user gauge when the response is 2xx.
pub async fn active_end(
    State(registry): State<Arc<MetricRegistry>>,
    request: Request,
    next: Next,
) -> Response {
    observe_completion(request, next, move |completion| {
        if completion.is_success() {
            registry.decrement_active();
        }
    })
    .await
}

/// Add the time to response to the hook's latency bucket.
///
/// The clock stops when the handler returns its response, so body transfer
/// time is not included. Aborted requests are not timed.
pub async fn time_latency(State(hook): State<LatencyHook>, request: Request, next: Next) -> Response {
    let started = Instant::now();
    let uri = request.uri().clone();
    observe_completion(request, next, move |completion| match completion {
        Completion::Finished(_) => {
            let elapsed_ms = started.elapsed().as_millis() as u64;
            hook.registry.add_latency(hook.bucket, elapsed_ms);
        }
        Completion::Aborted => {
            tracing::debug!(path = uri.path(), bucket = hook.bucket.label(), "Request aborted before completion, latency not recorded");
        }
    })
    .await
}

/// Handle given to route collaborators.
#[derive(Clone)]
pub struct Instrumentation {
    registry: Arc<MetricRegistry>,
}

impl Instrumentation {
    pub fn new(registry: Arc<MetricRegistry>) -> Self {
        Self { registry }
    }

    /// Registry state for [`active_start`] and [`active_end`].
    pub fn registry(&self) -> Arc<MetricRegistry> {
        self.registry.clone()
    }

    pub fn endpoint(&self, endpoint: &str) -> EndpointHook {
        EndpointHook {
            registry: self.registry.clone(),
            endpoint: endpoint.into(),
        }
    }

    pub fn latency(&self, bucket: LatencyBucket) -> LatencyHook {
        LatencyHook {
            registry: self.registry.clone(),
            bucket,
        }
    }

    /// Called once per login or registration attempt.
    pub fn record_auth_event(&self, outcome: Outcome) {
        self.registry.record_auth(outcome);
    }

    /// Called once per order creation attempt.
    pub fn record_order_event(&self, outcome: Outcome, price: f64) {
        self.registry.record_order(outcome, price);
    }
}
