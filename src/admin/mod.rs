//! Operator endpoints.
//!
//! `GET /admin/metrics` exposes the registry snapshot behind a bearer key.

pub mod auth;
pub mod handlers;

use axum::{middleware, routing::get, Router};
use std::sync::Arc;

use crate::telemetry::MetricRegistry;

#[derive(Clone)]
pub struct AdminState {
    pub registry: Arc<MetricRegistry>,
    pub api_key: Arc<str>,
}

/// Admin routes, authenticated.
pub fn router(state: AdminState) -> Router {
    Router::new()
        .route("/admin/metrics", get(handlers::get_metrics))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::admin_auth_middleware))
        .with_state(state)
}
