use axum::{extract::State, Json};
use serde::Serialize;

use crate::admin::AdminState;
use crate::telemetry::RegistrySnapshot;

#[derive(Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub version: &'static str,
}

pub async fn get_health() -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Current cumulative values, as the exporter would read them.
pub async fn get_metrics(State(state): State<AdminState>) -> Json<RegistrySnapshot> {
    Json(state.registry.snapshot())
}
