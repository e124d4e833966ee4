//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Merge the application routes (already instrumented by their owners)
//!   with `/health` and the optional admin routes
//! - Wire up timeout and trace middleware
//! - Serve until the shutdown broadcast fires

use axum::{routing::get, Router};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::admin::{self, handlers, AdminState};
use crate::config::TelemetryConfig;
use crate::lifecycle::shutdown;
use crate::telemetry::MetricRegistry;

/// HTTP server hosting the instrumented application.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Build the server around `app`.
    pub fn new(config: &TelemetryConfig, registry: Arc<MetricRegistry>, app: Router) -> Self {
        let router = Self::build_router(config, registry, app);
        Self { router }
    }

    #[allow(deprecated)]
    fn build_router(config: &TelemetryConfig, registry: Arc<MetricRegistry>, app: Router) -> Router {
        let mut router = app.route("/health", get(handlers::get_health));

        if config.admin.enabled {
            router = router.merge(admin::router(AdminState {
                registry,
                api_key: config.admin.api_key.as_str().into(),
            }));
        }

        router
            .layer(TimeoutLayer::new(Duration::from_secs(config.server.request_timeout_secs)))
            .layer(TraceLayer::new_for_http())
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(self, listener: TcpListener, shutdown: broadcast::Receiver<()>) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown::wait(shutdown))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
