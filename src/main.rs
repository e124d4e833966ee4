//! Pizza telemetry host.
//!
//! Runs the metrics exporter alongside an HTTP listener exposing `/health`
//! and, when enabled, `/admin/metrics`. Route owners embed the library and
//! pass their instrumented router to [`HttpServer::new`]; this binary serves
//! an empty application so host resource metrics are still pushed.
//!
//! ```text
//!   request ──▶ hooks ──▶ MetricRegistry ◀── Exporter (every interval)
//!                                               │  + ResourceSampler
//!                                               ▼
//!                                        OTLP/JSON POST ──▶ backend
//! ```

use axum::Router;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;

use pizza_telemetry::config::load_config;
use pizza_telemetry::lifecycle::signals::wait_for_signal;
use pizza_telemetry::observability::init_logging;
use pizza_telemetry::{Exporter, HttpServer, MetricRegistry, Shutdown};

#[derive(Parser)]
#[command(name = "pizza-telemetry")]
#[command(about = "Telemetry exporter for the pizza service", long_about = None)]
struct Cli {
    /// TOML configuration file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    init_logging(&config.observability)?;

    tracing::info!(
        bind_address = %config.server.bind_address,
        metrics_enabled = config.metrics.enabled,
        metrics_url = %config.metrics.url,
        interval_secs = config.metrics.interval_secs,
        "Configuration loaded"
    );

    let registry = Arc::new(MetricRegistry::new());
    let shutdown = Shutdown::new();

    let exporter = if config.metrics.enabled {
        let exporter = Exporter::from_config(registry.clone(), &config.metrics)?;
        Some(exporter.spawn(shutdown.subscribe()))
    } else {
        tracing::info!("Metrics export disabled");
        None
    };

    let listener = TcpListener::bind(&config.server.bind_address).await?;
    let server = HttpServer::new(&config, registry, Router::new());
    let server_shutdown = shutdown.subscribe();
    let server_task = tokio::spawn(server.run(listener, server_shutdown));

    wait_for_signal().await;
    shutdown.trigger();

    match server_task.await {
        Ok(result) => result?,
        Err(e) => tracing::error!(error = %e, "HTTP server task failed"),
    }
    if let Some(exporter) = exporter {
        exporter.join().await;
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
