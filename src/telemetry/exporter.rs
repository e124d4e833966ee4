//! Periodic metric export.
//!
//! # Responsibilities
//! - Read the registry and a fresh resource sample once per tick
//! - Encode every metric as its own OTLP/JSON payload
//! - POST payloads to the backend with bearer authentication
//!
//! # Design Decisions
//! - Each tick's flush runs in its own task so a slow backend never
//!   delays the next tick
//! - Pushes inside a flush run concurrently, each bounded by the client timeout
//! - Failures are logged and dropped; cumulative values are re-sent next tick

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::config::MetricsConfig;
use crate::telemetry::encoder::{self, ExportPayload, MetricValue};
use crate::telemetry::error::{ExportError, ExportResult};
use crate::telemetry::registry::{LatencyBucket, MetricRegistry, RegistrySnapshot};
use crate::telemetry::sampler::ResourceSampler;

/// HTTP transport to the metrics backend.
#[derive(Clone)]
pub struct PushClient {
    client: reqwest::Client,
    url: Arc<str>,
    api_key: Arc<str>,
    timeout: Duration,
}

impl PushClient {
    pub fn new(url: &str, api_key: &str, timeout: Duration) -> ExportResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ExportError::Transport)?;
        Ok(Self::with_client(client, url, api_key, timeout))
    }

    /// Use a preconfigured client. `timeout` is only used in error reports.
    pub fn with_client(client: reqwest::Client, url: &str, api_key: &str, timeout: Duration) -> Self {
        Self {
            client,
            url: url.into(),
            api_key: api_key.into(),
            timeout,
        }
    }

    /// POST one payload. Any non-2xx response is an error.
    pub async fn push(&self, payload: &ExportPayload) -> ExportResult<()> {
        let response = self
            .client
            .post(&*self.url)
            .bearer_auth(&*self.api_key)
            .json(payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ExportError::Timeout(self.timeout.as_secs())
                } else {
                    ExportError::Transport(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ExportError::Status(status));
        }
        Ok(())
    }
}

/// One metric to send during a tick.
#[derive(Debug, Clone, PartialEq)]
pub struct Emission {
    pub name: &'static str,
    pub value: MetricValue,
    pub labels: Vec<(&'static str, String)>,
}

impl Emission {
    fn new(name: &'static str, value: MetricValue, key: &'static str, label: impl Into<String>) -> Self {
        Self {
            name,
            value,
            labels: vec![(key, label.into())],
        }
    }

    pub fn encode(&self, source: &str, time_unix_nano: u64) -> ExportPayload {
        let labels: Vec<(&str, &str)> = self.labels.iter().map(|(k, v)| (*k, v.as_str())).collect();
        encoder::encode(self.name, self.value, &labels, source, time_unix_nano)
    }
}

/// Build the full set of emissions for one tick.
pub fn collect_emissions(snapshot: &RegistrySnapshot, cpu_usage: f64, memory_usage: f64) -> Vec<Emission> {
    let mut emissions: Vec<Emission> = snapshot
        .requests
        .iter()
        .map(|(endpoint, count)| {
            Emission::new("requests", MetricValue::Int(saturating_i64(*count)), "endpoint", endpoint.as_str())
        })
        .collect();

    emissions.extend([
        Emission::new("authentication", MetricValue::Int(saturating_i64(snapshot.auth.successful)), "result", "successful"),
        Emission::new("authentication", MetricValue::Int(saturating_i64(snapshot.auth.failed)), "result", "failed"),
        // Declared monotonic on the wire even though it can go down.
        Emission::new("users", MetricValue::Int(snapshot.active_users), "users", "users"),
        Emission::new("system", MetricValue::Double(cpu_usage), "system", "cpuUsage"),
        Emission::new("system", MetricValue::Double(memory_usage), "system", "memoryUsage"),
        Emission::new("pizzas", MetricValue::Int(saturating_i64(snapshot.pizzas.sold)), "metric", "pizzasSold"),
        Emission::new("pizzas", MetricValue::Int(saturating_i64(snapshot.pizzas.failed_creations)), "metric", "failedCreations"),
        Emission::new("pizzas", MetricValue::Double(snapshot.pizzas.revenue), "metric", "revenue"),
        Emission::new("latency", MetricValue::Double(snapshot.latency.http_ms as f64), "latency", LatencyBucket::Http.label()),
        Emission::new("latency", MetricValue::Double(snapshot.latency.order_ms as f64), "latency", LatencyBucket::Order.label()),
    ]);

    emissions
}

fn saturating_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

/// Outcome of one flush.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushSummary {
    pub sent: usize,
    pub failed: usize,
}

/// Exporter tuning independent of the transport.
#[derive(Debug, Clone)]
pub struct ExporterOptions {
    pub source: String,
    pub interval: Duration,
    pub flush_on_shutdown: bool,
}

impl From<&MetricsConfig> for ExporterOptions {
    fn from(config: &MetricsConfig) -> Self {
        Self {
            source: config.source.clone(),
            interval: Duration::from_secs(config.interval_secs),
            flush_on_shutdown: config.flush_on_shutdown,
        }
    }
}

pub struct Exporter {
    registry: Arc<MetricRegistry>,
    sampler: ResourceSampler,
    client: PushClient,
    options: ExporterOptions,
}

impl Exporter {
    pub fn new(
        registry: Arc<MetricRegistry>,
        sampler: ResourceSampler,
        client: PushClient,
        options: ExporterOptions,
    ) -> Self {
        Self {
            registry,
            sampler,
            client,
            options,
        }
    }

    /// Exporter sampling the local host and pushing to the configured backend.
    pub fn from_config(registry: Arc<MetricRegistry>, config: &MetricsConfig) -> ExportResult<Self> {
        let client = PushClient::new(
            &config.url,
            &config.api_key,
            Duration::from_secs(config.request_timeout_secs),
        )?;
        Ok(Self::new(registry, ResourceSampler::host(), client, config.into()))
    }

    /// Sample, encode and push every metric once.
    pub async fn flush(&self) -> FlushSummary {
        let snapshot = self.registry.snapshot();
        let cpu_usage = self.sampler.sample_cpu_utilization();
        let memory_usage = self.sampler.sample_memory_utilization();
        let time_unix_nano = encoder::now_unix_nano();

        let mut pushes = JoinSet::new();
        for emission in collect_emissions(&snapshot, cpu_usage, memory_usage) {
            let client = self.client.clone();
            let payload = emission.encode(&self.options.source, time_unix_nano);
            pushes.spawn(async move {
                match client.push(&payload).await {
                    Ok(()) => true,
                    Err(e) => {
                        tracing::error!(metric = emission.name, labels = ?emission.labels, error = %e, "Failed to push metric");
                        false
                    }
                }
            });
        }

        let mut summary = FlushSummary::default();
        while let Some(result) = pushes.join_next().await {
            match result {
                Ok(true) => summary.sent += 1,
                Ok(false) => summary.failed += 1,
                Err(e) => {
                    tracing::error!(error = %e, "Metric push task failed");
                    summary.failed += 1;
                }
            }
        }

        if summary.failed > 0 {
            tracing::warn!(sent = summary.sent, failed = summary.failed, "Metrics flush incomplete");
        } else {
            tracing::info!(sent = summary.sent, "Metrics flushed");
        }
        summary
    }

    /// Start the recurring export task.
    pub fn spawn(self, shutdown: broadcast::Receiver<()>) -> ExporterHandle {
        ExporterHandle {
            task: tokio::spawn(self.run(shutdown)),
        }
    }

    /// Tick until shutdown. The first tick fires one interval after start.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        let period = self.options.interval;
        let flush_on_shutdown = self.options.flush_on_shutdown;
        let exporter = Arc::new(self);

        tracing::info!(
            interval_secs = period.as_secs_f64(),
            source = %exporter.options.source,
            "Metrics exporter starting"
        );

        let mut ticker = time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let exporter = exporter.clone();
                    tokio::spawn(async move {
                        exporter.flush().await;
                    });
                }
                _ = shutdown.recv() => {
                    tracing::info!("Metrics exporter received shutdown signal, exiting loop");
                    break;
                }
            }
        }

        if flush_on_shutdown {
            exporter.flush().await;
        }
    }
}

/// Owner of the running export task.
pub struct ExporterHandle {
    task: JoinHandle<()>,
}

impl ExporterHandle {
    /// Wait for the loop to exit after shutdown has been triggered.
    pub async fn join(self) {
        if let Err(e) = self.task.await {
            tracing::error!(error = %e, "Metrics exporter task failed");
        }
    }
}
