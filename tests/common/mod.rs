//! Shared utilities for integration tests.

use axum::{
    body::Bytes,
    http::{header, HeaderMap, StatusCode},
    routing::post,
    Router,
};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

use pizza_telemetry::telemetry::exporter::{Exporter, ExporterOptions, PushClient};
use pizza_telemetry::telemetry::{MetricRegistry, ResourceSampler};

pub const API_KEY: &str = "test-key";
pub const SOURCE: &str = "jwt-pizza-service-test";

/// One request received by the mock collector.
#[derive(Debug, Clone)]
pub struct Received {
    pub authorization: Option<String>,
    pub content_type: Option<String>,
    pub body: serde_json::Value,
}

/// A metrics backend that records every push and answers with a fixed status.
pub struct MockCollector {
    pub addr: SocketAddr,
    received: Arc<Mutex<Vec<Received>>>,
}

impl MockCollector {
    pub fn url(&self) -> String {
        format!("http://{}/v1/metrics", self.addr)
    }

    pub fn received(&self) -> Vec<Received> {
        self.received.lock().unwrap().clone()
    }

    /// Find the single push with this metric name and first attribute value.
    pub fn find(&self, name: &str, label: &str) -> Option<serde_json::Value> {
        self.received().into_iter().map(|r| r.body).find(|body| {
            let metric = &body["resourceMetrics"][0]["scopeMetrics"][0]["metrics"][0];
            metric["name"] == name
                && metric["sum"]["dataPoints"][0]["attributes"][0]["value"]["stringValue"] == label
        })
    }
}

pub async fn start_mock_collector(status: StatusCode) -> MockCollector {
    start_slow_collector(status, Duration::ZERO).await
}

/// Like [`start_mock_collector`], but holds every reply for `delay`.
/// Pushes are recorded on arrival, before the delay.
pub async fn start_slow_collector(status: StatusCode, delay: Duration) -> MockCollector {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let received = Arc::new(Mutex::new(Vec::new()));

    let sink = received.clone();
    let app = Router::new().route(
        "/v1/metrics",
        post(move |headers: HeaderMap, body: Bytes| {
            let sink = sink.clone();
            async move {
                let text = |name: header::HeaderName| {
                    headers
                        .get(name)
                        .and_then(|v| v.to_str().ok())
                        .map(str::to_string)
                };
                sink.lock().unwrap().push(Received {
                    authorization: text(header::AUTHORIZATION),
                    content_type: text(header::CONTENT_TYPE),
                    body: serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null),
                });
                tokio::time::sleep(delay).await;
                status
            }
        }),
    );

    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    MockCollector { addr, received }
}

pub fn exporter(registry: Arc<MetricRegistry>, url: &str, interval: Duration, flush_on_shutdown: bool) -> Exporter {
    exporter_with_timeout(registry, url, interval, flush_on_shutdown, Duration::from_secs(5))
}

pub fn exporter_with_timeout(
    registry: Arc<MetricRegistry>,
    url: &str,
    interval: Duration,
    flush_on_shutdown: bool,
    timeout: Duration,
) -> Exporter {
    let http = reqwest::Client::builder()
        .timeout(timeout)
        .no_proxy()
        .build()
        .unwrap();
    let client = PushClient::with_client(http, url, API_KEY, timeout);
    Exporter::new(
        registry,
        ResourceSampler::host(),
        client,
        ExporterOptions {
            source: SOURCE.to_string(),
            interval,
            flush_on_shutdown,
        },
    )
}
