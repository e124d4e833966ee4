use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;

use pizza_telemetry::config::load_config;
use pizza_telemetry::{Exporter, MetricRegistry};

#[derive(Parser)]
#[command(name = "telemetry-cli")]
#[command(about = "Management CLI for the pizza telemetry host", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:3000")]
    url: String,

    #[arg(short, long, default_value = "")]
    key: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check the host is up
    Health,
    /// Show current cumulative metric values
    Metrics,
    /// Push one flush of zeroed metrics to the configured backend
    TestPush {
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let mut headers = HeaderMap::new();
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", cli.key))?,
    );

    match cli.command {
        Commands::Health => {
            let res = client.get(format!("{}/health", cli.url)).send().await?;
            print_response(res).await?;
        }
        Commands::Metrics => {
            let res = client
                .get(format!("{}/admin/metrics", cli.url))
                .headers(headers)
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::TestPush { config } => {
            let config = load_config(config.as_deref())?;
            let exporter = Exporter::from_config(Arc::new(MetricRegistry::new()), &config.metrics)?;
            let summary = exporter.flush().await;
            println!("sent: {}, failed: {}", summary.sent, summary.failed);
        }
    }

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: host returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
