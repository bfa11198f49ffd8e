//! Query Service
//!
//! An Axum service hosting the rule registry and the pre-evaluation check
//! that skips rules whose sub-queries are all disabled.
//!
//! # Architecture Overview
//!
//! ```text
//!                 ┌────────────────────────── query-service ──────────────────────────┐
//!                 │                                                                   │
//!   Client ──────▶│  http::server ──▶ handlers ──▶ rules::manager (registry)          │
//!                 │                                      │                            │
//!                 │                                      ▼                            │
//!                 │               rules::scheduler ──▶ api_params (all disabled?)     │
//!                 │                                      │ no                         │
//!                 │                                      ▼                            │
//!                 │                               QueryExecutor                       │
//!                 │                                                                   │
//!                 │  ┌─────────────────── Cross-Cutting Concerns ──────────────────┐  │
//!                 │  │  config   observability (logs, metrics, spans)   lifecycle  │  │
//!                 │  └─────────────────────────────────────────────────────────────┘  │
//!                 └───────────────────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use query_service::config::{load_config, ServiceConfig};
use query_service::http::HttpServer;
use query_service::lifecycle::{signals, startup, Shutdown};
use query_service::observability::tracing::{pipeline, LogExporter};
use query_service::observability::{logging, metrics};
use query_service::rules::{LoggingExecutor, RuleManager, RuleScheduler};

#[derive(Parser)]
#[command(name = "query-service", version, about = "Rule pre-check and query API service")]
struct Args {
    /// Path to a TOML config file. Defaults apply when omitted.
    #[arg(short, long, env = "QUERY_SERVICE_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => ServiceConfig::default(),
    };

    // Telemetry pipeline has to exist before the subscriber is installed.
    let (span_layer, telemetry) = if config.telemetry.enabled {
        let (layer, guard) = pipeline(&config.telemetry, Arc::new(LogExporter));
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };
    logging::init_logging(&config.observability, span_layer)?;

    tracing::info!("query-service v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        config_path = ?args.config,
        bind_address = %config.listener.bind_address,
        request_timeout_secs = config.timeouts.request_secs,
        telemetry = config.telemetry.enabled,
        rules_enabled = config.rules.enabled,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let shutdown = Shutdown::new();
    let rules = RuleManager::new();

    let scheduler = RuleScheduler::new(rules.clone(), Arc::new(LoggingExecutor), config.rules.clone());
    let scheduler_task = tokio::spawn(scheduler.run(shutdown.subscribe()));

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let local_addr = listener.local_addr()?;
    tracing::info!(address = %local_addr, "Listening for connections");

    let self_check = config.startup.self_check;
    let server = HttpServer::new(config, rules);
    let server_task = tokio::spawn(server.run(listener, shutdown.subscribe()));

    if self_check {
        tokio::spawn(startup::self_check(local_addr));
    }

    let server_result = shutdown
        .supervise(server_task, signals::wait_for_signal())
        .await?;

    scheduler_task.await?;
    server_result?;

    if let Some(telemetry) = telemetry {
        telemetry.shutdown().await;
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
