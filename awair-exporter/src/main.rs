//! Prometheus exporter for Awair air-quality sensors.

use std::sync::Arc;

use clap::Parser;
use tokio::sync::watch;
use tracing::{Level, error, info};
use tracing_subscriber::EnvFilter;

use awair_exporter::config::LogFormat;
use awair_exporter::{
    AppState, DeviceAdapter, DeviceClient, ExporterConfig, ExporterMetrics, HttpServer, MetricSet,
};

/// Prometheus exporter for Awair air-quality sensors.
#[derive(Parser, Debug)]
#[command(name = "awair-exporter")]
#[command(about = "Export Awair local API readings as Prometheus metrics")]
#[command(version)]
struct Args {
    /// Path to configuration file (JSON5 format).
    #[arg(short, long)]
    config: Option<String>,

    /// The address to listen on for HTTP requests (overrides config).
    #[arg(long)]
    listen_address: Option<String>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Load configuration
    let mut config = if let Some(config_path) = &args.config {
        ExporterConfig::load_from_file(config_path)?
    } else {
        ExporterConfig::default()
    };

    // CLI overrides
    if let Some(listen) = args.listen_address {
        config.http.listen = listen;
    }
    if let Some(level) = args.log_level {
        config.logging.level = level;
    }
    config.validate()?;

    // Initialize logging
    let log_level = config.logging.level.parse().unwrap_or(Level::INFO);
    let filter = EnvFilter::from_default_env()
        .add_directive(format!("awair_exporter={}", log_level).parse()?)
        .add_directive(format!("tower_http={}", Level::WARN).parse()?);

    match config.logging.format {
        LogFormat::Json => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .json()
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::fmt().with_env_filter(filter).init();
        }
    }

    info!(version = env!("CARGO_PKG_VERSION"), "Starting Awair exporter");

    let listen_addr = config.listen_addr()?;

    // Process-wide state, immutable apart from atomics
    let exporter_metrics = Arc::new(ExporterMetrics::new());
    let client = DeviceClient::new(&config.device)
        .map_err(|e| anyhow::anyhow!("Failed to build HTTP client: {}", e))?;
    let adapter = DeviceAdapter::new(
        client,
        MetricSet::new(config.device.metric_prefix.clone()),
        exporter_metrics.clone(),
    );
    let state = AppState {
        adapter: Arc::new(adapter),
        exporter_metrics,
    };

    // No purpose without a socket: bind failure ends the process
    let listener = match HttpServer::bind(&listen_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(addr = %listen_addr, "{}", e);
            return Err(e);
        }
    };

    // Create shutdown signal
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    tokio::spawn(async move {
        wait_for_signal().await;
        let _ = shutdown_tx.send(true);
    });

    HttpServer::new(state, config.http.clone())
        .run(listener, shutdown_rx)
        .await?;

    info!("Exporter stopped");
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM.
async fn wait_for_signal() {
    #[cfg(unix)]
    {
        let mut sigterm =
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(signal) => signal,
                Err(e) => {
                    error!("Failed to install SIGTERM handler: {}", e);
                    let _ = tokio::signal::ctrl_c().await;
                    info!("Received Ctrl+C, shutting down...");
                    return;
                }
            };

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down...");
            }
            _ = sigterm.recv() => {
                info!("Received SIGTERM, shutting down...");
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
        info!("Received Ctrl+C, shutting down...");
    }
}
