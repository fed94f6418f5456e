//! HTTP server for the self-metrics and device-proxy endpoints.

use std::sync::Arc;

use axum::Router;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info};

use crate::adapter::DeviceAdapter;
use crate::config::{HttpConfig, ListenAddr};
use crate::exporter_metrics::ExporterMetrics;
use crate::metrics::CONTENT_TYPE;

/// Application state shared across handlers.
///
/// Everything in here is immutable or atomic; handlers never take locks.
#[derive(Clone)]
pub struct AppState {
    pub adapter: Arc<DeviceAdapter>,
    pub exporter_metrics: Arc<ExporterMetrics>,
}

/// Create the HTTP router.
pub fn create_router(state: AppState, config: &HttpConfig) -> Router {
    Router::new()
        .route(&config.metrics_path, get(metrics_handler))
        .route(&config.device_path, get(device_handler))
        .route("/health", get(health_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Handler for the exporter's own metrics.
async fn metrics_handler(State(state): State<AppState>) -> Response {
    match state.exporter_metrics.render() {
        Ok(body) => (StatusCode::OK, [("content-type", CONTENT_TYPE)], body).into_response(),
        Err(e) => {
            error!(error = %e, "Failed to encode exporter metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, "failed to encode metrics\n").into_response()
        }
    }
}

/// Handler for the device-proxy endpoint.
///
/// Only the first `host` parameter counts; other parameters are ignored.
async fn device_handler(
    State(state): State<AppState>,
    Query(params): Query<Vec<(String, String)>>,
) -> Response {
    let host = params
        .iter()
        .find(|(k, _)| k == "host")
        .map(|(_, v)| v.as_str());

    state.adapter.handle(host).await
}

/// Handler for the /health endpoint.
async fn health_handler() -> Response {
    (StatusCode::OK, "healthy\n").into_response()
}

/// HTTP server configuration.
pub struct HttpServer {
    state: AppState,
    config: HttpConfig,
}

impl HttpServer {
    /// Create a new HTTP server.
    pub fn new(state: AppState, config: HttpConfig) -> Self {
        Self { state, config }
    }

    /// Bind the listening socket.
    ///
    /// Host names are resolved here. `:port` tries IPv6 dual-stack first and
    /// falls back to IPv4. Failing here is fatal for the process.
    pub async fn bind(addr: &ListenAddr) -> anyhow::Result<TcpListener> {
        let mut last_error = None;

        for candidate in addr.bind_candidates() {
            match TcpListener::bind(candidate.as_str()).await {
                Ok(listener) => return Ok(listener),
                Err(e) => {
                    debug!(addr = %candidate, error = %e, "Bind attempt failed");
                    last_error = Some(e);
                }
            }
        }

        Err(anyhow::anyhow!(
            "Failed to bind to {}: {}",
            addr,
            last_error.map(|e| e.to_string()).unwrap_or_default()
        ))
    }

    /// Serve on an already bound listener until the shutdown signal is received.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: watch::Receiver<bool>,
    ) -> anyhow::Result<()> {
        let router = create_router(self.state, &self.config);
        let addr = listener.local_addr()?;

        info!(
            addr = %addr,
            metrics_path = %self.config.metrics_path,
            device_path = %self.config.device_path,
            "Listening for http connections"
        );

        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                loop {
                    if shutdown.changed().await.is_err() {
                        break;
                    }
                    if *shutdown.borrow() {
                        break;
                    }
                }
                info!("HTTP server shutting down");
            })
            .await
            .map_err(|e| anyhow::anyhow!("HTTP server error: {}", e))?;

        info!("HTTP server stopped");
        Ok(())
    }
}
