//! The device-proxy scrape: validate the host, poll the device once,
//! translate the reading into gauges.
//!
//! A scrape that reaches the device always answers 200. Device failures are
//! reported as `scrape_errors 1` with the device gauges omitted, so the
//! scraper can alert on them with its own rules.

use std::sync::Arc;
use std::time::Instant;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::{debug, error, warn};

use crate::device::DeviceClient;
use crate::exporter_metrics::{ExporterMetrics, ScrapeOutcome};
use crate::host::DeviceHost;
use crate::metrics::{CONTENT_TYPE, MetricSet, ScrapeReport};

/// Handles device-proxy scrapes.
#[derive(Debug)]
pub struct DeviceAdapter {
    client: DeviceClient,
    metric_set: MetricSet,
    exporter_metrics: Arc<ExporterMetrics>,
}

impl DeviceAdapter {
    pub fn new(
        client: DeviceClient,
        metric_set: MetricSet,
        exporter_metrics: Arc<ExporterMetrics>,
    ) -> Self {
        Self {
            client,
            metric_set,
            exporter_metrics,
        }
    }

    /// Poll a device once.
    ///
    /// Never fails: an unreachable device or an unexpected body yields a
    /// report without a reading.
    pub async fn scrape(&self, host: &DeviceHost) -> ScrapeReport {
        let start = Instant::now();
        let result = self.client.fetch_latest(host).await;
        let elapsed = start.elapsed();

        self.exporter_metrics.observe_device_request(elapsed);

        match result {
            Ok(reading) => {
                debug!(%host, elapsed_ms = elapsed.as_millis() as u64, "Scraped device");
                self.exporter_metrics.record_scrape(ScrapeOutcome::Success);
                ScrapeReport::success(reading, elapsed)
            }
            Err(e) => {
                warn!(%host, error = %e, "Error scraping metrics");
                self.exporter_metrics
                    .record_scrape(ScrapeOutcome::DeviceError);
                ScrapeReport::failure(elapsed)
            }
        }
    }

    /// Serve one scrape for the raw `host` query parameter.
    pub async fn handle(&self, raw_host: Option<&str>) -> Response {
        let host = match DeviceHost::parse(raw_host) {
            Ok(host) => host,
            Err(e) => {
                debug!(host = ?raw_host, "Rejected scrape: {}", e);
                self.exporter_metrics.record_scrape(ScrapeOutcome::Rejected);
                return e.into_response();
            }
        };

        let report = self.scrape(&host).await;

        match self.metric_set.render(&report) {
            Ok(body) => (StatusCode::OK, [("content-type", CONTENT_TYPE)], body).into_response(),
            Err(e) => {
                error!(%host, error = %e, "Failed to encode metrics");
                (StatusCode::INTERNAL_SERVER_ERROR, "failed to encode metrics\n").into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    fn make_adapter() -> (DeviceAdapter, Arc<ExporterMetrics>) {
        let exporter_metrics = Arc::new(ExporterMetrics::new());
        let adapter = DeviceAdapter::new(
            DeviceClient::from_client(reqwest::Client::new()),
            MetricSet::default(),
            exporter_metrics.clone(),
        );
        (adapter, exporter_metrics)
    }

    #[tokio::test]
    async fn test_rejected_host_counts_and_skips_fetch() {
        let (adapter, exporter_metrics) = make_adapter();

        let response = adapter.handle(Some("host:1234")).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = adapter.handle(None).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        assert_eq!(exporter_metrics.scrape_count(ScrapeOutcome::Rejected), 2);
        assert_eq!(exporter_metrics.scrape_count(ScrapeOutcome::Success), 0);
        assert_eq!(exporter_metrics.scrape_count(ScrapeOutcome::DeviceError), 0);
    }

    #[tokio::test]
    async fn test_unreachable_device_is_served() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let exporter_metrics = Arc::new(ExporterMetrics::new());
        let http = reqwest::Client::builder()
            .no_proxy()
            .resolve("gone.test", addr)
            .build()
            .unwrap();
        let adapter = DeviceAdapter::new(
            DeviceClient::from_client(http),
            MetricSet::new("office"),
            exporter_metrics.clone(),
        );

        let response = adapter.handle(Some("gone.test")).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = String::from_utf8(body.to_vec()).unwrap();
        assert!(body.contains("office_scrape_errors 1"), "{}", body);
        assert!(!body.contains("office_score"));
        assert_eq!(exporter_metrics.scrape_count(ScrapeOutcome::DeviceError), 1);
    }
}
