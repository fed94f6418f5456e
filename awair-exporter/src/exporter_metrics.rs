//! The exporter's own operational metrics, served on `/metrics`.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use prometheus_client::encoding::text::encode;
use prometheus_client::encoding::{EncodeLabelSet, EncodeLabelValue, LabelValueEncoder};
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::metrics::gauge::Gauge;
use prometheus_client::metrics::histogram::{Histogram, exponential_buckets};
use prometheus_client::metrics::info::Info;
use prometheus_client::registry::Registry;

use crate::process::ProcessCollector;

/// How a device scrape ended.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum ScrapeOutcome {
    /// Device read and converted.
    Success,
    /// Served with `scrape_errors=1`.
    DeviceError,
    /// Bad `host` parameter, answered with 400.
    Rejected,
}

impl ScrapeOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScrapeOutcome::Success => "success",
            ScrapeOutcome::DeviceError => "device_error",
            ScrapeOutcome::Rejected => "rejected",
        }
    }
}

impl EncodeLabelValue for ScrapeOutcome {
    fn encode(&self, encoder: &mut LabelValueEncoder) -> Result<(), std::fmt::Error> {
        EncodeLabelValue::encode(&self.as_str(), encoder)
    }
}

#[derive(Debug, Clone, Hash, PartialEq, Eq, EncodeLabelSet)]
struct ScrapeLabels {
    outcome: ScrapeOutcome,
}

/// Process-wide metrics registry.
///
/// Created once at startup and shared behind an `Arc`. All metrics are
/// atomics, so recording never blocks other requests. Exporter metrics carry
/// the `awair_exporter_` prefix; the `process_*` family is unprefixed.
#[derive(Debug)]
pub struct ExporterMetrics {
    registry: Registry,
    scrapes: Family<ScrapeLabels, Counter>,
    device_request_duration: Histogram,
    metrics_requests: Counter,
}

impl ExporterMetrics {
    pub fn new() -> Self {
        let mut root = Registry::default();
        root.register_collector(Box::new(ProcessCollector));

        let registry = root.sub_registry_with_prefix("awair_exporter");

        registry.register(
            "build",
            "Build information",
            Info::new(vec![("version", env!("CARGO_PKG_VERSION"))]),
        );

        let start_time = Gauge::<i64>::default();
        let since_epoch = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        start_time.set(since_epoch.as_secs() as i64);
        registry.register(
            "start_time_seconds",
            "Start time of the process since unix epoch in seconds",
            start_time,
        );

        let scrapes = Family::<ScrapeLabels, Counter>::default();
        registry.register("scrapes", "Device scrape requests by outcome", scrapes.clone());

        let device_request_duration = Histogram::new(exponential_buckets(0.005, 2.0, 12));
        registry.register(
            "device_request_duration_seconds",
            "Time spent fetching a reading from a device",
            device_request_duration.clone(),
        );

        let metrics_requests = Counter::default();
        registry.register(
            "metrics_requests",
            "Requests served by the self-metrics endpoint",
            metrics_requests.clone(),
        );

        Self {
            registry: root,
            scrapes,
            device_request_duration,
            metrics_requests,
        }
    }

    /// Count a device scrape.
    pub fn record_scrape(&self, outcome: ScrapeOutcome) {
        self.scrapes.get_or_create(&ScrapeLabels { outcome }).inc();
    }

    /// Record how long a device fetch took, successful or not.
    pub fn observe_device_request(&self, elapsed: Duration) {
        self.device_request_duration.observe(elapsed.as_secs_f64());
    }

    /// Number of scrapes recorded with an outcome.
    pub fn scrape_count(&self, outcome: ScrapeOutcome) -> u64 {
        self.scrapes.get_or_create(&ScrapeLabels { outcome }).get()
    }

    /// Count a hit on the self-metrics endpoint and render the registry.
    pub fn render(&self) -> Result<String, std::fmt::Error> {
        self.metrics_requests.inc();

        let mut output = String::with_capacity(4096);
        encode(&mut output, &self.registry)?;
        Ok(output)
    }
}

impl Default for ExporterMetrics {
    fn default() -> Self {
        Self::new()
    }
}
