//! Metric descriptors and per-scrape rendering.
//!
//! Descriptors are static. Values live in a [`ScrapeReport`] that belongs to
//! a single request, and each render builds its own registry so nothing
//! leaks between concurrent scrapes.

use std::sync::atomic::AtomicU64;
use std::time::Duration;

use prometheus_client::encoding::text::encode;
use prometheus_client::metrics::gauge::Gauge;
use prometheus_client::registry::Registry;

use crate::reading::SensorReading;

/// Content type of the OpenMetrics text format.
pub const CONTENT_TYPE: &str = "application/openmetrics-text; version=1.0.0; charset=utf-8";

/// Name and help text of an unlabeled gauge.
///
/// Help texts carry no trailing period; the encoder appends one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricDescriptor {
    pub name: &'static str,
    pub help: &'static str,
}

impl MetricDescriptor {
    const fn new(name: &'static str, help: &'static str) -> Self {
        Self { name, help }
    }
}

pub const SCORE: MetricDescriptor = MetricDescriptor::new("score", "Awair score");
pub const DEW_POINT: MetricDescriptor = MetricDescriptor::new("dew_point_celsius", "Dew point");
pub const TEMP: MetricDescriptor = MetricDescriptor::new("temp_celsius", "Temperature");
pub const RELATIVE_HUMIDITY: MetricDescriptor =
    MetricDescriptor::new("relative_humidity", "Relative humidity");
pub const ABSOLUTE_HUMIDITY: MetricDescriptor =
    MetricDescriptor::new("absolute_humidity", "Absolute humidity (g/m³)");
pub const CO2: MetricDescriptor = MetricDescriptor::new("co2_parts_per_million", "CO2");
pub const CO2_EST: MetricDescriptor = MetricDescriptor::new(
    "co2_est_parts_per_million",
    "(Estimated?) CO2; unclear how this metric differs from CO2",
);
pub const VOC: MetricDescriptor = MetricDescriptor::new(
    "voc_parts_per_billion",
    "VOC (Volatile organic compounds)",
);
pub const VOC_BASELINE: MetricDescriptor =
    MetricDescriptor::new("voc_baseline", "Unknown, possibly unused?");
pub const VOC_H2_RAW: MetricDescriptor =
    MetricDescriptor::new("voc_h2_raw", "Unknown, possibly dihydrogen ppb?");
pub const VOC_ETHANOL_RAW: MetricDescriptor =
    MetricDescriptor::new("voc_ethanol_raw", "Unknown, possibly ethanol ppb?");
pub const PM25: MetricDescriptor = MetricDescriptor::new(
    "pm25_micrograms_per_cubic_meter",
    "Particulate matter (fine-dust)",
);
pub const PM10_EST: MetricDescriptor = MetricDescriptor::new(
    "pm10_est_micrograms_per_cubic_meter",
    "Likely estimated particulate matter (big particles)",
);

pub const SCRAPE_DURATION: MetricDescriptor = MetricDescriptor::new(
    "scrape_duration_seconds",
    "Amount of time spent scraping metrics",
);
pub const SCRAPE_ERRORS: MetricDescriptor = MetricDescriptor::new(
    "scrape_errors",
    "How many errors occurred during the scrape event",
);

/// Every device gauge, in exposition order.
pub const DEVICE_METRICS: [MetricDescriptor; 13] = [
    SCORE,
    DEW_POINT,
    TEMP,
    RELATIVE_HUMIDITY,
    ABSOLUTE_HUMIDITY,
    CO2,
    CO2_EST,
    VOC,
    VOC_BASELINE,
    VOC_H2_RAW,
    VOC_ETHANOL_RAW,
    PM25,
    PM10_EST,
];

/// Pair each device gauge with its value from a reading.
pub fn device_samples(reading: &SensorReading) -> [(MetricDescriptor, f64); 13] {
    [
        (SCORE, reading.score),
        (DEW_POINT, reading.dew_point_celsius),
        (TEMP, reading.temp_celsius),
        (RELATIVE_HUMIDITY, reading.relative_humidity),
        (ABSOLUTE_HUMIDITY, reading.absolute_humidity),
        (CO2, reading.co2_ppm),
        (CO2_EST, reading.co2_est_ppm),
        (VOC, reading.voc_ppb),
        (VOC_BASELINE, reading.voc_baseline),
        (VOC_H2_RAW, reading.voc_h2_raw),
        (VOC_ETHANOL_RAW, reading.voc_ethanol_raw),
        (PM25, reading.pm25),
        (PM10_EST, reading.pm10_est),
    ]
}

/// Outcome of one device scrape.
#[derive(Debug, Clone, PartialEq)]
pub struct ScrapeReport {
    /// `None` when the fetch or decode failed.
    pub reading: Option<SensorReading>,
    /// Wall-clock time spent on the fetch attempt.
    pub duration: Duration,
}

impl ScrapeReport {
    pub fn success(reading: SensorReading, duration: Duration) -> Self {
        Self {
            reading: Some(reading),
            duration,
        }
    }

    pub fn failure(duration: Duration) -> Self {
        Self {
            reading: None,
            duration,
        }
    }

    /// 0 or 1: only one fetch is attempted per scrape.
    pub fn errors(&self) -> u32 {
        if self.reading.is_some() { 0 } else { 1 }
    }

    /// All samples for this scrape: device gauges (if any) followed by the
    /// two scrape gauges.
    pub fn samples(&self) -> Vec<(MetricDescriptor, f64)> {
        let mut samples = Vec::with_capacity(DEVICE_METRICS.len() + 2);
        if let Some(reading) = &self.reading {
            samples.extend(device_samples(reading));
        }
        samples.push((SCRAPE_DURATION, self.duration.as_secs_f64()));
        samples.push((SCRAPE_ERRORS, f64::from(self.errors())));
        samples
    }
}

/// Immutable rendering configuration, built once at startup.
#[derive(Debug, Clone)]
pub struct MetricSet {
    prefix: String,
}

impl MetricSet {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Full exported name of a descriptor.
    pub fn full_name(&self, descriptor: &MetricDescriptor) -> String {
        if self.prefix.is_empty() {
            descriptor.name.to_string()
        } else {
            format!("{}_{}", self.prefix, descriptor.name)
        }
    }

    /// Render a scrape report in the OpenMetrics text format.
    ///
    /// A fresh registry is used per call.
    pub fn render(&self, report: &ScrapeReport) -> Result<String, std::fmt::Error> {
        let mut registry = if self.prefix.is_empty() {
            Registry::default()
        } else {
            Registry::with_prefix(self.prefix.as_str())
        };

        for (descriptor, value) in report.samples() {
            let gauge = Gauge::<f64, AtomicU64>::default();
            gauge.set(value);
            registry.register(descriptor.name, descriptor.help, gauge);
        }

        let mut output = String::with_capacity(2048);
        encode(&mut output, &registry)?;
        Ok(output)
    }
}

impl Default for MetricSet {
    fn default() -> Self {
        Self::new("awair")
    }
}

/// Extract `(name, value)` pairs from rendered exposition text.
///
/// Comment lines and `# EOF` are skipped. Useful for tests and debugging.
pub fn parse_samples(text: &str) -> Vec<(String, f64)> {
    text.lines()
        .filter(|l| !l.starts_with('#') && !l.trim().is_empty())
        .filter_map(|l| {
            let mut parts = l.split_whitespace();
            let name = parts.next()?;
            let value = parts.next()?.parse::<f64>().ok()?;
            Some((name.split('{').next().unwrap_or(name).to_string(), value))
        })
        .collect()
}
