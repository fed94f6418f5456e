//! Prometheus exporter for Awair air-quality sensors.
//!
//! Awair devices with the local API enabled serve their latest reading as
//! JSON on `http://<device>/air-data/latest`. This crate re-exposes that
//! reading as OpenMetrics gauges, fetched on demand for every scrape.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐  /awair?host=…  ┌─────────────────┐  GET /air-data/latest  ┌──────────┐
//! │   Prometheus    │───────────────>│  DeviceAdapter  │──────────────────────>│  Awair   │
//! │    (scraper)    │<───────────────│ (validate/poll) │<──────────────────────│  device  │
//! └─────────────────┘   gauges       └─────────────────┘        JSON            └──────────┘
//! ```
//!
//! Each scrape polls exactly one device and keeps no state afterwards. A
//! device that cannot be reached or returns garbage still produces a 200
//! response with `awair_scrape_errors 1`.
//!
//! # Usage
//!
//! ```bash
//! awair-exporter --listen-address :8123
//! curl 'http://localhost:8123/awair?host=awair-elem-1234.local'
//! ```
//!
//! Prometheus scrape config, rewriting targets into the `host` parameter:
//!
//! ```yaml
//! scrape_configs:
//!   - job_name: awair
//!     metrics_path: /awair
//!     static_configs:
//!       - targets: ['awair-elem-1234.local']
//!     relabel_configs:
//!       - source_labels: [__address__]
//!         target_label: __param_host
//!       - source_labels: [__param_host]
//!         target_label: instance
//!       - target_label: __address__
//!         replacement: localhost:8123
//! ```
//!
//! # Configuration
//!
//! See [`config::ExporterConfig`] for configuration options.

pub mod adapter;
pub mod config;
pub mod device;
pub mod error;
pub mod exporter_metrics;
pub mod host;
pub mod http;
pub mod metrics;
pub mod process;
pub mod reading;

pub use adapter::DeviceAdapter;
pub use config::ExporterConfig;
pub use device::DeviceClient;
pub use error::{DeviceError, HostError};
pub use exporter_metrics::ExporterMetrics;
pub use host::DeviceHost;
pub use http::{AppState, HttpServer};
pub use metrics::{MetricSet, ScrapeReport};
pub use reading::SensorReading;
