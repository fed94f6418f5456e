//! Standard `process_*` metrics for the exporter itself.
//!
//! Values are read from procfs on every render of `/metrics`. On other
//! platforms the collector emits nothing.

use prometheus_client::collector::Collector;
use prometheus_client::encoding::{DescriptorEncoder, EncodeMetric};
use prometheus_client::metrics::counter::ConstCounter;
use prometheus_client::metrics::gauge::ConstGauge;

/// A snapshot of the current process's resource usage.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcessStats {
    pub cpu_seconds: f64,
    pub resident_memory_bytes: i64,
    pub virtual_memory_bytes: i64,
    pub open_fds: Option<i64>,
    /// `None` when unlimited or unreadable.
    pub max_fds: Option<i64>,
}

impl ProcessStats {
    /// Read the stats of the running process.
    #[cfg(target_os = "linux")]
    pub fn current() -> Option<Self> {
        use procfs::process::{LimitValue, Process};
        use tracing::debug;

        let process = match Process::myself() {
            Ok(process) => process,
            Err(e) => {
                debug!(error = %e, "Cannot open /proc/self");
                return None;
            }
        };
        let stat = match process.stat() {
            Ok(stat) => stat,
            Err(e) => {
                debug!(error = %e, "Cannot read /proc/self/stat");
                return None;
            }
        };

        let ticks = procfs::ticks_per_second() as f64;
        let max_fds = process
            .limits()
            .ok()
            .and_then(|limits| match limits.max_open_files.soft_limit {
                LimitValue::Value(v) => Some(v as i64),
                LimitValue::Unlimited => None,
            });

        Some(Self {
            cpu_seconds: (stat.utime + stat.stime) as f64 / ticks,
            resident_memory_bytes: (stat.rss * procfs::page_size()) as i64,
            virtual_memory_bytes: stat.vsize as i64,
            open_fds: process.fd_count().ok().map(|n| n as i64),
            max_fds,
        })
    }

    #[cfg(not(target_os = "linux"))]
    pub fn current() -> Option<Self> {
        None
    }

    fn encode(&self, mut encoder: DescriptorEncoder) -> Result<(), std::fmt::Error> {
        let cpu = ConstCounter::new(self.cpu_seconds);
        cpu.encode(encoder.encode_descriptor(
            "process_cpu_seconds",
            "Total user and system CPU time spent in seconds",
            None,
            cpu.metric_type(),
        )?)?;

        let gauges = [
            (
                "process_resident_memory_bytes",
                "Resident memory size in bytes",
                Some(self.resident_memory_bytes),
            ),
            (
                "process_virtual_memory_bytes",
                "Virtual memory size in bytes",
                Some(self.virtual_memory_bytes),
            ),
            ("process_open_fds", "Number of open file descriptors", self.open_fds),
            ("process_max_fds", "Maximum number of open file descriptors", self.max_fds),
        ];

        for (name, help, value) in gauges {
            let Some(value) = value else { continue };
            let gauge = ConstGauge::new(value);
            gauge.encode(encoder.encode_descriptor(name, help, None, gauge.metric_type())?)?;
        }

        Ok(())
    }
}

/// Registry collector that samples [`ProcessStats`] at encode time.
#[derive(Debug, Default)]
pub struct ProcessCollector;

impl Collector for ProcessCollector {
    fn encode(&self, encoder: DescriptorEncoder) -> Result<(), std::fmt::Error> {
        match ProcessStats::current() {
            Some(stats) => stats.encode(encoder),
            None => Ok(()),
        }
    }
}
