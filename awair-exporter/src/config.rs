//! Configuration for the Awair exporter.

use std::fmt;
use std::net::Ipv6Addr;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(#[from] json5::Error),
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Complete exporter configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExporterConfig {
    /// HTTP endpoint settings.
    #[serde(default)]
    pub http: HttpConfig,

    /// Device polling settings.
    #[serde(default)]
    pub device: DeviceConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP endpoint configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Address to listen on (default: ":8123").
    ///
    /// A bare `:port` listens on all interfaces (IPv6 dual-stack, falling
    /// back to IPv4).
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Path for the exporter's own metrics (default: "/metrics").
    #[serde(default = "default_metrics_path")]
    pub metrics_path: String,

    /// Path of the device-proxy endpoint (default: "/awair").
    #[serde(default = "default_device_path")]
    pub device_path: String,
}

fn default_listen() -> String {
    ":8123".to_string()
}

fn default_metrics_path() -> String {
    "/metrics".to_string()
}

fn default_device_path() -> String {
    "/awair".to_string()
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            metrics_path: default_metrics_path(),
            device_path: default_device_path(),
        }
    }
}

/// Device polling configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Prefix for device metric names (default: "awair").
    #[serde(default = "default_prefix")]
    pub metric_prefix: String,

    /// Request timeout in seconds. Unset means no timeout.
    #[serde(default)]
    pub timeout_secs: Option<u64>,

    /// User-Agent sent to devices.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_prefix() -> String {
    "awair".to_string()
}

fn default_user_agent() -> String {
    concat!("awair-exporter/", env!("CARGO_PKG_VERSION")).to_string()
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            metric_prefix: default_prefix(),
            timeout_secs: None,
            user_agent: default_user_agent(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log output format: "text" or "json".
    #[serde(default)]
    pub format: LogFormat,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// A validated listen address.
///
/// Host names are resolved when binding, not here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListenAddr {
    /// `:port`, all interfaces. Dual-stack where IPv6 is available.
    AllInterfaces(u16),
    /// `host:port` with a host name, IPv4 literal or bracketed IPv6 literal.
    HostPort(String),
}

impl ListenAddr {
    /// Addresses to try binding, in order.
    pub fn bind_candidates(&self) -> Vec<String> {
        match self {
            ListenAddr::AllInterfaces(port) => {
                vec![format!("[::]:{}", port), format!("0.0.0.0:{}", port)]
            }
            ListenAddr::HostPort(addr) => vec![addr.clone()],
        }
    }
}

impl fmt::Display for ListenAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListenAddr::AllInterfaces(port) => write!(f, ":{}", port),
            ListenAddr::HostPort(addr) => f.write_str(addr),
        }
    }
}

/// Parse a listen address, accepting the `:port` shorthand.
pub fn parse_listen_addr(listen: &str) -> Result<ListenAddr, ConfigError> {
    let invalid = || ConfigError::Validation(format!("Invalid listen address: {}", listen));

    let (host, port) = listen.rsplit_once(':').ok_or_else(invalid)?;
    let port: u16 = port.parse().map_err(|_| invalid())?;

    if host.is_empty() {
        return Ok(ListenAddr::AllInterfaces(port));
    }

    let valid_host = match host.strip_prefix('[').and_then(|h| h.strip_suffix(']')) {
        Some(v6) => v6.parse::<Ipv6Addr>().is_ok(),
        None => !host.contains(|c: char| c == ':' || c == '[' || c == ']' || c.is_whitespace()),
    };
    if !valid_host {
        return Err(invalid());
    }

    Ok(ListenAddr::HostPort(listen.to_string()))
}

fn is_metric_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == ':' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == ':')
}

impl ExporterConfig {
    /// Load configuration from a JSON5 file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse configuration from a JSON5 string.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: ExporterConfig = json5::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// The validated listen address.
    pub fn listen_addr(&self) -> Result<ListenAddr, ConfigError> {
        parse_listen_addr(&self.http.listen)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.listen_addr()?;

        for path in [&self.http.metrics_path, &self.http.device_path] {
            if !path.starts_with('/') {
                return Err(ConfigError::Validation(format!(
                    "Path must start with /: {}",
                    path
                )));
            }
        }

        if self.http.metrics_path == self.http.device_path {
            return Err(ConfigError::Validation(
                "metrics_path and device_path must differ".to_string(),
            ));
        }

        if !is_metric_name(&self.device.metric_prefix) {
            return Err(ConfigError::Validation(format!(
                "Invalid metric prefix: {:?}",
                self.device.metric_prefix
            )));
        }

        if self.device.timeout_secs == Some(0) {
            return Err(ConfigError::Validation(
                "timeout_secs must be > 0".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_minimal_config() {
        let config = ExporterConfig::parse("{}").unwrap();

        assert_eq!(config.http.listen, ":8123");
        assert_eq!(config.http.metrics_path, "/metrics");
        assert_eq!(config.http.device_path, "/awair");
        assert_eq!(config.device.metric_prefix, "awair");
        assert_eq!(config.device.timeout_secs, None);
        assert!(config.device.user_agent.starts_with("awair-exporter/"));
        assert_eq!(config.logging.format, LogFormat::Text);
    }

    #[test]
    fn test_parse_full_config() {
        let json = r#"{
            http: {
                listen: "127.0.0.1:9101",
                metrics_path: "/internal/metrics",
                device_path: "/probe",
            },
            device: {
                metric_prefix: "office",
                timeout_secs: 5,
                user_agent: "probe/1",
            },
            logging: {
                level: "debug",
                format: "json"
            }
        }"#;

        let config = ExporterConfig::parse(json).unwrap();

        assert_eq!(config.http.listen, "127.0.0.1:9101");
        assert_eq!(config.http.metrics_path, "/internal/metrics");
        assert_eq!(config.http.device_path, "/probe");
        assert_eq!(config.device.metric_prefix, "office");
        assert_eq!(config.device.timeout_secs, Some(5));
        assert_eq!(config.device.user_agent, "probe/1");
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_listen_shorthand() {
        let addr = parse_listen_addr(":8123").unwrap();
        assert_eq!(addr, ListenAddr::AllInterfaces(8123));
        assert_eq!(addr.bind_candidates(), vec!["[::]:8123", "0.0.0.0:8123"]);
        assert_eq!(addr.to_string(), ":8123");
    }

    #[test]
    fn test_listen_host_names_and_literals() {
        for listen in ["localhost:8123", "awair-exporter.lan:80", "127.0.0.1:9000", "[::1]:9000"] {
            let addr = parse_listen_addr(listen).unwrap();
            assert_eq!(addr, ListenAddr::HostPort(listen.to_string()));
            assert_eq!(addr.bind_candidates(), vec![listen.to_string()]);
        }
    }

    #[test]
    fn test_listen_rejects_malformed() {
        for listen in ["8123", "localhost", "localhost:", "localhost:99999", "::1:80", "[nope]:80", "a b:80"] {
            assert!(parse_listen_addr(listen).is_err(), "{:?} should be rejected", listen);
        }
    }

    #[test]
    fn test_validate_invalid_listen() {
        let result = ExporterConfig::parse(r#"{ http: { listen: "not-an-address" } }"#);
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Invalid listen address")
        );
    }

    #[test]
    fn test_validate_invalid_path() {
        let result = ExporterConfig::parse(r#"{ http: { device_path: "awair" } }"#);
        assert!(result.unwrap_err().to_string().contains("must start with /"));
    }

    #[test]
    fn test_validate_same_paths() {
        let result = ExporterConfig::parse(r#"{ http: { device_path: "/metrics" } }"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_prefix() {
        assert!(ExporterConfig::parse(r#"{ device: { metric_prefix: "9lives" } }"#).is_err());
        assert!(ExporterConfig::parse(r#"{ device: { metric_prefix: "air-q" } }"#).is_err());
        assert!(ExporterConfig::parse(r#"{ device: { metric_prefix: "" } }"#).is_err());
        assert!(ExporterConfig::parse(r#"{ device: { metric_prefix: "air_q" } }"#).is_ok());
    }

    #[test]
    fn test_validate_zero_timeout() {
        let result = ExporterConfig::parse(r#"{ device: { timeout_secs: 0 } }"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, r#"{{ http: {{ listen: ":9999" }} }}"#).unwrap();

        let config = ExporterConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.listen_addr().unwrap(), ListenAddr::AllInterfaces(9999));
    }

    #[test]
    fn test_load_missing_file() {
        let result = ExporterConfig::load_from_file("/nonexistent/awair.json5");
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }
}
