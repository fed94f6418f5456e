//! HTTP client for the device's local API.

use std::time::Duration;

use tracing::{debug, trace};

use crate::config::DeviceConfig;
use crate::error::DeviceError;
use crate::host::DeviceHost;
use crate::reading::SensorReading;

/// Fetches readings from devices.
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct DeviceClient {
    http: reqwest::Client,
}

impl DeviceClient {
    /// Build a client from configuration.
    ///
    /// Without `timeout_secs` no client timeout is set, so a hung device
    /// holds the scrape open until the scraper gives up.
    pub fn new(config: &DeviceConfig) -> Result<Self, reqwest::Error> {
        let mut builder = reqwest::Client::builder().user_agent(config.user_agent.clone());
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        Ok(Self {
            http: builder.build()?,
        })
    }

    /// Wrap a preconfigured client.
    pub fn from_client(http: reqwest::Client) -> Self {
        Self { http }
    }

    /// Issue a single GET for the latest reading and decode it.
    ///
    /// The body is decoded whatever the status code; only transport and
    /// decode failures are errors.
    pub async fn fetch_latest(&self, host: &DeviceHost) -> Result<SensorReading, DeviceError> {
        let url = host.air_data_url();
        trace!(%url, "Polling device");

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|source| DeviceError::Transport {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            debug!(%url, %status, "Device answered with non-success status");
        }

        let body = response
            .bytes()
            .await
            .map_err(|source| DeviceError::Body { url, source })?;

        Ok(SensorReading::from_slice(&body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DeviceConfig;

    #[test]
    fn test_client_from_config() {
        let config = DeviceConfig {
            timeout_secs: Some(3),
            ..Default::default()
        };
        assert!(DeviceClient::new(&config).is_ok());
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let http = reqwest::Client::builder()
            .no_proxy()
            .resolve("refused.test", addr)
            .build()
            .unwrap();
        let client = DeviceClient::from_client(http);
        let host = DeviceHost::parse(Some("refused.test")).unwrap();

        let err = client.fetch_latest(&host).await.unwrap_err();
        assert!(matches!(err, DeviceError::Transport { .. }), "{:?}", err);
        assert!(err.to_string().contains("http://refused.test/air-data/latest"));
    }
}
