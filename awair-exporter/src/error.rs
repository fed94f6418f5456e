//! Error types for the exporter.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::host::HOST_PATTERN;

/// Rejections of the `host` query parameter.
///
/// These are caller mistakes: they become a 400 response and no device
/// request is made.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    #[error("host query parameter is required")]
    Missing,

    #[error("host query parameter does not match valid hostname: {}", HOST_PATTERN)]
    Invalid(String),
}

impl IntoResponse for HostError {
    fn into_response(self) -> Response {
        (
            StatusCode::BAD_REQUEST,
            [("content-type", "text/plain; charset=utf-8")],
            self.to_string(),
        )
            .into_response()
    }
}

/// Failures while reading from a device.
///
/// None of these reach the scraper as an HTTP error; they are reported
/// through the `scrape_errors` gauge and logged.
#[derive(Debug, Error)]
pub enum DeviceError {
    /// Connection refused, DNS failure, timeout and friends.
    #[error("Unable to poll url {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The connection dropped while reading the body.
    #[error("Failed to read response body from {url}: {source}")]
    Body {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The body is not the JSON document we expect.
    #[error("Invalid response: {0}")]
    Decode(#[from] serde_json::Error),
}
