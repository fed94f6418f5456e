//! Validation of the `host` query parameter.
//!
//! The allow-list is an injection guard for the upstream URL: the value may
//! only contain ASCII letters, digits, `.` and `-`, so it can never carry a
//! scheme, port, path, query or whitespace. It is deliberately not a full
//! hostname validator (leading/trailing dots and label lengths are not
//! checked) and it does not restrict which hosts may be reached.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::HostError;

/// The accepted grammar for device hosts.
pub const HOST_PATTERN: &str = r"^[A-Za-z0-9.-]+$";

static HOST_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(HOST_PATTERN).unwrap());

/// A device host that passed the allow-list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceHost(String);

impl DeviceHost {
    /// Validate a raw `host` parameter.
    ///
    /// `None` and the empty string are both reported as missing.
    pub fn parse(raw: Option<&str>) -> Result<Self, HostError> {
        let raw = match raw {
            Some(h) if !h.is_empty() => h,
            _ => return Err(HostError::Missing),
        };

        if !HOST_REGEX.is_match(raw) {
            return Err(HostError::Invalid(raw.to_string()));
        }

        Ok(Self(raw.to_string()))
    }

    /// URL of the device's latest-reading endpoint.
    ///
    /// Always plain http on the default port.
    pub fn air_data_url(&self) -> String {
        format!("http://{}/air-data/latest", self.0)
    }
}

impl fmt::Display for DeviceHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
