//! The device's `/air-data/latest` document.

use serde::{Deserialize, Deserializer, Serialize};

/// One reading as reported by the device's local API.
///
/// Values are passed through untouched. Unknown fields are ignored; missing
/// and `null` fields default to zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorReading {
    /// ISO 8601, e.g. "2020-08-09T05:35:28.034Z". Not exported.
    #[serde(deserialize_with = "null_as_default")]
    pub timestamp: String,
    #[serde(deserialize_with = "null_as_default")]
    pub score: f64,
    #[serde(rename = "dew_point", deserialize_with = "null_as_default")]
    pub dew_point_celsius: f64,
    #[serde(rename = "temp", deserialize_with = "null_as_default")]
    pub temp_celsius: f64,
    #[serde(rename = "humid", deserialize_with = "null_as_default")]
    pub relative_humidity: f64,
    #[serde(rename = "abs_humid", deserialize_with = "null_as_default")]
    pub absolute_humidity: f64,
    #[serde(rename = "co2", deserialize_with = "null_as_default")]
    pub co2_ppm: f64,
    #[serde(rename = "co2_est", deserialize_with = "null_as_default")]
    pub co2_est_ppm: f64,
    #[serde(rename = "voc", deserialize_with = "null_as_default")]
    pub voc_ppb: f64,
    /// Typically very large (e.g. 2352254740).
    #[serde(deserialize_with = "null_as_default")]
    pub voc_baseline: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub voc_h2_raw: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub voc_ethanol_raw: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub pm25: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub pm10_est: f64,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl SensorReading {
    /// Decode a response body.
    ///
    /// Only the first JSON value is read; anything after it is ignored. A
    /// `null` document yields an all-zero reading.
    pub fn from_slice(body: &[u8]) -> Result<Self, serde_json::Error> {
        let mut deserializer = serde_json::Deserializer::from_slice(body);
        let reading = Option::<SensorReading>::deserialize(&mut deserializer)?;
        Ok(reading.unwrap_or_default())
    }
}
