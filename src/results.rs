//! Result data structures for speed test output.
//!
//! These are plain records handed to rendering and persistence code. All
//! of them implement Serialize for JSON output; `SpeedResult` also
//! deserializes so saved reports can be read back.

use chrono::{DateTime, Utc};
use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Marker used wherever a value could not be determined.
pub const NOT_AVAILABLE: &str = "N/A";

/// Raw round-trip latency as reported by the latency prober.
///
/// `Unavailable` means no probe technique worked; it is kept distinct
/// from `Measured(0.0)`, which is a legitimate reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Latency {
    /// Round-trip time in milliseconds
    Measured(f64),
    /// Neither ping nor TCP connect produced a reading
    Unavailable,
}

impl Latency {
    pub fn as_millis(&self) -> Option<f64> {
        match self {
            Latency::Measured(ms) => Some(*ms),
            Latency::Unavailable => None,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Latency::Measured(_))
    }
}

impl fmt::Display for Latency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Latency::Measured(ms) => write!(f, "{:.2} ms", ms),
            Latency::Unavailable => f.write_str(NOT_AVAILABLE),
        }
    }
}

impl Serialize for Latency {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Latency::Measured(ms) => serializer.serialize_f64(*ms),
            Latency::Unavailable => serializer.serialize_str(NOT_AVAILABLE),
        }
    }
}

impl<'de> Deserialize<'de> for Latency {
    fn deserialize<D>(deserializer: D) -> Result<Latency, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Wire {
            Number(f64),
            Text(String),
        }

        match Wire::deserialize(deserializer)? {
            Wire::Number(ms) => Ok(Latency::Measured(ms)),
            Wire::Text(text) if text == NOT_AVAILABLE => Ok(Latency::Unavailable),
            Wire::Text(text) => Err(de::Error::invalid_value(
                de::Unexpected::Str(&text),
                &"a latency in milliseconds or \"N/A\"",
            )),
        }
    }
}

/// Outcome of one download or upload measurement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeedResult {
    /// Throughput in Mbps
    pub speed: Option<f64>,
    /// Mean difference between successive attempt durations, in ms
    pub jitter: Option<f64>,
    /// Raw ping/TCP latency
    pub latency: Option<Latency>,
    /// Round trip of a HEAD request against the host, in ms
    pub http_latency: Option<f64>,
}

impl SpeedResult {
    pub fn new(
        speed: Option<f64>,
        jitter: Option<f64>,
        latency: Option<Latency>,
        http_latency: Option<f64>,
    ) -> Self {
        Self { speed, jitter, latency, http_latency }
    }
}

/// Connection details reported by the speed test server.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServerMetadata {
    pub hostname: String,
    pub client_ip: String,
    pub http_protocol: String,
    /// Autonomous System Number
    pub asn: i64,
    /// ISP/Organization name
    pub isp: String,
    /// IATA code of the serving datacenter
    pub colo: String,
    pub country: String,
    pub city: String,
    pub region: String,
    pub postal_code: String,
    pub latitude: String,
    pub longitude: String,
    /// Whether the client IP is IPv6-formatted
    pub is_ipv6: bool,
    /// When this snapshot was taken
    pub date: DateTime<Utc>,
}

/// Everything a run produced, as written by `--json` / `--json-output`.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub download: Option<SpeedResult>,
    pub upload: Option<SpeedResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ServerMetadata>,
    pub timestamp: DateTime<Utc>,
}

impl Report {
    pub fn new(
        download: Option<SpeedResult>,
        upload: Option<SpeedResult>,
        metadata: Option<ServerMetadata>,
    ) -> Self {
        let timestamp =
            metadata.as_ref().map(|meta| meta.date).unwrap_or_else(Utc::now);

        Self { download, upload, metadata, timestamp }
    }
}
