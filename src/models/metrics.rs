//! Measurement data models: endpoints, samples, latency statistics and the
//! final result document

use crate::error::{AppError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use url::Url;

/// A test server exposing download/upload/latency probe URLs.
///
/// Immutable once selected for a run. Speedtest endpoints advertise a single
/// upload URL (`.../speedtest/upload.php`); the download and latency URLs are
/// derived from its base path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Endpoint {
    /// Provider-assigned server id
    pub id: String,

    /// Sponsor name (operator of the test server)
    pub sponsor: String,

    /// Server location (typically a city name)
    pub location: String,

    /// Server country
    pub country: String,

    /// Upload URL, ending in `upload.php`
    pub upload_url: String,

    /// Whether the URLs use HTTPS
    pub secure: bool,
}

impl Endpoint {
    /// Create an endpoint from its advertised upload URL, normalizing the
    /// scheme to match `secure`.
    pub fn from_upload_url(
        id: impl Into<String>,
        sponsor: impl Into<String>,
        location: impl Into<String>,
        country: impl Into<String>,
        upload_url: &str,
        secure: bool,
    ) -> Result<Self> {
        let mut url = Url::parse(upload_url)
            .map_err(|e| AppError::parse(format!("Invalid endpoint URL '{}': {}", upload_url, e)))?;
        let scheme = if secure { "https" } else { "http" };
        url.set_scheme(scheme)
            .map_err(|_| AppError::parse(format!("Cannot apply scheme '{}' to '{}'", scheme, upload_url)))?;

        let mut upload_url = url.to_string();
        if !upload_url.ends_with("upload.php") {
            if !upload_url.ends_with('/') {
                upload_url.push('/');
            }
            upload_url.push_str("upload.php");
        }

        Ok(Self {
            id: id.into(),
            sponsor: sponsor.into(),
            location: location.into(),
            country: country.into(),
            upload_url,
            secure,
        })
    }

    /// Base URL shared by the download and latency resources
    pub fn base_url(&self) -> &str {
        self.upload_url
            .strip_suffix("/upload.php")
            .unwrap_or(&self.upload_url)
    }

    /// Download URL for one rung of the size ladder (`random{S}x{S}.jpg`)
    pub fn download_url(&self, size: u32) -> String {
        format!("{}/random{}x{}.jpg", self.base_url(), size, size)
    }

    /// Tiny resource used for latency probing
    pub fn latency_url(&self) -> String {
        format!("{}/latency.txt", self.base_url())
    }

    /// Display name in `sponsor, location, country` form
    pub fn display_name(&self) -> String {
        format!("{}, {}, {}", self.sponsor, self.location, self.country)
    }
}

/// Client identity as reported by the discovery provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientInfo {
    /// External IP address
    pub ip: String,

    /// Internet service provider name
    pub isp: String,

    /// Client country
    pub country: String,
}

/// A timestamped byte-count measurement taken during an active transfer.
///
/// Produced by the sampling timer and consumed by the rate aggregator;
/// never serialized.
#[derive(Debug, Clone, Copy)]
pub struct Sample {
    /// When the counter was read
    pub at: Instant,

    /// Bytes moved since the previous sample
    pub bytes: u64,

    /// Cumulative bytes moved since the transfer started
    pub total_bytes: u64,

    /// Elapsed time since the transfer started
    pub elapsed: Duration,
}

/// Terminal totals emitted by the sampler when a transfer phase ends
#[derive(Debug, Clone, Copy)]
pub struct TransferTotals {
    /// Total bytes moved across all connections
    pub bytes: u64,

    /// Achieved wall-clock measurement time
    pub elapsed: Duration,

    /// Connections dropped from the pool due to errors
    pub failed_connections: usize,
}

/// Latency statistics over the post-warm-up probes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatencyStats {
    /// Fastest round trip in milliseconds
    pub min_ms: f64,

    /// Average round trip in milliseconds
    pub avg_ms: f64,

    /// Standard deviation of successive round-trip deltas, in milliseconds
    pub jitter_ms: f64,

    /// Probes contributing to the statistics (warm-up excluded)
    pub samples_used: usize,

    /// Set when fewer than two probes survived after the warm-up discard
    pub low_confidence: bool,
}

/// The sole artifact of a measurement run.
///
/// Created once per run and immutable after finalization. Fields for a
/// skipped or failed phase are `None`, never an ambiguous zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeasurementResult {
    /// Latency statistics against the chosen endpoint
    pub latency: Option<LatencyStats>,

    /// Final download throughput in Mbps
    pub download_mbps: Option<f64>,

    /// Final upload throughput in Mbps
    pub upload_mbps: Option<f64>,

    /// Endpoint the run was measured against
    pub endpoint: Option<Endpoint>,

    /// Client IP/ISP/location as reported by the provider
    pub client: Option<ClientInfo>,

    /// When the run finished
    pub timestamp: DateTime<Utc>,

    /// Non-fatal conditions encountered during the run
    pub warnings: Vec<String>,
}

impl MeasurementResult {
    /// Create an empty result stamped with the current time
    pub fn new() -> Self {
        Self {
            latency: None,
            download_mbps: None,
            upload_mbps: None,
            endpoint: None,
            client: None,
            timestamp: Utc::now(),
            warnings: Vec::new(),
        }
    }

    /// True when at least one throughput figure was produced
    pub fn has_throughput(&self) -> bool {
        self.download_mbps.is_some() || self.upload_mbps.is_some()
    }
}

impl Default for MeasurementResult {
    fn default() -> Self {
        Self::new()
    }
}

/// JSON document emitted in `--json` mode.
///
/// Mirrors [`MeasurementResult`] plus an `error` field so that a failed run
/// still produces a parseable document rather than a fabricated rate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonReport {
    pub timestamp: DateTime<Utc>,
    pub latency: Option<LatencyStats>,
    pub download_mbps: Option<f64>,
    pub upload_mbps: Option<f64>,
    pub endpoint: Option<Endpoint>,
    pub client: Option<ClientInfo>,
    pub warnings: Vec<String>,
    pub error: Option<String>,
}

impl JsonReport {
    /// Report for a completed run
    pub fn from_result(result: &MeasurementResult) -> Self {
        Self {
            timestamp: result.timestamp,
            latency: result.latency.clone(),
            download_mbps: result.download_mbps,
            upload_mbps: result.upload_mbps,
            endpoint: result.endpoint.clone(),
            client: result.client.clone(),
            warnings: result.warnings.clone(),
            error: None,
        }
    }

    /// Report for a failed run, carrying no fabricated measurements
    pub fn from_error(error: &AppError) -> Self {
        Self {
            timestamp: Utc::now(),
            latency: None,
            download_mbps: None,
            upload_mbps: None,
            endpoint: None,
            client: None,
            warnings: Vec::new(),
            error: Some(error.to_string()),
        }
    }
}
