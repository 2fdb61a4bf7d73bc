//! Netspeed Tester
//!
//! A terminal network speed tester that measures latency, download and
//! upload throughput against a discovered (or explicitly supplied) test
//! endpoint and renders the result as a live-updating colored display or
//! as a JSON document.

pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod output;
pub mod probe;
pub mod progress;
pub mod provider;
pub mod rate;
pub mod sampler;

// Re-export commonly used types
pub use app::SpeedTestApp;
pub use error::{AppError, Result};
pub use models::{ClientInfo, Endpoint, LatencyStats, MeasurementResult, RunConfig, Sample, TransferTotals};
pub use probe::LatencyProber;
pub use progress::{LiveReporter, ProgressEvent, ReporterMode, RunState, TestPhase};
pub use provider::{EndpointProvider, SpeedtestNetProvider, StaticProvider};
pub use rate::RateAggregator;
pub use sampler::{HttpDownloadSource, HttpUploadSource, TransferSampler, TransferSource};

/// Application version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");

/// Default configuration values
pub mod defaults {
    use std::time::Duration;

    /// Sampling duration per test phase
    pub const DEFAULT_DURATION: Duration = Duration::from_secs(1);
    /// Parallel connections per transfer phase
    pub const DEFAULT_CONNECTIONS: usize = 4;
    /// Latency probes issued per endpoint (the first is a warm-up and discarded)
    pub const DEFAULT_PROBE_COUNT: u32 = 6;
    /// Per-probe round-trip timeout
    pub const PROBE_TIMEOUT: Duration = Duration::from_secs(5);
    /// Timeout for endpoint discovery and client-info requests
    pub const DISCOVERY_TIMEOUT: Duration = Duration::from_secs(10);
    /// Interval at which the shared byte counter is sampled
    pub const SAMPLE_INTERVAL: Duration = Duration::from_millis(150);
    /// Trailing window backing the instantaneous rate
    pub const RATE_WINDOW: Duration = Duration::from_millis(1500);
    /// Exponential smoothing factor applied to instantaneous readings
    pub const SMOOTHING_FACTOR: f64 = 0.3;
    /// Fraction of the run discarded for TCP slow-start ramp-up
    pub const RAMP_UP_DISCARD: f64 = 0.15;
    /// Minimum achieved measurement time considered trustworthy
    pub const MIN_EFFECTIVE: Duration = Duration::from_millis(500);
    /// Grace period connections get to observe the deadline
    pub const CANCEL_GRACE: Duration = Duration::from_millis(500);
    /// Live display refresh cadence
    pub const RENDER_TICK: Duration = Duration::from_millis(100);
    /// Upload payload chunk size (256 KiB, resent until the deadline)
    pub const UPLOAD_PAYLOAD_BYTES: usize = 256 * 1024;
    /// Download image size ladder used by speedtest endpoints
    pub const DOWNLOAD_SIZES: &[u32] = &[350, 500, 750, 1000, 1500, 2000, 2500, 3000, 3500, 4000];
    /// Number of ranked discovery candidates kept for probing
    pub const MAX_CANDIDATE_ENDPOINTS: usize = 10;
}
