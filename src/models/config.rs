//! Run configuration model

use crate::defaults;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for a single measurement run.
///
/// Constructed once from the CLI by [`crate::config::load_config`] and
/// read-only for the duration of the run. The aggregator tunables
/// (`ramp_up_discard`, `smoothing_factor`, window and interval sizes)
/// carry defaults rather than mandated constants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Sampling duration per test phase
    pub duration: Duration,

    /// Parallel connections per transfer phase
    pub connections: usize,

    /// Whether the download phase runs
    pub run_download: bool,

    /// Whether the upload phase runs
    pub run_upload: bool,

    /// Use HTTPS towards test endpoints
    pub secure: bool,

    /// Render live spinner/stage progress
    pub live_mode: bool,

    /// Emit the result as a JSON document (disables live rendering)
    pub json_mode: bool,

    /// Colored terminal output
    pub enable_color: bool,

    /// Structured debug logging to stderr
    pub debug: bool,

    /// Fixed endpoint upload URL, bypassing discovery
    pub server_url: Option<String>,

    /// Latency probes per endpoint (first one is discarded as warm-up)
    pub probe_count: u32,

    /// Per-probe timeout
    pub probe_timeout: Duration,

    /// Interval between reads of the shared byte counter
    pub sample_interval: Duration,

    /// Trailing window for the instantaneous rate
    pub rate_window: Duration,

    /// Exponential smoothing factor for the live rate readout
    pub smoothing_factor: f64,

    /// Fraction of the run discarded against TCP slow-start bias
    pub ramp_up_discard: f64,

    /// Minimum achieved measurement time before the result is trusted
    pub min_effective: Duration,

    /// Grace period for connections to observe cancellation
    pub grace: Duration,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            duration: defaults::DEFAULT_DURATION,
            connections: defaults::DEFAULT_CONNECTIONS,
            run_download: true,
            run_upload: true,
            secure: true,
            live_mode: true,
            json_mode: false,
            enable_color: true,
            debug: false,
            server_url: None,
            probe_count: defaults::DEFAULT_PROBE_COUNT,
            probe_timeout: defaults::PROBE_TIMEOUT,
            sample_interval: defaults::SAMPLE_INTERVAL,
            rate_window: defaults::RATE_WINDOW,
            smoothing_factor: defaults::SMOOTHING_FACTOR,
            ramp_up_discard: defaults::RAMP_UP_DISCARD,
            min_effective: defaults::MIN_EFFECTIVE,
            grace: defaults::CANCEL_GRACE,
        }
    }
}

impl RunConfig {
    /// Deadline including the cancellation grace period
    pub fn hard_deadline(&self) -> Duration {
        self.duration + self.grace
    }

    /// Human summary of the active configuration, for debug output
    pub fn summary(&self) -> String {
        format!(
            "duration={}s connections={} download={} upload={} secure={} live={} json={}",
            self.duration.as_secs_f64(),
            self.connections,
            self.run_download,
            self.run_upload,
            self.secure,
            self.live_mode,
            self.json_mode,
        )
    }
}
