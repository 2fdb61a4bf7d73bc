//! Rate aggregation: windowed instantaneous throughput for live display and
//! the final post-ramp-up figure reported in the result.
//!
//! The aggregator consumes the sampler's byte-count stream. Two outputs:
//! a trailing-window rate smoothed for display, and a final rate computed
//! over the whole run minus an initial ramp-up discard that excludes TCP
//! slow-start from the reported figure.

use crate::{
    error::{AppError, Result},
    models::{Sample, TransferTotals},
};
use std::collections::VecDeque;
use std::time::Duration;

/// Convert a byte count over a time span into megabits per second
pub fn bytes_to_mbps(bytes: u64, seconds: f64) -> f64 {
    if seconds <= 0.0 {
        return 0.0;
    }
    (bytes as f64 * 8.0) / 1_000_000.0 / seconds
}

/// One slice of the trailing window
#[derive(Debug, Clone, Copy)]
struct WindowSlice {
    bytes: u64,
    span: Duration,
}

/// Converts raw byte/time samples into smoothed instantaneous and final
/// throughput figures.
#[derive(Debug)]
pub struct RateAggregator {
    /// Trailing window length for the instantaneous rate
    window: Duration,

    /// Exponential smoothing factor (0 < alpha <= 1)
    smoothing_factor: f64,

    /// Slices currently inside the trailing window
    recent: VecDeque<WindowSlice>,

    /// Sum of slice spans in `recent`
    recent_span: Duration,

    /// Sum of slice bytes in `recent`
    recent_bytes: u64,

    /// Elapsed time of the previous sample, to size the next slice
    last_elapsed: Duration,

    /// Full (elapsed, total_bytes) history for the final-rate computation
    history: Vec<(Duration, u64)>,

    /// Latest smoothed instantaneous reading
    smoothed_mbps: Option<f64>,
}

impl RateAggregator {
    pub fn new(window: Duration, smoothing_factor: f64) -> Self {
        Self {
            window,
            smoothing_factor: smoothing_factor.clamp(0.0, 1.0),
            recent: VecDeque::new(),
            recent_span: Duration::ZERO,
            recent_bytes: 0,
            last_elapsed: Duration::ZERO,
            history: Vec::new(),
            smoothed_mbps: None,
        }
    }

    /// Consume one sample and return the updated smoothed instantaneous rate
    /// in Mbps.
    pub fn push(&mut self, sample: &Sample) -> f64 {
        let span = sample.elapsed.saturating_sub(self.last_elapsed);
        self.last_elapsed = sample.elapsed;
        self.history.push((sample.elapsed, sample.total_bytes));

        self.recent.push_back(WindowSlice { bytes: sample.bytes, span });
        self.recent_span += span;
        self.recent_bytes += sample.bytes;

        // Evict slices that fell out of the trailing window, always keeping
        // at least the sample that just arrived.
        while self.recent.len() > 1 && self.recent_span > self.window {
            let front = self.recent[0];
            if self.recent_span - front.span < self.window {
                break;
            }
            self.recent.pop_front();
            self.recent_span -= front.span;
            self.recent_bytes -= front.bytes;
        }

        let raw = bytes_to_mbps(self.recent_bytes, self.recent_span.as_secs_f64());
        let smoothed = match self.smoothed_mbps {
            Some(prev) => prev + self.smoothing_factor * (raw - prev),
            None => raw,
        };
        self.smoothed_mbps = Some(smoothed);
        smoothed
    }

    /// Latest smoothed instantaneous rate, if any sample arrived yet
    pub fn instantaneous_mbps(&self) -> Option<f64> {
        self.smoothed_mbps
    }

    /// Number of samples consumed so far
    pub fn sample_count(&self) -> usize {
        self.history.len()
    }

    /// Compute the final rate over the whole run, discarding the initial
    /// ramp-up portion. Fails with `InsufficientSample` when the achieved
    /// measurement time is below `min_effective`.
    pub fn finalize(
        &self,
        totals: &TransferTotals,
        ramp_up_discard: f64,
        min_effective: Duration,
    ) -> Result<f64> {
        if totals.elapsed < min_effective {
            return Err(AppError::insufficient_sample(format!(
                "achieved only {:.2}s of measurement time (minimum {:.2}s)",
                totals.elapsed.as_secs_f64(),
                min_effective.as_secs_f64()
            )));
        }

        let discard = totals.elapsed.mul_f64(ramp_up_discard.clamp(0.0, 0.9));

        // Bytes already moved at the discard boundary come from the first
        // sample at or past it; with no such sample the whole run counts.
        let cut = self
            .history
            .iter()
            .find(|(elapsed, _)| *elapsed >= discard)
            .copied()
            .unwrap_or((Duration::ZERO, 0));

        let effective = totals.elapsed.saturating_sub(cut.0);
        let bytes = totals.bytes.saturating_sub(cut.1);
        if effective.is_zero() {
            return Err(AppError::insufficient_sample(
                "no measurement time left after ramp-up discard".to_string(),
            ));
        }

        Ok(bytes_to_mbps(bytes, effective.as_secs_f64()))
    }
}
