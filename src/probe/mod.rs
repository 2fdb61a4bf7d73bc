//! Latency probing.
//!
//! Issues a short burst of sequential, lightweight GET requests against an
//! endpoint's latency resource and reduces the round trips to min/avg/jitter
//! statistics. The first probe always pays for connection warm-up (DNS, TCP,
//! TLS) and is discarded so it cannot skew the figures.

use crate::{
    error::{AppError, Result},
    models::{Endpoint, LatencyStats, RunConfig},
};
use std::time::{Duration, Instant};
use tokio::time::timeout;

/// Issues repeated small round-trip probes and computes latency statistics.
pub struct LatencyProber {
    client: reqwest::Client,
    probe_count: u32,
    probe_timeout: Duration,
}

impl LatencyProber {
    pub fn new(config: &RunConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.probe_timeout)
            .user_agent(concat!("netspeed-tester/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AppError::network(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self {
            client,
            probe_count: config.probe_count.max(2),
            probe_timeout: config.probe_timeout,
        })
    }

    /// Probe one endpoint. A partial success (at least one good probe after
    /// the warm-up discard) still yields statistics; total failure is
    /// `ProbeUnreachable`.
    pub async fn probe(&self, endpoint: &Endpoint) -> Result<LatencyStats> {
        let url = endpoint.latency_url();
        let mut rtts: Vec<Option<f64>> = Vec::with_capacity(self.probe_count as usize);

        for _ in 0..self.probe_count {
            let started = Instant::now();
            let outcome = timeout(self.probe_timeout, self.client.get(&url).send()).await;
            let rtt = match outcome {
                Ok(Ok(response)) if response.status().is_success() => {
                    // Drain the tiny body so the round trip is complete.
                    let _ = response.bytes().await;
                    Some(started.elapsed().as_secs_f64() * 1000.0)
                }
                _ => None,
            };
            rtts.push(rtt);
        }

        stats_from_probes(&rtts).ok_or_else(|| {
            AppError::probe_unreachable(format!(
                "no latency probe to {} succeeded after warm-up",
                endpoint.display_name()
            ))
        })
    }

    /// Walk a ranked candidate list and return the first endpoint that
    /// answers its probes, together with its latency statistics.
    pub async fn choose_endpoint(&self, candidates: &[Endpoint]) -> Result<(Endpoint, LatencyStats)> {
        if candidates.is_empty() {
            return Err(AppError::probe_unreachable("endpoint provider returned no candidates"));
        }

        for endpoint in candidates {
            match self.probe(endpoint).await {
                Ok(stats) => return Ok((endpoint.clone(), stats)),
                Err(_) => continue,
            }
        }

        Err(AppError::probe_unreachable(format!(
            "none of the {} candidate endpoints answered latency probes",
            candidates.len()
        )))
    }
}

/// Reduce raw per-probe round trips (None = probe failed) to statistics.
/// The first slot is the warm-up probe and is discarded whether it
/// succeeded or not. Returns `None` when nothing usable remains.
pub fn stats_from_probes(rtts: &[Option<f64>]) -> Option<LatencyStats> {
    let usable: Vec<f64> = rtts.iter().skip(1).filter_map(|r| *r).collect();
    if usable.is_empty() {
        return None;
    }

    let min_ms = usable.iter().copied().fold(f64::INFINITY, f64::min);
    let avg_ms = usable.iter().sum::<f64>() / usable.len() as f64;

    // Jitter: standard deviation of successive round-trip deltas.
    let jitter_ms = if usable.len() < 2 {
        0.0
    } else {
        let deltas: Vec<f64> = usable.windows(2).map(|w| w[1] - w[0]).collect();
        let mean = deltas.iter().sum::<f64>() / deltas.len() as f64;
        let variance = deltas.iter().map(|d| (d - mean).powi(2)).sum::<f64>() / deltas.len() as f64;
        variance.sqrt()
    };

    Some(LatencyStats {
        min_ms,
        avg_ms,
        jitter_ms,
        samples_used: usable.len(),
        low_confidence: usable.len() < 2,
    })
}
