//! Concurrent transfer sampling.
//!
//! A transfer phase opens a bounded pool of connections against one endpoint
//! and keeps them saturated until a wall-clock deadline. All connections add
//! the bytes they move to one shared atomic counter; an independent timer
//! reads that counter on a fixed interval and emits [`Sample`]s for the rate
//! aggregator. A single erroring connection is dropped from the pool without
//! disturbing the others; the phase fails only when every connection failed.

use crate::{
    defaults,
    error::{AppError, Result},
    models::{Endpoint, Sample, TransferTotals},
};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};
use std::time::Duration;
use tokio::{
    sync::{mpsc, watch},
    task::JoinSet,
    time::Instant,
};

/// One transfer connection. Implementations move bytes until the cancel
/// signal flips, adding everything they moved to the shared counter, and
/// return `Err` if the connection died before cancellation.
#[async_trait]
pub trait TransferSource: Send + Sync + 'static {
    async fn run_connection(
        &self,
        connection_id: usize,
        counter: Arc<AtomicU64>,
        cancel: watch::Receiver<bool>,
    ) -> Result<()>;
}

/// Download source: streams `random{S}x{S}.jpg` bodies back-to-back,
/// rotating through the size ladder so parallel connections spread across
/// different object sizes.
pub struct HttpDownloadSource {
    client: reqwest::Client,
    endpoint: Endpoint,
}

impl HttpDownloadSource {
    pub fn new(endpoint: Endpoint, probe_timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(probe_timeout)
            .user_agent(concat!("netspeed-tester/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AppError::network(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { client, endpoint })
    }
}

#[async_trait]
impl TransferSource for HttpDownloadSource {
    async fn run_connection(
        &self,
        connection_id: usize,
        counter: Arc<AtomicU64>,
        mut cancel: watch::Receiver<bool>,
    ) -> Result<()> {
        let sizes = defaults::DOWNLOAD_SIZES;
        let mut rung = connection_id % sizes.len();

        loop {
            if *cancel.borrow() {
                return Ok(());
            }

            let url = self.endpoint.download_url(sizes[rung]);
            let mut response = self
                .client
                .get(&url)
                .send()
                .await
                .and_then(|r| r.error_for_status())
                .map_err(|e| AppError::network(format!("GET {} failed: {}", url, e)))?;

            loop {
                tokio::select! {
                    _ = cancel.changed() => {
                        if *cancel.borrow() {
                            return Ok(());
                        }
                    }
                    chunk = response.chunk() => {
                        match chunk.map_err(|e| AppError::network(format!("stream error: {}", e)))? {
                            Some(bytes) => {
                                counter.fetch_add(bytes.len() as u64, Ordering::Relaxed);
                            }
                            None => break,
                        }
                    }
                }
            }

            rung = (rung + 1) % sizes.len();
        }
    }
}

/// Upload source: POSTs a generated payload to the endpoint's upload URL
/// repeatedly, discarding the response body.
pub struct HttpUploadSource {
    client: reqwest::Client,
    endpoint: Endpoint,
    payload: Arc<Vec<u8>>,
}

impl HttpUploadSource {
    pub fn new(endpoint: Endpoint, probe_timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(probe_timeout)
            .user_agent(concat!("netspeed-tester/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AppError::network(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self {
            client,
            endpoint,
            payload: Arc::new(generate_payload(defaults::UPLOAD_PAYLOAD_BYTES)),
        })
    }
}

#[async_trait]
impl TransferSource for HttpUploadSource {
    async fn run_connection(
        &self,
        _connection_id: usize,
        counter: Arc<AtomicU64>,
        mut cancel: watch::Receiver<bool>,
    ) -> Result<()> {
        let url = &self.endpoint.upload_url;

        loop {
            if *cancel.borrow() {
                return Ok(());
            }

            // Multipart form mirrors what speedtest upload endpoints expect.
            let part = Part::bytes(self.payload.as_ref().clone())
                .file_name("payload.bin")
                .mime_str("application/octet-stream")
                .map_err(|e| AppError::internal(format!("invalid payload mime: {}", e)))?;
            let form = Form::new().part("file", part);
            let request = self.client.post(url).multipart(form).send();

            tokio::select! {
                _ = cancel.changed() => {
                    if *cancel.borrow() {
                        return Ok(());
                    }
                }
                response = request => {
                    response
                        .and_then(|r| r.error_for_status())
                        .map_err(|e| AppError::network(format!("POST {} failed: {}", url, e)))?;
                    counter.fetch_add(self.payload.len() as u64, Ordering::Relaxed);
                }
            }
        }
    }
}

/// Deterministic filler bytes; upload servers ignore the content.
fn generate_payload(len: usize) -> Vec<u8> {
    let mut state = 0x9E3779B97F4A7C15u64;
    (0..len)
        .map(|_| {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            (state >> 56) as u8
        })
        .collect()
}

/// Runs a bounded pool of transfer connections against a source for a fixed
/// wall-clock budget, emitting samples on the way and totals at the end.
pub struct TransferSampler {
    connections: usize,
    duration: Duration,
    sample_interval: Duration,
    grace: Duration,
}

impl TransferSampler {
    pub fn new(connections: usize, duration: Duration, sample_interval: Duration, grace: Duration) -> Self {
        Self {
            connections: connections.max(1),
            duration,
            sample_interval,
            grace,
        }
    }

    /// Run the transfer phase. Samples go out through `samples` until the
    /// phase ends; the terminal totals are the return value. Fails with
    /// `TransferFailed` when every connection in the pool died.
    pub async fn run(
        &self,
        source: Arc<dyn TransferSource>,
        samples: mpsc::UnboundedSender<Sample>,
    ) -> Result<TransferTotals> {
        let counter = Arc::new(AtomicU64::new(0));
        let (cancel_tx, cancel_rx) = watch::channel(false);
        let start = Instant::now();
        let deadline = start + self.duration;

        let mut pool = JoinSet::new();
        for id in 0..self.connections {
            let source = Arc::clone(&source);
            let counter = Arc::clone(&counter);
            let cancel = cancel_rx.clone();
            pool.spawn(async move { source.run_connection(id, counter, cancel).await });
        }

        let timer = tokio::spawn(sampling_loop(
            Arc::clone(&counter),
            start,
            self.sample_interval,
            samples,
            cancel_rx,
        ));

        // Wait for the deadline, collecting connection outcomes as they land.
        // Leaving early when the whole pool already finished (or died) keeps
        // an unreachable endpoint from stalling the run for the full budget.
        let mut failed = 0usize;
        loop {
            tokio::select! {
                joined = pool.join_next() => match joined {
                    Some(outcome) => {
                        if !connection_survived(outcome) {
                            failed += 1;
                        }
                    }
                    None => break,
                },
                _ = tokio::time::sleep_until(deadline) => break,
            }
        }

        // Measurement window closes here; everything after is teardown.
        let bytes = counter.load(Ordering::Relaxed);
        let elapsed = start.elapsed().min(self.duration + self.grace);

        let _ = cancel_tx.send(true);
        let drained = tokio::time::timeout(self.grace, async {
            let mut late_failures = 0usize;
            while let Some(outcome) = pool.join_next().await {
                if !connection_survived(outcome) {
                    late_failures += 1;
                }
            }
            late_failures
        })
        .await;

        match drained {
            Ok(late_failures) => failed += late_failures,
            Err(_) => {
                // A connection ignored the cancel signal past the grace
                // period; tear the remainder down hard.
                pool.abort_all();
                while pool.join_next().await.is_some() {}
            }
        }

        let _ = timer.await;

        if failed >= self.connections {
            return Err(AppError::transfer_failed(format!(
                "all {} connections failed",
                self.connections
            )));
        }

        Ok(TransferTotals {
            bytes,
            elapsed,
            failed_connections: failed,
        })
    }
}

fn connection_survived(outcome: std::result::Result<Result<()>, tokio::task::JoinError>) -> bool {
    match outcome {
        Ok(Ok(())) => true,
        Ok(Err(_)) => false,
        // Cancelled tasks were healthy until teardown; panics were not.
        Err(join_err) => join_err.is_cancelled(),
    }
}

/// Reads the shared counter on a fixed cadence, independent of the
/// connections' own read/write loops.
async fn sampling_loop(
    counter: Arc<AtomicU64>,
    start: Instant,
    interval: Duration,
    samples: mpsc::UnboundedSender<Sample>,
    mut cancel: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    // The first tick of a tokio interval completes immediately.
    ticker.tick().await;

    let mut last_total = 0u64;
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let total = counter.load(Ordering::Relaxed);
                let sample = Sample {
                    at: std::time::Instant::now(),
                    bytes: total - last_total,
                    total_bytes: total,
                    elapsed: start.elapsed(),
                };
                last_total = total;
                if samples.send(sample).is_err() {
                    break;
                }
            }
            _ = cancel.changed() => break,
        }
    }
}
