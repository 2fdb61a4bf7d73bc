//! Main application orchestration: one coordinating sequence of stages
//! (latency probe, download, upload, finalize) over injected collaborators.

use crate::{
    error::{AppError, Result},
    logging::DebugLogger,
    models::{MeasurementResult, RunConfig, Sample, TransferTotals},
    probe::LatencyProber,
    progress::{ProgressEvent, RunState, TestPhase},
    provider::{EndpointProvider, SpeedtestNetProvider, StaticProvider},
    rate::RateAggregator,
    sampler::{HttpDownloadSource, HttpUploadSource, TransferSampler, TransferSource},
};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Coordinates a single measurement run.
pub struct SpeedTestApp {
    config: RunConfig,
    provider: Arc<dyn EndpointProvider>,
    logger: DebugLogger,
}

impl SpeedTestApp {
    /// Build the app with the production provider (or a static one when a
    /// fixed server URL was supplied).
    pub fn new(config: RunConfig, logger: DebugLogger) -> Result<Self> {
        let provider: Arc<dyn EndpointProvider> = match &config.server_url {
            Some(url) => Arc::new(StaticProvider::from_url(url, config.secure)?),
            None => Arc::new(SpeedtestNetProvider::new(config.secure)?),
        };
        Ok(Self { config, provider, logger })
    }

    /// Build the app against an injected provider, for tests.
    pub fn with_provider(
        config: RunConfig,
        provider: Arc<dyn EndpointProvider>,
        logger: DebugLogger,
    ) -> Self {
        Self { config, provider, logger }
    }

    /// Run the full measurement, racing it against Ctrl-C. On interrupt all
    /// in-flight work is dropped, which tears down the connection pool.
    pub async fn run(&self, events: mpsc::UnboundedSender<ProgressEvent>) -> Result<MeasurementResult> {
        tokio::select! {
            result = self.run_inner(events.clone()) => {
                let _ = events.send(ProgressEvent::Finished);
                result
            }
            _ = tokio::signal::ctrl_c() => {
                let _ = events.send(ProgressEvent::Finished);
                self.logger.warn("app", "interrupted, tearing down");
                Err(AppError::Cancelled)
            }
        }
    }

    async fn run_inner(&self, events: mpsc::UnboundedSender<ProgressEvent>) -> Result<MeasurementResult> {
        let config = &self.config;
        let mut state = RunState::new();
        let mut result = MeasurementResult::new();

        // Stage 1: discovery + latency probing.
        state.advance(TestPhase::ProbingLatency, config)?;
        let _ = events.send(ProgressEvent::PhaseStarted(TestPhase::ProbingLatency));

        // Client info and the server list come from independent documents,
        // so fetch them concurrently.
        let (client, candidates) =
            futures::future::join(self.provider.client_info(), self.provider.endpoints()).await;
        match client {
            Ok(client) => result.client = client,
            Err(e) => {
                self.logger.warn("provider", &format!("client info unavailable: {}", e));
                result.warnings.push(format!("client info unavailable: {}", e));
            }
        }

        let candidates = candidates?;
        self.logger.debug("provider", &format!("{} candidate endpoints", candidates.len()));

        let prober = LatencyProber::new(config)?;
        let (endpoint, latency) = prober.choose_endpoint(&candidates).await?;
        self.logger.info(
            "probe",
            &format!("chose {} (avg {:.2} ms)", endpoint.display_name(), latency.avg_ms),
        );
        let _ = events.send(ProgressEvent::EndpointChosen {
            endpoint: endpoint.clone(),
            latency: latency.clone(),
        });
        if latency.low_confidence {
            result
                .warnings
                .push("latency figure is low-confidence (fewer than 2 usable probes)".to_string());
        }
        result.latency = Some(latency);
        result.endpoint = Some(endpoint.clone());

        // Stage 2: download.
        if config.run_download {
            state.advance(TestPhase::TestingDownload, config)?;
            let _ = events.send(ProgressEvent::PhaseStarted(TestPhase::TestingDownload));
            let source = Arc::new(HttpDownloadSource::new(endpoint.clone(), config.probe_timeout)?);
            match self.run_transfer_phase(source, &events).await {
                Ok(mbps) => {
                    result.download_mbps = Some(mbps);
                    let _ = events.send(ProgressEvent::DownloadDone { mbps });
                }
                Err(e) => {
                    self.logger.error("sampler", &format!("download phase failed: {}", e));
                    let warning = format!("download failed: {}", e);
                    let _ = events.send(ProgressEvent::PhaseWarning(warning.clone()));
                    result.warnings.push(warning);
                }
            }
        }

        // Stage 3: upload.
        if config.run_upload {
            state.advance(TestPhase::TestingUpload, config)?;
            let _ = events.send(ProgressEvent::PhaseStarted(TestPhase::TestingUpload));
            let source = Arc::new(HttpUploadSource::new(endpoint.clone(), config.probe_timeout)?);
            match self.run_transfer_phase(source, &events).await {
                Ok(mbps) => {
                    result.upload_mbps = Some(mbps);
                    let _ = events.send(ProgressEvent::UploadDone { mbps });
                }
                Err(e) => {
                    self.logger.error("sampler", &format!("upload phase failed: {}", e));
                    let warning = format!("upload failed: {}", e);
                    let _ = events.send(ProgressEvent::PhaseWarning(warning.clone()));
                    result.warnings.push(warning);
                }
            }
        }

        // A phase failure is absorbed as a warning, but a run where every
        // attempted transfer phase failed is itself a failure.
        if (config.run_download || config.run_upload) && !result.has_throughput() {
            state.advance(TestPhase::Error, config)?;
            return Err(AppError::transfer_failed(
                "every requested transfer phase failed".to_string(),
            ));
        }

        // Stage 4: finalize.
        state.advance(TestPhase::Finalizing, config)?;
        let _ = events.send(ProgressEvent::PhaseStarted(TestPhase::Finalizing));
        result.timestamp = chrono::Utc::now();
        state.advance(TestPhase::Done, config)?;
        self.logger.info("app", "run complete");

        Ok(result)
    }

    /// Run one transfer phase: sampler drives the connections, a forwarding
    /// task feeds samples into the aggregator and pushes the smoothed rate
    /// out to the reporter, and the aggregator produces the final figure.
    async fn run_transfer_phase(
        &self,
        source: Arc<dyn TransferSource>,
        events: &mpsc::UnboundedSender<ProgressEvent>,
    ) -> Result<f64> {
        let config = &self.config;
        let sampler = TransferSampler::new(
            config.connections,
            config.duration,
            config.sample_interval,
            config.grace,
        );

        let (sample_tx, mut sample_rx) = mpsc::unbounded_channel::<Sample>();
        let mut aggregator = RateAggregator::new(config.rate_window, config.smoothing_factor);
        let events = events.clone();
        let aggregate = tokio::spawn(async move {
            while let Some(sample) = sample_rx.recv().await {
                let mbps = aggregator.push(&sample);
                let _ = events.send(ProgressEvent::RateUpdate { mbps });
            }
            aggregator
        });

        let totals: TransferTotals = sampler.run(source, sample_tx).await?;
        if totals.failed_connections > 0 {
            self.logger.warn(
                "sampler",
                &format!("{} connection(s) dropped from the pool", totals.failed_connections),
            );
        }

        let aggregator = aggregate
            .await
            .map_err(|e| AppError::internal(format!("aggregator task failed: {}", e)))?;
        aggregator.finalize(&totals, config.ramp_up_discard, config.min_effective)
    }
}
