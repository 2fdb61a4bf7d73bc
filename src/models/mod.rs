//! Data models for run configuration and measurement results

pub mod config;
pub mod metrics;

pub use config::RunConfig;
pub use metrics::{
    ClientInfo, Endpoint, JsonReport, LatencyStats, MeasurementResult, Sample, TransferTotals,
};
