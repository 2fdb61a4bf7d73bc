//! Configuration loading and validation

use crate::{
    cli::Cli,
    defaults,
    error::{AppError, Result},
    models::RunConfig,
};
use colored::Colorize;
use std::time::Duration;

/// A non-fatal configuration concern surfaced before the run starts
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigWarning {
    pub message: String,
}

impl ConfigWarning {
    fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }

    /// Format the warning for terminal display
    pub fn format(&self, enable_color: bool) -> String {
        if enable_color {
            format!("{} {}", "warning:".yellow().bold(), self.message)
        } else {
            format!("warning: {}", self.message)
        }
    }
}

/// Build a validated [`RunConfig`] from parsed CLI arguments
pub fn load_config(cli: Cli) -> Result<RunConfig> {
    cli.validate().map_err(AppError::config)?;

    let connections = cli
        .connections
        .unwrap_or(defaults::DEFAULT_CONNECTIONS)
        .min(max_connections());

    Ok(RunConfig {
        duration: Duration::from_secs(cli.time),
        connections,
        run_download: !cli.upload_only,
        run_upload: !cli.download_only,
        secure: !cli.no_secure,
        live_mode: !cli.no_live && !cli.json,
        json_mode: cli.json,
        enable_color: cli.use_colors(),
        debug: cli.debug,
        server_url: cli.server_url.clone(),
        ..RunConfig::default()
    })
}

/// Validate a loaded configuration, returning warnings for values that are
/// legal but likely unintended
pub fn validate_config(config: &RunConfig) -> Vec<ConfigWarning> {
    let mut warnings = Vec::new();

    if config.duration > Duration::from_secs(60) {
        warnings.push(ConfigWarning::new(format!(
            "a {}s test phase moves a lot of data; typical runs use 1-15 seconds",
            config.duration.as_secs()
        )));
    }

    if config.connections > defaults::DEFAULT_CONNECTIONS * 4 {
        warnings.push(ConfigWarning::new(format!(
            "{} parallel connections may be throttled by the test server",
            config.connections
        )));
    }

    if !config.secure {
        warnings.push(ConfigWarning::new(
            "running with --no-secure; transfers use plain HTTP",
        ));
    }

    warnings
}

/// Upper bound on the connection pool, derived from available CPUs
fn max_connections() -> usize {
    (num_cpus::get() * 2).max(defaults::DEFAULT_CONNECTIONS)
}
