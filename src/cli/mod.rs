//! Command-line interface definitions

use clap::Parser;

/// Netspeed Tester - measure latency, download and upload throughput from the terminal
#[derive(Parser, Debug, Clone)]
#[command(name = "nst")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Sampling duration in seconds per test phase
    #[arg(short = 't', long = "time", value_name = "SECONDS", default_value_t = 1, env = "NST_TIME")]
    pub time: u64,

    /// Run only the download test (skip upload)
    #[arg(long)]
    pub download_only: bool,

    /// Run only the upload test (skip download)
    #[arg(long)]
    pub upload_only: bool,

    /// Emit the result as a JSON document (disables live rendering)
    #[arg(long)]
    pub json: bool,

    /// Plain sequential text output, no spinner
    #[arg(long)]
    pub no_live: bool,

    /// Use unencrypted transport to test endpoints
    #[arg(long)]
    pub no_secure: bool,

    /// Parallel connections per transfer phase
    #[arg(short = 'c', long, value_name = "N", env = "NST_CONNECTIONS")]
    pub connections: Option<usize>,

    /// Test a fixed endpoint upload URL instead of discovering servers
    #[arg(long, value_name = "URL", env = "NST_SERVER_URL")]
    pub server_url: Option<String>,

    /// Force colored output
    #[arg(long)]
    pub color: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Enable debug output
    #[arg(long)]
    pub debug: bool,
}

impl Cli {
    /// Validate CLI arguments for conflicts and requirements
    pub fn validate(&self) -> Result<(), String> {
        if self.download_only && self.upload_only {
            return Err("Cannot specify both --download-only and --upload-only".to_string());
        }

        if self.color && self.no_color {
            return Err("Cannot specify both --color and --no-color".to_string());
        }

        if self.time == 0 {
            return Err("--time must be at least 1 second".to_string());
        }

        if let Some(connections) = self.connections {
            if connections == 0 {
                return Err("--connections must be at least 1".to_string());
            }
        }

        Ok(())
    }

    /// Check if colors should be enabled
    pub fn use_colors(&self) -> bool {
        if self.color {
            true // Force color output when --color is specified
        } else if self.no_color || self.json {
            false
        } else {
            supports_color()
        }
    }
}

/// Detect terminal color support from the environment
fn supports_color() -> bool {
    if let Ok(term) = std::env::var("TERM") {
        if term == "dumb" {
            return false;
        }
    }

    if std::env::var("NO_COLOR").is_ok() {
        return false;
    }

    if std::env::var("FORCE_COLOR").is_ok() {
        return true;
    }

    true
}
