//! Netspeed Tester - Main CLI Application

use clap::Parser;
use netspeed_tester::{
    app::SpeedTestApp,
    cli::Cli,
    config::{load_config, validate_config},
    error::{AppError, Result},
    logging::DebugLogger,
    models::JsonReport,
    output::{render_json, OutputFormatterFactory},
    progress::{LiveReporter, ProgressEvent, ReporterMode},
    PKG_NAME, VERSION,
};
use std::process;
use tokio::sync::mpsc;

#[tokio::main]
async fn main() {
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("Application panic: {}", panic_info);
        process::exit(1);
    }));

    let cli = Cli::parse();

    if let Err(e) = run_application(cli).await {
        eprintln!("Error: {}", e);
        print_error_suggestions(&e);
        process::exit(e.exit_code());
    }
}

/// Main application logic
async fn run_application(cli: Cli) -> Result<()> {
    let config = load_config(cli)?;

    let logger = DebugLogger::new(config.debug && !config.json_mode, config.enable_color);
    logger.debug("main", &format!("{} v{}", PKG_NAME, VERSION));
    logger.debug("main", &config.summary());

    if !config.json_mode {
        for warning in validate_config(&config) {
            eprintln!("{}", warning.format(config.enable_color));
        }
    }

    let app = SpeedTestApp::new(config.clone(), logger.clone())?;

    let (events_tx, events_rx) = mpsc::unbounded_channel::<ProgressEvent>();
    let reporter = if config.json_mode {
        // JSON mode renders nothing intermediate; drop the receiver so
        // sends become no-ops.
        drop(events_rx);
        None
    } else {
        let mode = if config.live_mode {
            ReporterMode::Live
        } else {
            ReporterMode::Plain
        };
        Some(LiveReporter::new(events_rx, mode, config.enable_color).spawn())
    };

    let outcome = app.run(events_tx).await;

    if let Some(handle) = reporter {
        let _ = handle.await;
    }

    match outcome {
        Ok(result) => {
            if config.json_mode {
                println!("{}", render_json(&JsonReport::from_result(&result))?);
            } else {
                let formatter = OutputFormatterFactory::create_formatter(config.enable_color);
                println!("{}", formatter.format_summary(&result));
            }
            Ok(())
        }
        Err(e) => {
            if config.json_mode {
                // A failed run still emits a parseable document with an
                // error field instead of fabricated rates.
                if let Ok(text) = render_json(&JsonReport::from_error(&e)) {
                    println!("{}", text);
                }
            }
            Err(e)
        }
    }
}

/// Print helpful suggestions for common errors
fn print_error_suggestions(error: &AppError) {
    match error {
        AppError::Config(_) => {
            eprintln!();
            eprintln!("Usage help:");
            eprintln!("  - Run 'nst --help' for the full flag list");
            eprintln!("  - --download-only and --upload-only are mutually exclusive");
        }
        AppError::ProbeUnreachable(_) => {
            eprintln!();
            eprintln!("Connectivity troubleshooting:");
            eprintln!("  - Check your internet connection");
            eprintln!("  - Try --no-secure if an intercepting proxy breaks HTTPS");
            eprintln!("  - Pin a server with --server-url to rule out discovery issues");
        }
        AppError::TransferFailed(_) => {
            eprintln!();
            eprintln!("Transfer troubleshooting:");
            eprintln!("  - The chosen server may be overloaded; run again");
            eprintln!("  - Reduce parallel connections with --connections");
        }
        AppError::InsufficientSample(_) => {
            eprintln!();
            eprintln!("  - Increase the sampling duration with --time");
        }
        _ => {}
    }
}
