//! Live-progress state machine and terminal reporter.
//!
//! The measurement pipeline publishes [`ProgressEvent`]s on an unbounded
//! channel; the reporter task consumes them while redrawing a spinner line
//! on its own fixed tick. Render cadence is therefore decoupled from network
//! event timing: the spinner always turns at the same speed and shows the
//! latest rate snapshot, however bursty the sample stream is.

use crate::{
    defaults,
    error::{AppError, Result},
    models::{Endpoint, LatencyStats, RunConfig},
};
use colored::Colorize;
use std::io::{self, Write};
use std::time::Instant;
use tokio::{sync::mpsc, task::JoinHandle};

const SPINNER_GLYPHS: &[&str] = &["⠋", "⠙", "⠸", "⠴", "⠦", "⠇"];

/// Stages of a measurement run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestPhase {
    Idle,
    ProbingLatency,
    TestingDownload,
    TestingUpload,
    Finalizing,
    Done,
    Error,
}

impl TestPhase {
    /// Stage label shown beside the spinner
    pub fn label(&self) -> &'static str {
        match self {
            TestPhase::Idle => "Starting",
            TestPhase::ProbingLatency => "Finding best server",
            TestPhase::TestingDownload => "Measuring download",
            TestPhase::TestingUpload => "Measuring upload",
            TestPhase::Finalizing => "Finalizing",
            TestPhase::Done => "Done",
            TestPhase::Error => "Error",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TestPhase::Done | TestPhase::Error)
    }

    /// The phase that naturally follows this one for the given run
    /// configuration; skipped phases are transitioned around entirely.
    pub fn next_for(&self, config: &RunConfig) -> TestPhase {
        match self {
            TestPhase::Idle => TestPhase::ProbingLatency,
            TestPhase::ProbingLatency => {
                if config.run_download {
                    TestPhase::TestingDownload
                } else if config.run_upload {
                    TestPhase::TestingUpload
                } else {
                    TestPhase::Finalizing
                }
            }
            TestPhase::TestingDownload => {
                if config.run_upload {
                    TestPhase::TestingUpload
                } else {
                    TestPhase::Finalizing
                }
            }
            TestPhase::TestingUpload => TestPhase::Finalizing,
            TestPhase::Finalizing => TestPhase::Done,
            TestPhase::Done | TestPhase::Error => *self,
        }
    }
}

/// Tracks the current phase and enforces legal transitions.
#[derive(Debug)]
pub struct RunState {
    phase: TestPhase,
}

impl RunState {
    pub fn new() -> Self {
        Self { phase: TestPhase::Idle }
    }

    pub fn phase(&self) -> TestPhase {
        self.phase
    }

    /// Move to `next`. Only the configured successor or the `Error` state
    /// are reachable from any given phase.
    pub fn advance(&mut self, next: TestPhase, config: &RunConfig) -> Result<()> {
        if next == TestPhase::Error {
            self.phase = TestPhase::Error;
            return Ok(());
        }
        let expected = self.phase.next_for(config);
        if next != expected {
            return Err(AppError::internal(format!(
                "illegal phase transition {:?} -> {:?} (expected {:?})",
                self.phase, next, expected
            )));
        }
        self.phase = next;
        Ok(())
    }
}

impl Default for RunState {
    fn default() -> Self {
        Self::new()
    }
}

/// State updates flowing from the measurement pipeline to the reporter
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// A phase began; the spinner line switches to its label
    PhaseStarted(TestPhase),
    /// Fresh smoothed instantaneous rate from the aggregator
    RateUpdate { mbps: f64 },
    /// Discovery and probing settled on an endpoint
    EndpointChosen { endpoint: Endpoint, latency: LatencyStats },
    /// Download phase finished with its final rate
    DownloadDone { mbps: f64 },
    /// Upload phase finished with its final rate
    UploadDone { mbps: f64 },
    /// A phase failed non-fatally; the run continues
    PhaseWarning(String),
    /// The run is over (successfully or not); the reporter shuts down
    Finished,
}

/// How much the reporter is allowed to draw
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReporterMode {
    /// Spinner line plus completion lines
    Live,
    /// Completion lines only, no spinner (for `--no-live`)
    Plain,
}

/// Consumes progress events and renders them to the terminal.
pub struct LiveReporter {
    events: mpsc::UnboundedReceiver<ProgressEvent>,
    mode: ReporterMode,
    enable_color: bool,
}

impl LiveReporter {
    pub fn new(
        events: mpsc::UnboundedReceiver<ProgressEvent>,
        mode: ReporterMode,
        enable_color: bool,
    ) -> Self {
        Self { events, mode, enable_color }
    }

    /// Spawn the reporter onto the runtime; the task ends when the event
    /// channel closes or `Finished` arrives.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    async fn run(self) {
        let LiveReporter { mut events, mode, enable_color } = self;
        let screen = Screen { mode, enable_color };

        let mut ticker = tokio::time::interval(defaults::RENDER_TICK);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        let mut spinner_idx = 0usize;
        let mut current: Option<(TestPhase, Instant)> = None;
        let mut latest_mbps: Option<f64> = None;
        let mut drawn = false;

        loop {
            tokio::select! {
                event = events.recv() => match event {
                    None => break,
                    Some(ProgressEvent::Finished) => {
                        screen.clear_line(&mut drawn);
                        break;
                    }
                    Some(event) => {
                        screen.clear_line(&mut drawn);
                        screen.handle_event(event, &mut current, &mut latest_mbps);
                    }
                },
                _ = ticker.tick() => {
                    if screen.mode == ReporterMode::Live {
                        if let Some((phase, started)) = current {
                            screen.draw_spinner(phase, started, latest_mbps, spinner_idx, &mut drawn);
                            spinner_idx = spinner_idx.wrapping_add(1);
                        }
                    }
                }
            }
        }
    }
}

/// Rendering half of the reporter, split off so the event receiver can be
/// polled independently inside the select loop.
struct Screen {
    mode: ReporterMode,
    enable_color: bool,
}

impl Screen {
    fn handle_event(
        &self,
        event: ProgressEvent,
        current: &mut Option<(TestPhase, Instant)>,
        latest_mbps: &mut Option<f64>,
    ) {
        match event {
            ProgressEvent::PhaseStarted(phase) => {
                *current = Some((phase, Instant::now()));
                *latest_mbps = None;
            }
            ProgressEvent::RateUpdate { mbps } => {
                *latest_mbps = Some(mbps);
            }
            ProgressEvent::EndpointChosen { endpoint, latency } => {
                let latency_text = format!("{:.2} ms", latency.avg_ms);
                if self.enable_color {
                    println!(
                        "{}: {} | {}: {}",
                        "Server".cyan(),
                        endpoint.display_name(),
                        "Latency".cyan(),
                        latency_text.yellow(),
                    );
                } else {
                    println!(
                        "Server: {} | Latency: {}",
                        endpoint.display_name(),
                        latency_text
                    );
                }
            }
            ProgressEvent::DownloadDone { mbps } => self.print_rate_line("Download", mbps),
            ProgressEvent::UploadDone { mbps } => self.print_rate_line("Upload", mbps),
            ProgressEvent::PhaseWarning(message) => {
                if self.enable_color {
                    println!("{} {}", "warning:".yellow().bold(), message);
                } else {
                    println!("warning: {}", message);
                }
            }
            ProgressEvent::Finished => {}
        }
        let _ = io::stdout().flush();
    }

    fn print_rate_line(&self, label: &str, mbps: f64) {
        let rate = format!("{:.2} Mbps", mbps);
        if self.enable_color {
            println!("{} {}: {}", "✓".green(), label, rate.green());
        } else {
            println!("+ {}: {}", label, rate);
        }
    }

    fn draw_spinner(
        &self,
        phase: TestPhase,
        started: Instant,
        latest_mbps: Option<f64>,
        spinner_idx: usize,
        drawn: &mut bool,
    ) {
        let glyph = SPINNER_GLYPHS[spinner_idx % SPINNER_GLYPHS.len()];
        let elapsed = started.elapsed().as_secs_f64();
        let rate = latest_mbps
            .map(|m| format!(" {:.1} Mbps", m))
            .unwrap_or_default();

        let line = if self.enable_color {
            format!(
                "{} {}{}",
                format!("{} {}", glyph, phase.label()).cyan().dimmed(),
                format!("({:.1}s)", elapsed).dimmed(),
                rate,
            )
        } else {
            format!("{} {} ({:.1}s){}", glyph, phase.label(), elapsed, rate)
        };

        print!("\r{:<78}", line);
        let _ = io::stdout().flush();
        *drawn = true;
    }

    fn clear_line(&self, drawn: &mut bool) {
        if *drawn {
            print!("\r{:<78}\r", "");
            let _ = io::stdout().flush();
            *drawn = false;
        }
    }
}
