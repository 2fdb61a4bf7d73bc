//! Colored summary formatting with terminal color support

use super::formatter::{format_latency, format_mbps, SummaryFormatter};
use crate::models::MeasurementResult;
use colored::Colorize;

/// Colored formatter mirroring the plain summary block layout.
pub struct ColoredFormatter;

impl ColoredFormatter {
    pub fn new() -> Self {
        Self
    }

    fn label_line(&self, label: &str, value: &str) -> String {
        format!("{}: {}", format!("{:<10}", label).cyan(), value)
    }
}

impl Default for ColoredFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl SummaryFormatter for ColoredFormatter {
    fn format_summary(&self, result: &MeasurementResult) -> String {
        let client = result.client.as_ref();
        let server = result
            .endpoint
            .as_ref()
            .map(|e| e.display_name())
            .unwrap_or_else(|| "-".to_string());

        let latency = format_latency(result.latency.as_ref().map(|l| l.avg_ms));
        let download = format_mbps(result.download_mbps);
        let upload = format_mbps(result.upload_mbps);

        let mut lines = vec![
            "Speedtest Results".bold().to_string(),
            "==================".dimmed().to_string(),
            self.label_line("ISP", client.map(|c| c.isp.as_str()).unwrap_or("-")),
            self.label_line("IP", client.map(|c| c.ip.as_str()).unwrap_or("-")),
            self.label_line("Location", client.map(|c| c.country.as_str()).unwrap_or("-")),
            String::new(),
            self.label_line("Server", &server),
            self.label_line("Latency", &latency.yellow().to_string()),
            self.label_line("Download", &download.green().to_string()),
            self.label_line("Upload", &upload.green().to_string()),
        ];

        for warning in &result.warnings {
            lines.push(format!("{} {}", "warning:".yellow().bold(), warning));
        }

        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_colored_summary_contains_all_labels() {
        // Force styling off so the assertion works in any environment
        colored::control::set_override(false);
        let result = MeasurementResult::new();
        let text = ColoredFormatter::new().format_summary(&result);
        for label in ["ISP", "IP", "Location", "Server", "Latency", "Download", "Upload"] {
            assert!(text.contains(label), "missing label {label}");
        }
        colored::control::unset_override();
    }
}
