//! Plain-text summary formatting

use crate::models::MeasurementResult;

/// Formats the final measurement result as a human-readable summary block.
pub trait SummaryFormatter: Send + Sync {
    fn format_summary(&self, result: &MeasurementResult) -> String;
}

/// Render an optional throughput figure; skipped phases show as "-",
/// never as a zero that could be read as a real measurement.
pub fn format_mbps(mbps: Option<f64>) -> String {
    match mbps {
        Some(value) => format!("{:.2} Mbps", value),
        None => "-".to_string(),
    }
}

/// Render an optional latency average the same way.
pub fn format_latency(avg_ms: Option<f64>) -> String {
    match avg_ms {
        Some(value) => format!("{:.2} ms", value),
        None => "-".to_string(),
    }
}

/// Plain formatter without any terminal styling, for scripts and logs.
pub struct PlainFormatter;

impl PlainFormatter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PlainFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl SummaryFormatter for PlainFormatter {
    fn format_summary(&self, result: &MeasurementResult) -> String {
        let client = result.client.as_ref();
        let server = result
            .endpoint
            .as_ref()
            .map(|e| e.display_name())
            .unwrap_or_else(|| "-".to_string());

        let mut lines = vec![
            "Speedtest Results".to_string(),
            "==================".to_string(),
            format!("ISP       : {}", client.map(|c| c.isp.as_str()).unwrap_or("-")),
            format!("IP        : {}", client.map(|c| c.ip.as_str()).unwrap_or("-")),
            format!("Location  : {}", client.map(|c| c.country.as_str()).unwrap_or("-")),
            String::new(),
            format!("Server    : {}", server),
            format!(
                "Latency   : {}",
                format_latency(result.latency.as_ref().map(|l| l.avg_ms))
            ),
            format!("Download  : {}", format_mbps(result.download_mbps)),
            format!("Upload    : {}", format_mbps(result.upload_mbps)),
        ];

        for warning in &result.warnings {
            lines.push(format!("warning: {}", warning));
        }

        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ClientInfo, Endpoint, LatencyStats};

    fn result_with_everything() -> MeasurementResult {
        let mut result = MeasurementResult::new();
        result.client = Some(ClientInfo {
            ip: "203.0.113.7".to_string(),
            isp: "Example Telekom".to_string(),
            country: "TR".to_string(),
        });
        result.endpoint = Some(
            Endpoint::from_upload_url(
                "1001",
                "Sponsor One",
                "Istanbul",
                "Turkey",
                "http://one.example/speedtest/upload.php",
                false,
            )
            .unwrap(),
        );
        result.latency = Some(LatencyStats {
            min_ms: 10.0,
            avg_ms: 11.0,
            jitter_ms: 1.5,
            samples_used: 3,
            low_confidence: false,
        });
        result.download_mbps = Some(94.2);
        result
    }

    #[test]
    fn test_summary_has_fixed_labels() {
        let text = PlainFormatter::new().format_summary(&result_with_everything());
        for label in ["ISP", "IP", "Location", "Server", "Latency", "Download", "Upload"] {
            assert!(text.contains(label), "missing label {label}");
        }
        assert!(text.contains("94.20 Mbps"));
        assert!(text.contains("11.00 ms"));
        assert!(text.contains("Sponsor One, Istanbul, Turkey"));
    }

    #[test]
    fn test_skipped_upload_renders_dash() {
        let text = PlainFormatter::new().format_summary(&result_with_everything());
        assert!(text.contains("Upload    : -"));
        assert!(!text.contains("Upload    : 0.00"));
    }

    #[test]
    fn test_warnings_are_listed() {
        let mut result = result_with_everything();
        result.warnings.push("upload failed: all 4 connections failed".to_string());
        let text = PlainFormatter::new().format_summary(&result);
        assert!(text.contains("warning: upload failed"));
    }

    #[test]
    fn test_format_mbps() {
        assert_eq!(format_mbps(Some(12.345)), "12.35 Mbps");
        assert_eq!(format_mbps(None), "-");
    }
}
