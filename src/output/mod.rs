//! Output formatting for the final result: human summary block (plain or
//! colored) and the JSON document.

mod colored;
mod formatter;

pub use self::colored::ColoredFormatter;
pub use self::formatter::{format_mbps, PlainFormatter, SummaryFormatter};

use crate::{
    error::{AppError, Result},
    models::JsonReport,
};

/// Output formatting factory for creating appropriate formatters
pub struct OutputFormatterFactory;

impl OutputFormatterFactory {
    /// Create a summary formatter based on color preference
    pub fn create_formatter(enable_color: bool) -> Box<dyn SummaryFormatter> {
        if enable_color {
            Box::new(ColoredFormatter::new())
        } else {
            Box::new(PlainFormatter::new())
        }
    }
}

/// Serialize a JSON report to its single-line document form
pub fn render_json(report: &JsonReport) -> Result<String> {
    serde_json::to_string(report)
        .map_err(|e| AppError::internal(format!("serializing result failed: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MeasurementResult;

    #[test]
    fn test_render_json_is_parseable() {
        let mut result = MeasurementResult::new();
        result.download_mbps = Some(12.5);
        let report = JsonReport::from_result(&result);
        let text = render_json(&report).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert!((value["download_mbps"].as_f64().unwrap() - 12.5).abs() < 1e-9);
        assert!(value["error"].is_null());
    }

    #[test]
    fn test_factory_returns_working_formatters() {
        let result = MeasurementResult::new();
        for enable_color in [true, false] {
            let formatter = OutputFormatterFactory::create_formatter(enable_color);
            let text = formatter.format_summary(&result);
            assert!(text.contains("Speedtest Results"));
        }
    }
}
