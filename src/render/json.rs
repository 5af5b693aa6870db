//! Report JSON generation.

use anyhow::{Context, Result};
use serde_json::Value;
use std::path::Path;

use crate::domain::AnalysisReport;

/// Pretty-printed JSON for a report.
///
/// Without `include_timestamp` the output is byte-stable for a fixed input.
pub fn render_json(report: &AnalysisReport, include_timestamp: bool) -> Result<String> {
    let mut value = serde_json::to_value(report)?;
    if !include_timestamp {
        if let Value::Object(map) = &mut value {
            map.remove("generated_at");
        }
    }
    Ok(serde_json::to_string_pretty(&value)?)
}

pub fn write_report(report_path: &Path, report: &AnalysisReport, include_timestamp: bool) -> Result<()> {
    if let Some(parent) = report_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let rendered = render_json(report, include_timestamp)?;
    std::fs::write(report_path, format!("{rendered}\n"))
        .with_context(|| format!("Failed to write report to {}", report_path.display()))?;
    Ok(())
}
