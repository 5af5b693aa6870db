//! Plain-text summary of an analysis report.

use std::fmt::Write as _;

use crate::domain::AnalysisReport;

pub fn render_text(report: &AnalysisReport) -> String {
    let mut out = String::new();
    let completeness = if report.index_complete { "complete" } else { "partial" };
    let _ = writeln!(
        out,
        "Analyzed {} changed files (repository index: {} files, {})",
        report.files.len(),
        report.index_size,
        completeness
    );

    for file in &report.files {
        let _ = writeln!(out);
        let marker = if file.is_test() { ", test" } else { "" };
        let _ = writeln!(out, "{} [{}{}]", file.path, file.status.as_str(), marker);

        if !file.dependencies.is_empty() {
            let _ = writeln!(out, "  dependencies:");
            for dep in &file.dependencies {
                let flag = if dep.confidence.is_low() { " ?" } else { "" };
                let _ = writeln!(out, "    {} ({}, {}){}", dep.path, dep.kind, dep.confidence.as_str(), flag);
            }
        }
        if !file.dependents.is_empty() {
            let _ = writeln!(out, "  dependents:");
            for dependent in &file.dependents {
                let _ = writeln!(out, "    {} ({})", dependent.path, dependent.kind);
            }
        }
        if !file.test_files.is_empty() {
            let _ = writeln!(out, "  tests:");
            for test in &file.test_files {
                let _ = writeln!(out, "    {test}");
            }
        }
    }

    let _ = writeln!(out);
    if report.tests_to_modify.is_empty() {
        let _ = writeln!(out, "Tests to modify: none found");
    } else {
        let _ = writeln!(out, "Tests to modify:");
        for test in &report.tests_to_modify {
            let _ = writeln!(out, "  - {test}");
        }
    }
    if !report.untested_files.is_empty() {
        let _ = writeln!(out, "Files without tests:");
        for path in &report.untested_files {
            let _ = writeln!(out, "  - {path}");
        }
    }
    if report.low_confidence_edges > 0 {
        let _ = writeln!(out, "Low-confidence edges (marked ?): {}", report.low_confidence_edges);
    }
    out
}
