// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Plain-text narrative report

use crate::metrics::ReportStatistics;
use crate::pipeline::ensure_parent_dir;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::path::Path;

const DATA_SOURCE_NOTES: &[&str] = &["Data prepared by hand (synthetic)."];

const CONCLUSIONS: &[&str] = &[
    "The model works correctly for unambiguous headlines.",
    "Short titles lower its effectiveness.",
];

const IMPROVEMENT_IDEAS: &[&str] = &["More training data.", "Analysis of the information source."];

/// Build the report text
pub fn generate_report(stats: &ReportStatistics, generated_at: DateTime<Utc>) -> String {
    let mut report = String::new();

    report.push_str("REPORT - Fake News Detector\n");
    report.push_str(&format!("Generated: {}\n\n", generated_at.format("%Y-%m-%d %H:%M:%S UTC")));

    report.push_str("DATA SOURCE:\n");
    push_bullets(&mut report, DATA_SOURCE_NOTES);
    report.push('\n');

    report.push_str("STATISTICS:\n");
    report.push_str(&format!("- REAL: {}\n", stats.real_count));
    report.push_str(&format!("- FAKE: {}\n", stats.fake_count));
    if stats.other_count > 0 {
        report.push_str(&format!("- Other labels: {}\n", stats.other_count));
    }
    if stats.skipped_rows > 0 {
        report.push_str(&format!(
            "- Skipped rows (fewer than two fields): {}\n",
            stats.skipped_rows
        ));
    }
    report.push('\n');

    report.push_str("MODEL RESULTS:\n");
    report.push_str(&format!("- Correct: {}\n", stats.correct));
    report.push_str(&format!("- Incorrect: {}\n", stats.incorrect));
    if stats.total_records == 0 {
        report.push_str(&format!(
            "- Accuracy: {:.2}% (no records scored)\n",
            stats.accuracy_percent()
        ));
    } else {
        report.push_str(&format!("- Accuracy: {:.2}%\n", stats.accuracy_percent()));
    }
    if stats.failed > 0 {
        report.push_str(&format!("- Classification failures: {}\n", stats.failed));
    }
    report.push('\n');

    report.push_str("DETAILED METRICS:\n");
    report.push_str(&format!("- Precision (FAKE): {:.4}\n", stats.confusion.precision()));
    report.push_str(&format!("- Recall (FAKE): {:.4}\n", stats.confusion.recall()));
    report.push_str(&format!("- F1 (FAKE): {:.4}\n", stats.confusion.f1_score()));
    report.push_str(&format!("- Specificity (REAL): {:.4}\n", stats.confusion.specificity()));
    report.push_str(&format!("- Pairs in matrix: {}\n", stats.confusion.total()));
    report.push_str("- Confusion matrix:\n");
    report.push_str(&stats.confusion.format());
    report.push('\n');

    report.push_str("CONCLUSIONS:\n");
    push_bullets(&mut report, CONCLUSIONS);
    report.push('\n');

    report.push_str("IMPROVEMENT IDEAS:\n");
    push_bullets(&mut report, IMPROVEMENT_IDEAS);

    report
}

fn push_bullets(report: &mut String, lines: &[&str]) {
    for line in lines {
        report.push_str("- ");
        report.push_str(line);
        report.push('\n');
    }
}

/// Write the report to disk
pub fn write_report(
    stats: &ReportStatistics,
    generated_at: DateTime<Utc>,
    path: &Path,
) -> Result<()> {
    ensure_parent_dir(path)?;
    std::fs::write(path, generate_report(stats, generated_at))
        .with_context(|| format!("Failed to write report: {}", path.display()))?;
    tracing::info!("Report saved to {}", path.display());
    Ok(())
}
