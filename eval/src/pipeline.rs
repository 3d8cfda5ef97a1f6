// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! End-to-end evaluation run
//!
//! Orchestrates:
//! - Loading labeled records
//! - Classifying each record against the remote model, in input order
//! - Writing the per-row results table
//! - Chart, text report and optional JSON summary

use crate::chart;
use crate::classifier::{ClassifyError, Classifier};
use crate::config::{FailurePolicy, PipelineConfig};
use crate::datasets::{self, Label, Record};
use crate::metrics::{ReportStatistics, Tally};
use crate::report;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Header row of the results table
pub const RESULTS_HEADER: [&str; 4] = ["text", "true_label", "predicted_label", "score"];

/// Predicted label written for rows the `incorrect` policy gave up on
pub const ERROR_LABEL: &str = "ERROR";

/// Verdict substituted by the `fallback` policy
const FALLBACK_CONFIDENCE: f64 = 0.5;

/// Fatal run failures that map to their own exit codes
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("input file not found: {}", .0.display())]
    InputNotFound(PathBuf),
    #[error("classification failed for row {row}")]
    ClassificationAborted {
        row: usize,
        #[source]
        source: ClassifyError,
    },
}

impl PipelineError {
    /// Process exit code for this failure
    pub fn exit_code(&self) -> u8 {
        match self {
            PipelineError::InputNotFound(_) => 3,
            PipelineError::ClassificationAborted { .. } => 4,
        }
    }
}

/// What scoring produced besides the results file
#[derive(Debug, Clone, Default)]
pub struct ScoringOutcome {
    pub tally: Tally,
    /// Predicted label per record, aligned with the input
    pub predicted: Vec<Label>,
}

/// Classify every record in order, writing one results row per record.
///
/// Writes the header first. Failed classifications are resolved by `policy`;
/// under `FailurePolicy::Abort` the first failure ends scoring with
/// [`PipelineError::ClassificationAborted`].
pub fn score_records<W: Write>(
    records: &[Record],
    classifier: &dyn Classifier,
    writer: &mut csv::Writer<W>,
    policy: FailurePolicy,
    progress: &ProgressBar,
) -> Result<ScoringOutcome> {
    writer.write_record(RESULTS_HEADER).context("Failed to write results header")?;

    let mut outcome = ScoringOutcome {
        tally: Tally::default(),
        predicted: Vec::with_capacity(records.len()),
    };

    for (idx, record) in records.iter().enumerate() {
        let row = idx + 1;

        let (predicted, score, forced_incorrect) = match classifier.classify(&record.text) {
            Ok(verdict) => (verdict.label, verdict.confidence, false),
            Err(err) => match policy {
                FailurePolicy::Abort => {
                    progress.abandon();
                    return Err(PipelineError::ClassificationAborted { row, source: err }.into());
                }
                FailurePolicy::Fallback => {
                    tracing::warn!(
                        "Row {}: {}; recording fallback REAL/{:.1}",
                        row,
                        err.with_causes(),
                        FALLBACK_CONFIDENCE
                    );
                    outcome.tally.failed += 1;
                    (Label::Real, FALLBACK_CONFIDENCE, false)
                }
                FailurePolicy::Incorrect => {
                    tracing::warn!("Row {}: {}; counting as incorrect", row, err.with_causes());
                    outcome.tally.failed += 1;
                    (Label::Other(ERROR_LABEL.to_string()), 0.0, true)
                }
            },
        };

        let score_field = format!("{:.4}", score);
        writer
            .write_record([
                record.text.as_str(),
                record.true_label.as_str(),
                predicted.as_str(),
                score_field.as_str(),
            ])
            .with_context(|| format!("Failed to write results row {}", row))?;

        outcome.tally.record(!forced_incorrect && predicted == record.true_label);
        outcome.predicted.push(predicted);
        progress.inc(1);
    }

    writer.flush().context("Failed to flush results table")?;
    progress.finish_and_clear();

    Ok(outcome)
}

/// Everything a run produced, serializable as the JSON summary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResults {
    pub config: PipelineConfig,
    pub classifier: String,
    pub statistics: ReportStatistics,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

/// Main evaluation pipeline
pub struct EvaluationPipeline {
    config: PipelineConfig,
    classifier: Box<dyn Classifier>,
}

impl EvaluationPipeline {
    pub fn new(config: PipelineConfig, classifier: Box<dyn Classifier>) -> Self {
        Self { config, classifier }
    }

    /// Run the full pipeline, stamping outputs with the current time
    pub fn run(&self) -> Result<RunResults> {
        self.run_at(Utc::now())
    }

    /// Run the full pipeline with a fixed timestamp
    pub fn run_at(&self, timestamp: DateTime<Utc>) -> Result<RunResults> {
        let config = &self.config;

        if !config.input.exists() {
            return Err(PipelineError::InputNotFound(config.input.clone()).into());
        }

        let loaded = datasets::load_records(&config.input)?;
        tracing::info!("Loaded {} rows from {}", loaded.len(), config.input.display());

        let dist = datasets::label_distribution(&loaded.records);
        tracing::info!(
            "Label distribution: REAL={}, FAKE={}",
            dist.get(&Label::Real).copied().unwrap_or(0),
            dist.get(&Label::Fake).copied().unwrap_or(0)
        );

        ensure_parent_dir(&config.results)?;
        let mut writer = csv::Writer::from_path(&config.results)
            .with_context(|| {
                format!("Failed to create results file: {}", config.results.display())
            })?;

        tracing::info!("Classifying {} records with {}", loaded.len(), self.classifier.name());
        let progress = self.progress_bar(loaded.len());
        let outcome = score_records(
            &loaded.records,
            self.classifier.as_ref(),
            &mut writer,
            config.failure_policy,
            &progress,
        )?;
        drop(writer);
        tracing::info!("Results saved to {}", config.results.display());

        let statistics = ReportStatistics::compute(
            &loaded.records,
            &outcome.predicted,
            &outcome.tally,
            loaded.skipped_rows,
        );

        tracing::info!(
            "Correct: {}, Incorrect: {}, Accuracy: {:.2}%",
            statistics.correct,
            statistics.incorrect,
            statistics.accuracy_percent()
        );
        if statistics.failed > 0 {
            tracing::warn!(
                "{} classification(s) failed ({:?} policy)",
                statistics.failed,
                config.failure_policy
            );
        }

        chart::save_tally_chart(&outcome.tally, &config.chart)?;
        report::write_report(&statistics, timestamp, &config.report)?;

        let results = RunResults {
            config: config.clone(),
            classifier: self.classifier.name().to_string(),
            statistics,
            timestamp,
            version: env!("CARGO_PKG_VERSION").to_string(),
        };

        if let Some(ref path) = config.summary_json {
            Self::save_results(&results, path)?;
        }

        Ok(results)
    }

    fn progress_bar(&self, len: usize) -> ProgressBar {
        if !self.config.show_progress {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(len as u64);
        let style = ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} ({eta})",
        )
        .map(|s| s.progress_chars("#>-"))
        .unwrap_or_else(|_| ProgressStyle::default_bar());
        pb.set_style(style);
        pb
    }

    /// Save results to JSON file
    pub fn save_results(results: &RunResults, output_path: &Path) -> Result<()> {
        ensure_parent_dir(output_path)?;
        let json = serde_json::to_string_pretty(results)?;
        std::fs::write(output_path, json)
            .with_context(|| format!("Failed to write summary: {}", output_path.display()))?;
        tracing::info!("Summary saved to {}", output_path.display());
        Ok(())
    }
}

/// Create the parent directory of `path` if it has one
pub(crate) fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    Ok(())
}
