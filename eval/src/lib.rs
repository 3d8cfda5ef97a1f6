// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Evaluation of a remote fake news classifier
//!
//! This crate provides:
//! - Loading labeled snippets from CSV
//! - A blocking client for a hosted text-classification model
//! - Scoring with a per-row results table and configurable failure handling
//! - Accuracy statistics, a bar chart and a plain-text report

pub mod chart;
pub mod classifier;
pub mod config;
pub mod datasets;
pub mod metrics;
pub mod pipeline;
pub mod report;

pub use classifier::{Classifier, ClassifyError, HuggingFaceClassifier, Verdict};
pub use config::{ClassifierConfig, ConfigError, FailurePolicy, PipelineConfig};
pub use datasets::{Label, LoadedRecords, Record};
pub use metrics::{ConfusionMatrix, ReportStatistics, Tally};
pub use pipeline::{EvaluationPipeline, PipelineError, RunResults};
