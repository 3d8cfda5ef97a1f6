// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Fake news detector evaluation CLI
//!
//! Usage:
//!   HF_TOKEN=... fake-news-detector --input news.csv
//!   fake-news-detector --input news.csv --on-failure abort --summary-json out/summary.json

use anyhow::Result;
use clap::Parser;
use fakenews_eval::config::{
    ClassifierConfig, ConfigError, FailurePolicy, PipelineConfig, DEFAULT_API_URL, TOKEN_ENV_VAR,
};
use fakenews_eval::pipeline::{EvaluationPipeline, PipelineError, RunResults};
use fakenews_eval::HuggingFaceClassifier;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Exit code for failures without a dedicated code
const EXIT_OTHER: u8 = 5;

#[derive(Parser, Debug)]
#[command(name = "fake-news-detector")]
#[command(about = "Score a hosted fake news classifier against a labeled CSV file")]
#[command(version)]
struct Args {
    /// Labeled input CSV (text columns, then the REAL/FAKE label)
    #[arg(short, long, default_value = "news.csv")]
    input: PathBuf,

    /// Per-row results CSV
    #[arg(short, long, default_value = "results.csv")]
    output: PathBuf,

    /// Bar chart PNG
    #[arg(long, default_value = "results_chart.png")]
    chart: PathBuf,

    /// Plain-text report
    #[arg(long, default_value = "report.txt")]
    report: PathBuf,

    /// Also write a JSON run summary to this path
    #[arg(long)]
    summary_json: Option<PathBuf>,

    /// Classification endpoint
    #[arg(long, default_value = DEFAULT_API_URL)]
    api_url: String,

    /// Request timeout in seconds (HTTP client default when omitted)
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// What to do with a row whose classification fails
    #[arg(long, value_enum, default_value_t = FailurePolicy::Fallback)]
    on_failure: FailurePolicy,

    /// Disable the progress bar
    #[arg(long)]
    no_progress: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    // Credential first: nothing is read or written without it.
    let classifier_config = match ClassifierConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Error: {}", err);
            eprintln!("Set it before running, for example:");
            eprintln!("  export {}=<your inference API token>", TOKEN_ENV_VAR);
            return ExitCode::from(err.exit_code());
        }
    };

    match run(args, classifier_config) {
        Ok(results) => {
            print_summary(&results);
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("Error: {:#}", err);
            ExitCode::from(exit_code(&err))
        }
    }
}

fn run(args: Args, classifier_config: ClassifierConfig) -> Result<RunResults> {
    let classifier_config = classifier_config
        .with_api_url(args.api_url)
        .with_timeout(args.timeout_secs.map(Duration::from_secs));
    let classifier = HuggingFaceClassifier::new(classifier_config)?;

    let config = PipelineConfig {
        input: args.input,
        results: args.output,
        chart: args.chart,
        report: args.report,
        summary_json: args.summary_json,
        failure_policy: args.on_failure,
        show_progress: !args.no_progress,
    };

    tracing::info!("Fake News Detector Evaluation");
    tracing::info!("=============================");
    tracing::info!("Input: {}", config.input.display());
    tracing::info!("Endpoint: {}", classifier.api_url());
    tracing::info!("On failure: {:?}", config.failure_policy);

    let pipeline = EvaluationPipeline::new(config, Box::new(classifier));
    pipeline.run()
}

fn exit_code(err: &anyhow::Error) -> u8 {
    for cause in err.chain() {
        if let Some(pipeline_err) = cause.downcast_ref::<PipelineError>() {
            return pipeline_err.exit_code();
        }
        if let Some(config_err) = cause.downcast_ref::<ConfigError>() {
            return config_err.exit_code();
        }
    }
    EXIT_OTHER
}

fn print_summary(results: &RunResults) {
    let stats = &results.statistics;

    println!("\n{}", "=".repeat(50));
    println!("EVALUATION SUMMARY");
    println!("{}", "=".repeat(50));
    println!("Loaded {} rows from {}", stats.total_records, results.config.input.display());
    if stats.skipped_rows > 0 {
        println!("Skipped {} malformed rows", stats.skipped_rows);
    }
    println!("Label distribution: REAL={}, FAKE={}", stats.real_count, stats.fake_count);
    println!("Correct:   {}", stats.correct);
    println!("Incorrect: {}", stats.incorrect);
    println!("Accuracy:  {:.2}%", stats.accuracy_percent());
    if stats.failed > 0 {
        println!("Failed classifications: {}", stats.failed);
    }

    let mut saved = vec![
        results.config.results.display().to_string(),
        results.config.report.display().to_string(),
        results.config.chart.display().to_string(),
    ];
    if let Some(ref path) = results.config.summary_json {
        saved.push(path.display().to_string());
    }
    println!("\nSaved: {}", saved.join(", "));
}
