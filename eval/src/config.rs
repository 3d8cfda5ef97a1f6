// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Run configuration: classifier endpoint, credential and output paths

use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Environment variable holding the inference API token
pub const TOKEN_ENV_VAR: &str = "HF_TOKEN";

/// Hosted fake news model queried by default
pub const DEFAULT_API_URL: &str =
    "https://api-inference.huggingface.co/models/mrm8488/bert-tiny-finetuned-fake-news";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing environment variable: {0}")]
    MissingCredential(&'static str),
}

impl ConfigError {
    /// Process exit code for this failure
    pub fn exit_code(&self) -> u8 {
        match self {
            ConfigError::MissingCredential(_) => 1,
        }
    }
}

/// How the scorer treats a row whose classification failed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Record the row as REAL with confidence 0.5
    #[default]
    Fallback,
    /// Record the row as ERROR and count it incorrect
    Incorrect,
    /// Stop the run at the first failure
    Abort,
}

/// Settings for the remote classifier client
#[derive(Clone)]
pub struct ClassifierConfig {
    pub api_url: String,
    pub token: String,
    /// Total request timeout; `None` keeps the HTTP client's default
    pub timeout: Option<Duration>,
}

impl std::fmt::Debug for ClassifierConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClassifierConfig")
            .field("api_url", &self.api_url)
            .field("token", &"<redacted>")
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl ClassifierConfig {
    /// Read the credential through `lookup`, using the default endpoint.
    ///
    /// An empty token counts as missing.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let token = lookup(TOKEN_ENV_VAR)
            .filter(|t| !t.trim().is_empty())
            .ok_or(ConfigError::MissingCredential(TOKEN_ENV_VAR))?;

        Ok(Self {
            api_url: DEFAULT_API_URL.to_string(),
            token,
            timeout: None,
        })
    }

    /// Read the credential from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

/// File locations and scoring behavior for one run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Labeled input CSV
    pub input: PathBuf,
    /// Per-row results CSV
    pub results: PathBuf,
    /// Bar chart PNG
    pub chart: PathBuf,
    /// Plain-text report
    pub report: PathBuf,
    /// Optional JSON run summary
    pub summary_json: Option<PathBuf>,
    pub failure_policy: FailurePolicy,
    /// Show a progress bar while classifying
    pub show_progress: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from("news.csv"),
            results: PathBuf::from("results.csv"),
            chart: PathBuf::from("results_chart.png"),
            report: PathBuf::from("report.txt"),
            summary_json: None,
            failure_policy: FailurePolicy::Fallback,
            show_progress: true,
        }
    }
}
