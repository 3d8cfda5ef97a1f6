// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Remote fake news classifier
//!
//! The hosted model is a black box: one blocking POST per snippet, answered
//! with a ranked list of `{label, score}` pairs. Only the top entry is used.

use crate::config::ClassifierConfig;
use crate::datasets::Label;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::error::Error as StdError;
use thiserror::Error;

/// Longest response excerpt kept in an error message
const BODY_EXCERPT_CHARS: usize = 200;

/// Verdict returned for a single snippet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    /// Always `Label::Real` or `Label::Fake`
    pub label: Label,
    /// Model score for `label`
    pub confidence: f64,
}

impl Verdict {
    pub fn new(label: Label, confidence: f64) -> Self {
        Self { label, confidence }
    }
}

/// Why a snippet could not be classified
#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("classifier request failed")]
    Transport(#[from] reqwest::Error),
    #[error("classifier returned invalid JSON (HTTP {status})")]
    InvalidJson {
        status: u16,
        #[source]
        source: serde_json::Error,
    },
    #[error("unexpected classifier response (HTTP {status}): {reason}")]
    UnexpectedShape { status: u16, reason: String },
}

impl ClassifyError {
    /// This error followed by each underlying cause, joined with `": "`
    pub fn with_causes(&self) -> String {
        std::iter::successors(Some(self as &(dyn StdError + 'static)), |&err| err.source())
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(": ")
    }
}

/// Anything that can turn a snippet into a verdict
pub trait Classifier: Send + Sync {
    /// Classify one snippet
    fn classify(&self, text: &str) -> Result<Verdict, ClassifyError>;

    /// Name used in logs and the run summary
    fn name(&self) -> &str;
}

#[derive(Debug, Serialize)]
struct InferenceRequest<'a> {
    inputs: &'a str,
}

/// Client for a hosted text-classification endpoint with bearer auth
pub struct HuggingFaceClassifier {
    client: reqwest::blocking::Client,
    api_url: String,
    token: String,
}

impl HuggingFaceClassifier {
    pub fn new(config: ClassifierConfig) -> Result<Self> {
        let mut builder = reqwest::blocking::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().context("Failed to build classifier HTTP client")?;

        Ok(Self {
            client,
            api_url: config.api_url,
            token: config.token,
        })
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }
}

impl Classifier for HuggingFaceClassifier {
    fn classify(&self, text: &str) -> Result<Verdict, ClassifyError> {
        tracing::debug!("POST {} ({} chars)", self.api_url, text.chars().count());

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.token)
            .json(&InferenceRequest { inputs: text })
            .send()?;

        // The body decides success; error objects arrive with 2xx and 5xx alike.
        let status = response.status().as_u16();
        let body = response.bytes()?;
        let value: Value = serde_json::from_slice(&body)
            .map_err(|source| ClassifyError::InvalidJson { status, source })?;

        interpret_response(status, &value)
    }

    fn name(&self) -> &str {
        &self.api_url
    }
}

/// Turn a decoded response body into a verdict.
///
/// Accepts `[{label, score}, ...]` and the nested `[[{label, score}, ...]]`
/// form. A top label containing `REAL` (case-insensitive) is a REAL verdict;
/// any other label is FAKE.
pub fn interpret_response(status: u16, body: &Value) -> Result<Verdict, ClassifyError> {
    let shape_error = |reason: String| ClassifyError::UnexpectedShape { status, reason };

    let items = match body {
        Value::Array(items) => items,
        Value::Object(map) => {
            let reason = match map.get("error") {
                Some(Value::String(message)) => format!("service error: {}", message),
                _ => format!("expected a JSON array, got {}", excerpt(body)),
            };
            return Err(shape_error(reason));
        }
        other => return Err(shape_error(format!("expected a JSON array, got {}", excerpt(other)))),
    };

    let mut top = items
        .first()
        .ok_or_else(|| shape_error("empty prediction list".to_string()))?;
    if let Value::Array(nested) = top {
        top = nested
            .first()
            .ok_or_else(|| shape_error("empty prediction list".to_string()))?;
    }

    let label = top
        .get("label")
        .and_then(Value::as_str)
        .ok_or_else(|| {
            shape_error(format!("prediction without a string label: {}", excerpt(top)))
        })?;
    let score = top
        .get("score")
        .and_then(Value::as_f64)
        .ok_or_else(|| {
            shape_error(format!("prediction without a numeric score: {}", excerpt(top)))
        })?;

    let label = if label.to_uppercase().contains("REAL") {
        Label::Real
    } else {
        Label::Fake
    };

    Ok(Verdict::new(label, score))
}

fn excerpt(value: &Value) -> String {
    let text = value.to_string();
    if text.chars().count() <= BODY_EXCERPT_CHARS {
        text
    } else {
        text.chars().take(BODY_EXCERPT_CHARS).collect::<String>() + "..."
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_real_label() {
        let body = json!([{"label": "REAL", "score": 0.93}, {"label": "FAKE", "score": 0.07}]);
        let verdict = interpret_response(200, &body).unwrap();

        assert_eq!(verdict.label, Label::Real);
        assert!((verdict.confidence - 0.93).abs() < 1e-9);
    }

    #[test]
    fn test_label_match_is_case_insensitive_substring() {
        let body = json!([{"label": "likely_real", "score": 0.6}]);
        let verdict = interpret_response(200, &body).unwrap();
        assert_eq!(verdict.label, Label::Real);
    }

    #[test]
    fn test_unrecognized_label_is_fake() {
        let body = json!([{"label": "LABEL_1", "score": 0.71}]);
        let verdict = interpret_response(200, &body).unwrap();

        assert_eq!(verdict.label, Label::Fake);
        assert!((verdict.confidence - 0.71).abs() < 1e-9);
    }

    #[test]
    fn test_nested_list() {
        let body = json!([[{"label": "FAKE", "score": 0.8}, {"label": "REAL", "score": 0.2}]]);
        let verdict = interpret_response(200, &body).unwrap();

        assert_eq!(verdict.label, Label::Fake);
        assert!((verdict.confidence - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_error_object_is_a_failure() {
        let body = json!({"error": "Model is currently loading", "estimated_time": 20.0});
        let err = interpret_response(503, &body).unwrap_err();

        match err {
            ClassifyError::UnexpectedShape { status, reason } => {
                assert_eq!(status, 503);
                assert!(reason.contains("currently loading"));
            }
            other => panic!("Expected UnexpectedShape, got {:?}", other),
        }
    }

    #[test]
    fn test_non_array_values_are_failures() {
        for body in [json!("oops"), json!(42), json!(null), json!({"status": "ok"})] {
            let err = interpret_response(200, &body).unwrap_err();
            assert!(matches!(err, ClassifyError::UnexpectedShape { .. }));
        }
    }

    #[test]
    fn test_empty_list_is_a_failure() {
        assert!(interpret_response(200, &json!([])).is_err());
        assert!(interpret_response(200, &json!([[]])).is_err());
    }

    #[test]
    fn test_missing_fields_are_failures() {
        assert!(interpret_response(200, &json!([{"score": 0.5}])).is_err());
        assert!(interpret_response(200, &json!([{"label": "REAL"}])).is_err());
        assert!(interpret_response(200, &json!([{"label": "REAL", "score": "high"}])).is_err());
    }

    #[test]
    fn test_invalid_json_names_its_cause_once() {
        let source = serde_json::from_str::<Value>("<html>").unwrap_err();
        let cause = source.to_string();
        let err = ClassifyError::InvalidJson { status: 502, source };

        assert_eq!(err.to_string(), "classifier returned invalid JSON (HTTP 502)");
        let full = err.with_causes();
        assert_eq!(full.matches(cause.as_str()).count(), 1);
        assert!(full.starts_with("classifier returned invalid JSON (HTTP 502): "));
    }

    #[test]
    fn test_excerpt_truncates_long_bodies() {
        let long = Value::String("x".repeat(1000));
        let text = excerpt(&long);
        assert!(text.ends_with("..."));
        assert_eq!(text.chars().count(), BODY_EXCERPT_CHARS + 3);
    }
}
