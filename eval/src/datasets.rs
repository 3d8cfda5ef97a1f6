// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Loading labeled news snippets from a CSV file
//!
//! Each row holds the snippet text followed by its label in the last column.
//! Text containing unquoted commas is recovered by rejoining every column but
//! the last.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Ground-truth or predicted label for a news snippet
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Label {
    /// Genuine news
    Real,
    /// Fabricated news
    Fake,
    /// Any other normalized value found in the label column
    Other(String),
}

impl Label {
    /// Normalize a raw label field: trim, upper-case, map to a known variant
    pub fn normalize(raw: &str) -> Self {
        let normalized = raw.trim().to_uppercase();
        match normalized.as_str() {
            "REAL" => Label::Real,
            "FAKE" => Label::Fake,
            _ => Label::Other(normalized),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Label::Real => "REAL",
            Label::Fake => "FAKE",
            Label::Other(value) => value,
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single labeled snippet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Text content to classify
    pub text: String,
    /// Ground truth label
    pub true_label: Label,
}

impl Record {
    /// Build a record from the fields of one row.
    ///
    /// Returns `None` for rows with fewer than two fields.
    pub fn from_fields<'a, I>(fields: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut fields: Vec<&str> = fields.into_iter().collect();
        if fields.len() < 2 {
            return None;
        }
        let label = fields.pop()?;
        Some(Self {
            text: fields.join(","),
            true_label: Label::normalize(label),
        })
    }
}

/// Records loaded from one input file, in file order
#[derive(Debug, Clone, Default)]
pub struct LoadedRecords {
    pub records: Vec<Record>,
    /// Rows dropped for having fewer than two fields
    pub skipped_rows: usize,
}

impl LoadedRecords {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Load records from a CSV file on disk
pub fn load_records(path: &Path) -> Result<LoadedRecords> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open input file: {}", path.display()))?;
    let loaded = read_records(file)
        .with_context(|| format!("Failed to read input file: {}", path.display()))?;

    if loaded.skipped_rows > 0 {
        tracing::warn!(
            "Skipped {} malformed row(s) in {}: fewer than two fields",
            loaded.skipped_rows,
            path.display()
        );
    }

    Ok(loaded)
}

/// Parse records from any reader holding headerless CSV
pub fn read_records<R: Read>(reader: R) -> Result<LoadedRecords> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut loaded = LoadedRecords::default();

    for (idx, result) in reader.records().enumerate() {
        let row = result.with_context(|| format!("Failed to parse row {}", idx + 1))?;
        match Record::from_fields(row.iter()) {
            Some(record) => loaded.records.push(record),
            None => {
                tracing::debug!("Row {} has {} field(s), skipping", idx + 1, row.len());
                loaded.skipped_rows += 1;
            }
        }
    }

    Ok(loaded)
}

/// Count records per true label
pub fn label_distribution(records: &[Record]) -> HashMap<Label, usize> {
    let mut dist = HashMap::new();
    for record in records {
        *dist.entry(record.true_label.clone()).or_insert(0) += 1;
    }
    dist
}
