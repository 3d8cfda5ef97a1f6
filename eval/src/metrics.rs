// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Correctness counts and derived statistics
//!
//! FAKE is the positive class throughout: a true positive is a fabricated
//! snippet the model flagged as FAKE.

use crate::datasets::{Label, Record};
use serde::{Deserialize, Serialize};

/// Running correct/incorrect counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
    pub correct: usize,
    pub incorrect: usize,
    /// Rows whose classification failed; already included in the two counts above
    pub failed: usize,
}

impl Tally {
    pub fn record(&mut self, is_correct: bool) {
        if is_correct {
            self.correct += 1;
        } else {
            self.incorrect += 1;
        }
    }

    pub fn total(&self) -> usize {
        self.correct + self.incorrect
    }

    /// correct / total, or 0.0 when nothing was scored
    pub fn accuracy(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        self.correct as f64 / total as f64
    }
}

/// Confusion matrix over REAL/FAKE pairs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    /// FAKE predicted as FAKE
    pub tp: usize,
    /// REAL predicted as REAL
    pub tn: usize,
    /// REAL predicted as FAKE
    pub fp: usize,
    /// FAKE predicted as REAL
    pub fn_: usize,
}

impl ConfusionMatrix {
    /// Build from aligned predicted and true labels.
    ///
    /// Pairs involving any label other than REAL/FAKE are not counted.
    pub fn from_pairs<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a Label, &'a Label)>,
    {
        let mut matrix = Self::default();

        for (pred, truth) in pairs {
            match (pred, truth) {
                (Label::Fake, Label::Fake) => matrix.tp += 1,
                (Label::Real, Label::Real) => matrix.tn += 1,
                (Label::Fake, Label::Real) => matrix.fp += 1,
                (Label::Real, Label::Fake) => matrix.fn_ += 1,
                _ => {}
            }
        }

        matrix
    }

    pub fn total(&self) -> usize {
        self.tp + self.tn + self.fp + self.fn_
    }

    /// Precision: TP / (TP + FP)
    pub fn precision(&self) -> f64 {
        ratio(self.tp, self.tp + self.fp)
    }

    /// Recall: TP / (TP + FN)
    pub fn recall(&self) -> f64 {
        ratio(self.tp, self.tp + self.fn_)
    }

    /// Specificity: TN / (TN + FP)
    pub fn specificity(&self) -> f64 {
        ratio(self.tn, self.tn + self.fp)
    }

    /// F1 Score: 2 * (Precision * Recall) / (Precision + Recall)
    pub fn f1_score(&self) -> f64 {
        let precision = self.precision();
        let recall = self.recall();
        let denom = precision + recall;
        if denom == 0.0 {
            return 0.0;
        }
        2.0 * precision * recall / denom
    }

    /// Format as an aligned two-by-two table
    pub fn format(&self) -> String {
        format!(
            "                Predicted FAKE  Predicted REAL\n\
             Actual FAKE     {:>14}  {:>14}\n\
             Actual REAL     {:>14}  {:>14}\n",
            self.tp, self.fn_, self.fp, self.tn,
        )
    }
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        return 0.0;
    }
    numerator as f64 / denominator as f64
}

/// Aggregate numbers consumed by the chart, the report and the run summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportStatistics {
    pub total_records: usize,
    pub real_count: usize,
    pub fake_count: usize,
    /// Records whose true label is neither REAL nor FAKE
    pub other_count: usize,
    pub skipped_rows: usize,
    pub correct: usize,
    pub incorrect: usize,
    pub failed: usize,
    pub accuracy: f64,
    pub confusion: ConfusionMatrix,
}

impl ReportStatistics {
    /// Derive statistics from the records, their predicted labels and the tally.
    ///
    /// `predicted` is aligned with `records`. Pairs outside REAL/FAKE are
    /// left out of the confusion matrix.
    pub fn compute(
        records: &[Record],
        predicted: &[Label],
        tally: &Tally,
        skipped_rows: usize,
    ) -> Self {
        let real_count = records.iter().filter(|r| r.true_label == Label::Real).count();
        let fake_count = records.iter().filter(|r| r.true_label == Label::Fake).count();

        let confusion = ConfusionMatrix::from_pairs(
            predicted.iter().zip(records.iter().map(|r| &r.true_label)),
        );

        Self {
            total_records: records.len(),
            real_count,
            fake_count,
            other_count: records.len() - real_count - fake_count,
            skipped_rows,
            correct: tally.correct,
            incorrect: tally.incorrect,
            failed: tally.failed,
            accuracy: tally.accuracy(),
            confusion,
        }
    }

    /// Accuracy as a percentage
    pub fn accuracy_percent(&self) -> f64 {
        self.accuracy * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(text: &str, label: Label) -> Record {
        Record {
            text: text.to_string(),
            true_label: label,
        }
    }

    #[test]
    fn test_tally_accuracy() {
        let mut tally = Tally::default();
        tally.record(true);
        tally.record(true);
        tally.record(false);

        assert_eq!(tally.total(), 3);
        assert!((tally.accuracy() - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_tally_accuracy_is_zero() {
        let tally = Tally::default();
        assert_eq!(tally.accuracy(), 0.0);
    }

    #[test]
    fn test_accuracy_bounds() {
        for correct in 0..5 {
            for incorrect in 0..5 {
                let tally = Tally { correct, incorrect, failed: 0 };
                let accuracy = tally.accuracy();
                assert!((0.0..=1.0).contains(&accuracy));
                if correct + incorrect > 0 {
                    let expected = correct as f64 / (correct + incorrect) as f64;
                    assert!((accuracy - expected).abs() < 1e-12);
                }
            }
        }
    }

    #[test]
    fn test_confusion_matrix_perfect() {
        let predicted = [Label::Fake, Label::Fake, Label::Real, Label::Real];
        let truth = [Label::Fake, Label::Fake, Label::Real, Label::Real];

        let cm = ConfusionMatrix::from_pairs(predicted.iter().zip(truth.iter()));

        assert_eq!(cm.tp, 2);
        assert_eq!(cm.tn, 2);
        assert_eq!(cm.fp, 0);
        assert_eq!(cm.fn_, 0);
        assert!((cm.f1_score() - 1.0).abs() < 1e-6);
        assert!((cm.specificity() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_confusion_matrix_mixed() {
        let predicted = [Label::Fake, Label::Real, Label::Fake, Label::Real];
        let truth = [Label::Fake, Label::Fake, Label::Real, Label::Real];

        let cm = ConfusionMatrix::from_pairs(predicted.iter().zip(truth.iter()));

        assert_eq!((cm.tp, cm.fn_, cm.fp, cm.tn), (1, 1, 1, 1));
        assert!((cm.precision() - 0.5).abs() < 1e-6);
        assert!((cm.recall() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_confusion_matrix_ignores_other_labels() {
        let predicted = [Label::Other("ERROR".to_string()), Label::Real];
        let truth = [Label::Fake, Label::Other("SATIRE".to_string())];

        let cm = ConfusionMatrix::from_pairs(predicted.iter().zip(truth.iter()));
        assert_eq!(cm.total(), 0);
        assert_eq!(cm.f1_score(), 0.0);
    }

    #[test]
    fn test_report_statistics() {
        let records = vec![
            record("a", Label::Real),
            record("b", Label::Fake),
            record("c", Label::Fake),
            record("d", Label::Other("MAYBE".to_string())),
        ];
        let predicted = vec![Label::Real, Label::Fake, Label::Real, Label::Real];
        let tally = Tally { correct: 2, incorrect: 2, failed: 1 };

        let stats = ReportStatistics::compute(&records, &predicted, &tally, 3);

        assert_eq!(stats.total_records, 4);
        assert_eq!(stats.real_count, 1);
        assert_eq!(stats.fake_count, 2);
        assert_eq!(stats.other_count, 1);
        assert_eq!(stats.skipped_rows, 3);
        assert_eq!(stats.failed, 1);
        assert!((stats.accuracy_percent() - 50.0).abs() < 1e-9);
        assert_eq!(stats.confusion.tp, 1);
        assert_eq!(stats.confusion.fn_, 1);
        assert_eq!(stats.confusion.tn, 1);
    }

    #[test]
    fn test_confusion_matrix_format() {
        let cm = ConfusionMatrix { tp: 3, tn: 4, fp: 1, fn_: 2 };
        let formatted = cm.format();

        assert!(formatted.contains("Actual FAKE"));
        assert!(formatted.contains("Predicted REAL"));
        assert_eq!(formatted.lines().count(), 3);
    }
}
