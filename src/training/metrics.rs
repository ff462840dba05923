//! Classification metrics
//!
//! Precision, recall and F1 are support-weighted averages over every label
//! that appears in either the true or the predicted labels. A class that is
//! never predicted contributes a precision of 0.

use crate::error::{PipelineError, Result};
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Held-out evaluation of the selected model
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvaluationMetrics {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
}

impl EvaluationMetrics {
    pub fn compute(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Result<Self> {
        check_lengths(y_true, y_pred)?;
        let (precision, recall, f1_score) = weighted_precision_recall_f1(y_true, y_pred);
        Ok(Self {
            accuracy: accuracy(y_true, y_pred),
            precision,
            recall,
            f1_score,
        })
    }

    /// Metric name to value, as logged to the tracker
    pub fn to_map(&self) -> BTreeMap<String, f64> {
        BTreeMap::from([
            ("accuracy".to_string(), self.accuracy),
            ("precision".to_string(), self.precision),
            ("recall".to_string(), self.recall),
            ("f1_score".to_string(), self.f1_score),
        ])
    }
}

fn check_lengths(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Result<()> {
    if y_true.is_empty() {
        return Err(PipelineError::TrainingError("cannot score an empty label set".into()));
    }
    if y_true.len() != y_pred.len() {
        return Err(PipelineError::TrainingError(format!(
            "{} true labels but {} predictions",
            y_true.len(),
            y_pred.len()
        )));
    }
    Ok(())
}

pub fn accuracy(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64 {
    if y_true.is_empty() {
        return 0.0;
    }
    let correct = y_true
        .iter()
        .zip(y_pred.iter())
        .filter(|(t, p)| t == p)
        .count();
    correct as f64 / y_true.len() as f64
}

#[derive(Debug, Default, Clone, Copy)]
struct ClassCounts {
    tp: usize,
    fp: usize,
    fn_: usize,
    support: usize,
}

fn label_index(labels: &[f64], value: f64) -> usize {
    labels.partition_point(|l| l.total_cmp(&value).is_lt())
}

fn class_counts(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Vec<ClassCounts> {
    // `+ 0.0` folds -0.0 into 0.0
    let mut labels: Vec<f64> = y_true.iter().chain(y_pred.iter()).map(|&v| v + 0.0).collect();
    labels.sort_by(f64::total_cmp);
    labels.dedup();

    let mut counts = vec![ClassCounts::default(); labels.len()];
    for (&t, &p) in y_true.iter().zip(y_pred.iter()) {
        let ti = label_index(&labels, t + 0.0);
        let pi = label_index(&labels, p + 0.0);
        counts[ti].support += 1;
        if ti == pi {
            counts[ti].tp += 1;
        } else {
            counts[pi].fp += 1;
            counts[ti].fn_ += 1;
        }
    }
    counts
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

/// Support-weighted (precision, recall, f1)
pub fn weighted_precision_recall_f1(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> (f64, f64, f64) {
    let counts = class_counts(y_true, y_pred);
    let total: usize = counts.iter().map(|c| c.support).sum();
    if total == 0 {
        return (0.0, 0.0, 0.0);
    }

    let (mut precision, mut recall, mut f1) = (0.0, 0.0, 0.0);
    for c in &counts {
        let w = c.support as f64;
        let p = ratio(c.tp, c.tp + c.fp);
        let r = ratio(c.tp, c.tp + c.fn_);
        let f = if p + r > 0.0 { 2.0 * p * r / (p + r) } else { 0.0 };
        precision += w * p;
        recall += w * r;
        f1 += w * f;
    }
    let total = total as f64;
    ((precision / total).min(1.0), (recall / total).min(1.0), (f1 / total).min(1.0))
}

pub fn precision_weighted(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64 {
    weighted_precision_recall_f1(y_true, y_pred).0
}

pub fn recall_weighted(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64 {
    weighted_precision_recall_f1(y_true, y_pred).1
}

pub fn f1_weighted(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64 {
    weighted_precision_recall_f1(y_true, y_pred).2
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arr(v: &[f64]) -> Array1<f64> {
        Array1::from_vec(v.to_vec())
    }

    #[test]
    fn test_perfect_prediction() {
        let y = arr(&[0.0, 1.0, 1.0, 0.0, 2.0]);
        let m = EvaluationMetrics::compute(&y, &y).unwrap();
        assert_eq!(m.accuracy, 1.0);
        assert_eq!(m.precision, 1.0);
        assert_eq!(m.recall, 1.0);
        assert_eq!(m.f1_score, 1.0);
    }

    #[test]
    fn test_constant_label_majority_prediction() {
        let y = arr(&[1.0; 20]);
        let m = EvaluationMetrics::compute(&y, &y.clone()).unwrap();
        assert_eq!(m.to_map().values().copied().collect::<Vec<_>>(), vec![1.0; 4]);
    }

    #[test]
    fn test_weighted_against_hand_computed() {
        // class 0: tp=2 fp=1 fn=1 support=3 -> p=2/3 r=2/3
        // class 1: tp=1 fp=1 fn=1 support=2 -> p=1/2 r=1/2
        let y_true = arr(&[0.0, 0.0, 0.0, 1.0, 1.0]);
        let y_pred = arr(&[0.0, 0.0, 1.0, 0.0, 1.0]);
        let (p, r, f) = weighted_precision_recall_f1(&y_true, &y_pred);
        let expected = 0.6 * (2.0 / 3.0) + 0.4 * 0.5;
        assert!((p - expected).abs() < 1e-12);
        assert!((r - expected).abs() < 1e-12);
        assert!((f - expected).abs() < 1e-12);
        assert!((accuracy(&y_true, &y_pred) - 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_unpredicted_class_has_zero_precision() {
        let y_true = arr(&[0.0, 0.0, 1.0, 1.0]);
        let y_pred = arr(&[0.0, 0.0, 0.0, 0.0]);
        let (p, r, _) = weighted_precision_recall_f1(&y_true, &y_pred);
        // class 0 precision 0.5 with weight 0.5, class 1 precision 0
        assert!((p - 0.25).abs() < 1e-12);
        assert!((r - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_metrics_bounded() {
        let y_true = arr(&[0.0, 1.0, 2.0, 1.0, 0.0, 2.0, 2.0]);
        let y_pred = arr(&[2.0, 1.0, 0.0, 0.0, 0.0, 2.0, 1.0]);
        let m = EvaluationMetrics::compute(&y_true, &y_pred).unwrap();
        for v in m.to_map().values() {
            assert!((0.0..=1.0).contains(v));
        }
    }

    #[test]
    fn test_length_mismatch_rejected() {
        let err = EvaluationMetrics::compute(&arr(&[0.0, 1.0]), &arr(&[0.0])).unwrap_err();
        assert!(matches!(err, PipelineError::TrainingError(_)));
        assert!(EvaluationMetrics::compute(&arr(&[]), &arr(&[])).is_err());
    }
}
