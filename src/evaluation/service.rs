//! Metric computation over predicted vs true class indices.

use crate::features::CategoryEncoder;
use crate::training::domain::Classifier;

use super::domain::{ClassMetrics, EvalReport};

/// Fraction of exact matches. Empty input scores 0.
pub fn accuracy(y_true: &[usize], y_pred: &[usize]) -> f64 {
    if y_true.is_empty() {
        return 0.0;
    }
    let hits = y_true.iter().zip(y_pred).filter(|(t, p)| t == p).count();
    hits as f64 / y_true.len() as f64
}

/// Micro-averaged F1. For single-label multi-class data every miss is one
/// false positive and one false negative, so this equals accuracy.
pub fn f1_micro(y_true: &[usize], y_pred: &[usize]) -> f64 {
    let tp = y_true.iter().zip(y_pred).filter(|(t, p)| t == p).count() as f64;
    let misses = y_true.len() as f64 - tp;
    let denom = 2.0 * tp + 2.0 * misses;
    if denom == 0.0 {
        0.0
    } else {
        2.0 * tp / denom
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

/// Full report over the labels present in either `y_true` or `y_pred`.
pub fn classification_report(
    y_true: &[usize],
    y_pred: &[usize],
    labels: &CategoryEncoder,
) -> EvalReport {
    let mut present: Vec<usize> = y_true.iter().chain(y_pred).copied().collect();
    present.sort_unstable();
    present.dedup();

    let per_class: Vec<ClassMetrics> = present
        .iter()
        .map(|&class| {
            let tp = y_true
                .iter()
                .zip(y_pred)
                .filter(|&(&t, &p)| t == class && p == class)
                .count();
            let predicted = y_pred.iter().filter(|&&p| p == class).count();
            let support = y_true.iter().filter(|&&t| t == class).count();
            let precision = ratio(tp, predicted);
            let recall = ratio(tp, support);
            let f1 = if precision + recall == 0.0 {
                0.0
            } else {
                2.0 * precision * recall / (precision + recall)
            };
            ClassMetrics {
                label: labels
                    .label(class)
                    .map_or_else(|| format!("class {class}"), str::to_string),
                precision,
                recall,
                f1,
                support,
            }
        })
        .collect();

    let f1_macro = if per_class.is_empty() {
        0.0
    } else {
        per_class.iter().map(|c| c.f1).sum::<f64>() / per_class.len() as f64
    };

    EvalReport {
        accuracy: accuracy(y_true, y_pred),
        f1_micro: f1_micro(y_true, y_pred),
        f1_macro,
        per_class,
        support: y_true.len(),
    }
}

/// Predict every row and report against the truth.
pub fn evaluate<C: Classifier>(
    model: &C,
    x: &[Vec<f64>],
    y: &[usize],
    labels: &CategoryEncoder,
) -> EvalReport {
    let predicted: Vec<usize> = x.iter().map(|row| model.predict(row)).collect();
    classification_report(y, &predicted, labels)
}
