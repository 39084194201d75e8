//! Classification metrics

use super::models::Scores;
use crate::error::{PipelineError, Result};
use ndarray::{Array1, ArrayView1};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

pub const ACCURACY: &str = "Accuracy";
pub const PRECISION: &str = "Precision";
pub const RECALL: &str = "Recall";
pub const F1_SCORE: &str = "F1 Score";
pub const CONFUSION_MATRIX: &str = "confusion_matrix";
pub const ROC_AUC: &str = "roc_auc";
pub const ROC_AUC_OVR_WEIGHTED: &str = "roc_auc_ovr_weighted";

/// Tolerance for probability rows summing to one
const PROBA_SUM_TOLERANCE: f64 = 1e-6;

/// A single metric value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    Scalar(f64),
    Matrix(Vec<Vec<u64>>),
}

impl MetricValue {
    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            MetricValue::Scalar(v) => Some(*v),
            MetricValue::Matrix(_) => None,
        }
    }

    pub fn as_matrix(&self) -> Option<&Vec<Vec<u64>>> {
        match self {
            MetricValue::Matrix(m) => Some(m),
            MetricValue::Scalar(_) => None,
        }
    }
}

impl std::fmt::Display for MetricValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MetricValue::Scalar(v) => write!(f, "{:.4}", v),
            MetricValue::Matrix(rows) => {
                let rendered: Vec<String> = rows
                    .iter()
                    .map(|r| {
                        let cells: Vec<String> = r.iter().map(|c| c.to_string()).collect();
                        format!("[{}]", cells.join(", "))
                    })
                    .collect();
                write!(f, "[{}]", rendered.join(", "))
            }
        }
    }
}

fn check_lengths(y_true: &Array1<i64>, other: usize) -> Result<()> {
    if y_true.len() != other {
        return Err(PipelineError::Metric(format!(
            "y_true has {} entries but predictions have {}",
            y_true.len(),
            other
        )));
    }
    if y_true.is_empty() {
        return Err(PipelineError::Metric("no samples to score".to_string()));
    }
    Ok(())
}

/// Sorted union of the labels in both vectors
pub fn unique_labels(y_true: &Array1<i64>, y_pred: &Array1<i64>) -> Vec<i64> {
    let mut labels: Vec<i64> = y_true.iter().chain(y_pred.iter()).copied().collect();
    labels.sort_unstable();
    labels.dedup();
    labels
}

/// Fraction of exact matches
pub fn accuracy(y_true: &Array1<i64>, y_pred: &Array1<i64>) -> Result<f64> {
    check_lengths(y_true, y_pred.len())?;
    let correct = y_true
        .iter()
        .zip(y_pred.iter())
        .filter(|(t, p)| t == p)
        .count();
    Ok(correct as f64 / y_true.len() as f64)
}

/// Support-weighted precision, recall and F1
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightedScores {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

/// Weighted precision/recall/F1. A class with no predicted (or no true)
/// members contributes 0 to the undefined ratio instead of failing.
pub fn precision_recall_f1(y_true: &Array1<i64>, y_pred: &Array1<i64>) -> Result<WeightedScores> {
    check_lengths(y_true, y_pred.len())?;
    let labels = unique_labels(y_true, y_pred);

    let mut tp: BTreeMap<i64, f64> = BTreeMap::new();
    let mut predicted: BTreeMap<i64, f64> = BTreeMap::new();
    let mut support: BTreeMap<i64, f64> = BTreeMap::new();
    for (&t, &p) in y_true.iter().zip(y_pred.iter()) {
        *support.entry(t).or_insert(0.0) += 1.0;
        *predicted.entry(p).or_insert(0.0) += 1.0;
        if t == p {
            *tp.entry(t).or_insert(0.0) += 1.0;
        }
    }

    let total = y_true.len() as f64;
    let mut scores = WeightedScores {
        precision: 0.0,
        recall: 0.0,
        f1: 0.0,
    };

    for label in labels {
        let tp = tp.get(&label).copied().unwrap_or(0.0);
        let pred = predicted.get(&label).copied().unwrap_or(0.0);
        let sup = support.get(&label).copied().unwrap_or(0.0);

        let precision = if pred > 0.0 { tp / pred } else { 0.0 };
        let recall = if sup > 0.0 { tp / sup } else { 0.0 };
        let f1 = if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        };

        let weight = sup / total;
        scores.precision += weight * precision;
        scores.recall += weight * recall;
        scores.f1 += weight * f1;
    }

    Ok(scores)
}

/// Confusion matrix with rows = true labels and columns = predicted labels,
/// both ordered by the sorted union of labels.
pub fn confusion_matrix(y_true: &Array1<i64>, y_pred: &Array1<i64>) -> Result<(Vec<i64>, Vec<Vec<u64>>)> {
    check_lengths(y_true, y_pred.len())?;
    let labels = unique_labels(y_true, y_pred);
    let mut matrix = vec![vec![0u64; labels.len()]; labels.len()];
    for (t, p) in y_true.iter().zip(y_pred.iter()) {
        let i = labels.binary_search(t).map_err(|_| PipelineError::Metric("unknown label".into()))?;
        let j = labels.binary_search(p).map_err(|_| PipelineError::Metric("unknown label".into()))?;
        matrix[i][j] += 1;
    }
    Ok((labels, matrix))
}

/// Area under the ROC curve for a binary problem, via the rank statistic
/// with average ranks for tied scores.
pub fn roc_auc_binary(is_positive: &[bool], scores: ArrayView1<f64>) -> Result<f64> {
    if is_positive.len() != scores.len() {
        return Err(PipelineError::Metric(format!(
            "{} labels but {} scores",
            is_positive.len(),
            scores.len()
        )));
    }
    let n_pos = is_positive.iter().filter(|&&p| p).count();
    let n_neg = is_positive.len() - n_pos;
    if n_pos == 0 || n_neg == 0 {
        return Err(PipelineError::Metric(
            "only one class present in y_true; ROC AUC is undefined".to_string(),
        ));
    }
    if scores.iter().any(|s| !s.is_finite()) {
        return Err(PipelineError::Metric("scores contain non-finite values".to_string()));
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[a].total_cmp(&scores[b]));

    let mut rank_sum_pos = 0.0;
    let mut start = 0;
    while start < order.len() {
        let mut end = start;
        while end + 1 < order.len() && scores[order[end + 1]] == scores[order[start]] {
            end += 1;
        }
        // ranks are 1-based; ties share the mean rank
        let avg_rank = (start + end) as f64 / 2.0 + 1.0;
        for &idx in &order[start..=end] {
            if is_positive[idx] {
                rank_sum_pos += avg_rank;
            }
        }
        start = end + 1;
    }

    let n_pos = n_pos as f64;
    let n_neg = n_neg as f64;
    Ok((rank_sum_pos - n_pos * (n_pos + 1.0) / 2.0) / (n_pos * n_neg))
}

/// ROC-AUC from model scores.
///
/// Two model classes: the positive (larger) class column of probabilities, or
/// the single decision column. More classes: one-vs-rest AUC per class
/// weighted by prevalence, which requires probability rows summing to one and
/// every model class present in `y_true`.
pub fn roc_auc(y_true: &Array1<i64>, scores: &Scores, classes: &[i64]) -> Result<(&'static str, f64)> {
    let matrix = scores.matrix();
    check_lengths(y_true, matrix.nrows())?;

    if let Some(unknown) = y_true.iter().find(|t| !classes.contains(t)) {
        return Err(PipelineError::Metric(format!(
            "label {} was not seen during training",
            unknown
        )));
    }

    if classes.len() == 2 {
        let column = match scores {
            Scores::Probabilities(m) if m.ncols() == 2 => m.column(1),
            Scores::Decision(m) if m.ncols() == 1 => m.column(0),
            _ => {
                return Err(PipelineError::Metric(format!(
                    "binary scores have unexpected shape {:?}",
                    matrix.dim()
                )))
            }
        };
        let positive: Vec<bool> = y_true.iter().map(|&t| t == classes[1]).collect();
        return Ok((ROC_AUC, roc_auc_binary(&positive, column)?));
    }

    let proba = match scores {
        Scores::Probabilities(m) => m,
        Scores::Decision(_) => {
            return Err(PipelineError::Metric(
                "multiclass ROC AUC needs probability estimates, not decision scores".to_string(),
            ))
        }
    };
    if proba.ncols() != classes.len() {
        return Err(PipelineError::Metric(format!(
            "{} score columns for {} classes",
            proba.ncols(),
            classes.len()
        )));
    }
    if proba
        .rows()
        .into_iter()
        .any(|row| (row.sum() - 1.0).abs() > PROBA_SUM_TOLERANCE)
    {
        return Err(PipelineError::Metric(
            "probability rows do not sum to 1".to_string(),
        ));
    }

    let present: Vec<i64> = {
        let mut labels = y_true.to_vec();
        labels.sort_unstable();
        labels.dedup();
        labels
    };
    if present.len() != classes.len() {
        return Err(PipelineError::Metric(format!(
            "y_true has {} classes but scores have {} columns",
            present.len(),
            classes.len()
        )));
    }

    let total = y_true.len() as f64;
    let mut weighted = 0.0;
    for (k, &class) in classes.iter().enumerate() {
        let positive: Vec<bool> = y_true.iter().map(|&t| t == class).collect();
        let prevalence = positive.iter().filter(|&&p| p).count() as f64 / total;
        weighted += prevalence * roc_auc_binary(&positive, proba.column(k))?;
    }
    Ok((ROC_AUC_OVR_WEIGHTED, weighted))
}

/// Base metrics, plus confusion matrix and ROC-AUC when `extended`.
/// Extended metrics that cannot be computed are left out.
pub fn evaluate(
    y_true: &Array1<i64>,
    y_pred: &Array1<i64>,
    scores: Option<&Scores>,
    classes: &[i64],
    extended: bool,
) -> Result<BTreeMap<String, MetricValue>> {
    let mut metrics = BTreeMap::new();
    let weighted = precision_recall_f1(y_true, y_pred)?;

    metrics.insert(ACCURACY.to_string(), MetricValue::Scalar(accuracy(y_true, y_pred)?));
    metrics.insert(PRECISION.to_string(), MetricValue::Scalar(weighted.precision));
    metrics.insert(RECALL.to_string(), MetricValue::Scalar(weighted.recall));
    metrics.insert(F1_SCORE.to_string(), MetricValue::Scalar(weighted.f1));

    if !extended {
        return Ok(metrics);
    }

    match confusion_matrix(y_true, y_pred) {
        Ok((_, matrix)) => {
            metrics.insert(CONFUSION_MATRIX.to_string(), MetricValue::Matrix(matrix));
        }
        Err(e) => debug!(error = %e, "Could not compute confusion matrix"),
    }

    match scores {
        Some(scores) => match roc_auc(y_true, scores, classes) {
            Ok((key, value)) => {
                metrics.insert(key.to_string(), MetricValue::Scalar(value));
            }
            Err(e) => debug!(error = %e, "Could not compute ROC AUC"),
        },
        None => debug!("Model exposes no scores; ROC AUC skipped"),
    }

    Ok(metrics)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn test_accuracy() {
        let y_true = array![0i64, 1, 1, 0];
        let y_pred = array![0i64, 1, 0, 0];
        assert_abs_diff_eq!(accuracy(&y_true, &y_pred).unwrap(), 0.75);
    }

    #[test]
    fn test_weighted_scores() {
        let y_true = array![0i64, 0, 0, 1];
        let y_pred = array![0i64, 0, 1, 1];
        let s = precision_recall_f1(&y_true, &y_pred).unwrap();
        // class 0: p=1, r=2/3; class 1: p=1/2, r=1
        assert_abs_diff_eq!(s.precision, 0.75 * 1.0 + 0.25 * 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(s.recall, 0.75, epsilon = 1e-12);
        let f1_0 = 2.0 * (2.0 / 3.0) / (1.0 + 2.0 / 3.0);
        let f1_1 = 2.0 * 0.5 / 1.5;
        assert_abs_diff_eq!(s.f1, 0.75 * f1_0 + 0.25 * f1_1, epsilon = 1e-12);
    }

    #[test]
    fn test_zero_division_is_zero() {
        // class 1 never predicted
        let y_true = array![0i64, 1, 1];
        let y_pred = array![0i64, 0, 0];
        let s = precision_recall_f1(&y_true, &y_pred).unwrap();
        assert_abs_diff_eq!(s.precision, (1.0 / 3.0) * (1.0 / 3.0), epsilon = 1e-12);
        assert!(s.f1.is_finite());
    }

    #[test]
    fn test_confusion_matrix() {
        let y_true = array![2i64, 0, 2, 2, 0, 1];
        let y_pred = array![0i64, 0, 2, 2, 0, 2];
        let (labels, m) = confusion_matrix(&y_true, &y_pred).unwrap();
        assert_eq!(labels, vec![0, 1, 2]);
        assert_eq!(m, vec![vec![2, 0, 0], vec![0, 0, 1], vec![1, 0, 2]]);
    }

    #[test]
    fn test_roc_auc_binary() {
        let positive = [false, false, true, true];
        let scores = array![0.1, 0.4, 0.35, 0.8];
        let auc = roc_auc_binary(&positive, scores.view()).unwrap();
        assert_abs_diff_eq!(auc, 0.75, epsilon = 1e-12);
    }

    #[test]
    fn test_roc_auc_ties() {
        let positive = [false, true];
        let scores = array![0.5, 0.5];
        assert_abs_diff_eq!(roc_auc_binary(&positive, scores.view()).unwrap(), 0.5);
    }

    #[test]
    fn test_roc_auc_single_class_fails() {
        let positive = [true, true];
        assert!(roc_auc_binary(&positive, array![0.1, 0.2].view()).is_err());
    }

    #[test]
    fn test_binary_decision_scores() {
        let y = array![3i64, 3, 8, 8];
        let scores = Scores::Decision(array![[-2.0], [-1.0], [1.0], [0.5]]);
        let (key, auc) = roc_auc(&y, &scores, &[3, 8]).unwrap();
        assert_eq!(key, ROC_AUC);
        assert_abs_diff_eq!(auc, 1.0);
    }

    #[test]
    fn test_multiclass_requires_probabilities() {
        let y = array![0i64, 1, 2];
        let decision = Scores::Decision(array![[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]]);
        assert!(roc_auc(&y, &decision, &[0, 1, 2]).is_err());

        let proba = Scores::Probabilities(array![[0.8, 0.1, 0.1], [0.1, 0.8, 0.1], [0.1, 0.1, 0.8]]);
        let (key, auc) = roc_auc(&y, &proba, &[0, 1, 2]).unwrap();
        assert_eq!(key, ROC_AUC_OVR_WEIGHTED);
        assert_abs_diff_eq!(auc, 1.0);
    }

    #[test]
    fn test_evaluate_omits_failed_extended_metrics() {
        let y_true = array![0i64, 0, 0];
        let y_pred = array![0i64, 0, 1];
        let scores = Scores::Probabilities(array![[0.9, 0.1], [0.8, 0.2], [0.4, 0.6]]);
        let metrics = evaluate(&y_true, &y_pred, Some(&scores), &[0, 1], true).unwrap();
        assert!(metrics.contains_key(CONFUSION_MATRIX));
        assert!(!metrics.contains_key(ROC_AUC));
        assert_eq!(metrics.len(), 5);
    }

    #[test]
    fn test_metric_value_serializes_untagged() {
        let json = serde_json::to_string(&MetricValue::Matrix(vec![vec![1, 0], vec![0, 2]])).unwrap();
        assert_eq!(json, "[[1,0],[0,2]]");
        assert_eq!(serde_json::to_string(&MetricValue::Scalar(0.5)).unwrap(), "0.5");
    }
}
