//! Class imbalance detection and rebalancing
//!
//! Provides:
//! - Imbalance checks on a table column or an encoded label vector
//! - SMOTE (synthetic interpolation oversampling)
//! - Random oversampling (row replication)
//! - An adaptive policy choosing between them by minority class size

mod policy;
mod random_sampling;
mod smote;

pub use policy::{apply_rebalance, RebalanceResult, RebalanceStrategy};
pub use random_sampling::RandomOverSampler;
pub use smote::SMOTE;

use crate::error::{PipelineError, Result};
use ndarray::{Array1, Array2};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Ratio below which a label distribution is considered imbalanced
pub const IMBALANCE_THRESHOLD: f64 = 0.5;

/// Result of resampling
#[derive(Debug, Clone)]
pub struct ResampleResult {
    /// Resampled features
    pub x: Array2<f64>,
    /// Resampled labels
    pub y: Array1<i64>,
    /// Number of generated samples per class, ascending class order
    pub n_synthetic: Vec<(i64, usize)>,
}

/// Trait for samplers
pub trait Sampler {
    /// Fit the sampler on data
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<i64>) -> Result<()>;

    /// Resample data
    fn resample(&self, x: &Array2<f64>, y: &Array1<i64>) -> Result<ResampleResult>;

    /// Fit and resample in one step
    fn fit_resample(&mut self, x: &Array2<f64>, y: &Array1<i64>) -> Result<ResampleResult> {
        self.fit(x, y)?;
        self.resample(x, y)
    }
}

/// Get class distribution, ordered by label
pub fn class_counts(y: &Array1<i64>) -> BTreeMap<i64, usize> {
    let mut counts = BTreeMap::new();
    for &label in y.iter() {
        *counts.entry(label).or_insert(0) += 1;
    }
    counts
}

/// Get row indices for each class, ordered by label
pub fn class_indices(y: &Array1<i64>) -> BTreeMap<i64, Vec<usize>> {
    let mut indices = BTreeMap::new();
    for (i, &label) in y.iter().enumerate() {
        indices.entry(label).or_insert_with(Vec::new).push(i);
    }
    indices
}

/// Target count per class when every class is raised to the majority count
pub(crate) fn majority_targets(y: &Array1<i64>) -> BTreeMap<i64, usize> {
    let counts = class_counts(y);
    let max_count = counts.values().copied().max().unwrap_or(0);
    counts.keys().map(|&class| (class, max_count)).collect()
}

pub(crate) fn check_aligned(x: &Array2<f64>, y: &Array1<i64>) -> Result<()> {
    if x.nrows() != y.len() {
        return Err(PipelineError::InputContract(format!(
            "features have {} rows but labels have {} entries",
            x.nrows(),
            y.len()
        )));
    }
    Ok(())
}

/// Label value → count, most frequent first (ties broken by label)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassDistribution {
    counts: Vec<(String, usize)>,
}

impl ClassDistribution {
    fn from_counts(counts: BTreeMap<String, usize>) -> Self {
        let mut counts: Vec<(String, usize)> = counts.into_iter().collect();
        counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        Self { counts }
    }

    /// Count for a label, if present
    pub fn get(&self, label: &str) -> Option<usize> {
        self.counts.iter().find(|(l, _)| l == label).map(|(_, c)| *c)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.counts.iter().map(|(l, c)| (l.as_str(), *c))
    }

    /// Number of distinct classes
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Total number of labelled rows
    pub fn total(&self) -> usize {
        self.counts.iter().map(|(_, c)| c).sum()
    }

    pub fn majority_count(&self) -> usize {
        self.counts.first().map(|(_, c)| *c).unwrap_or(0)
    }

    pub fn minority_count(&self) -> usize {
        self.counts.last().map(|(_, c)| *c).unwrap_or(0)
    }
}

impl std::fmt::Display for ClassDistribution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self.iter().map(|(l, c)| format!("{}: {}", l, c)).collect();
        write!(f, "{{{}}}", parts.join(", "))
    }
}

/// Outcome of an imbalance check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImbalanceVerdict {
    pub distribution: ClassDistribution,
    /// minority count / majority count, in (0, 1]
    pub ratio: f64,
    pub is_imbalanced: bool,
}

impl ImbalanceVerdict {
    fn from_distribution(distribution: ClassDistribution) -> Result<Self> {
        if distribution.is_empty() {
            return Err(PipelineError::InputContract(
                "cannot check imbalance of an empty label set".to_string(),
            ));
        }
        let ratio = distribution.minority_count() as f64 / distribution.majority_count() as f64;
        let is_imbalanced = ratio < IMBALANCE_THRESHOLD;

        info!(
            classes = distribution.len(),
            ratio,
            is_imbalanced,
            "Class distribution checked"
        );
        debug!(distribution = %distribution, "Class counts");

        Ok(Self {
            distribution,
            ratio,
            is_imbalanced,
        })
    }
}

/// Check the label distribution of `target` in a table.
///
/// Null values are ignored; the column must exist and hold at least one
/// non-null value.
pub fn check_imbalance(df: &DataFrame, target: &str) -> Result<ImbalanceVerdict> {
    let column = df.column(target).map_err(|_| {
        PipelineError::InputContract(format!("target column '{}' not found", target))
    })?;
    let labels = column
        .as_materialized_series()
        .cast(&DataType::String)?;

    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for value in labels.str()?.into_iter().flatten() {
        *counts.entry(value.to_string()).or_insert(0) += 1;
    }

    if counts.is_empty() {
        return Err(PipelineError::InputContract(format!(
            "target column '{}' has no non-null values",
            target
        )));
    }

    ImbalanceVerdict::from_distribution(ClassDistribution::from_counts(counts))
}

/// Check the distribution of an encoded label vector
pub fn check_label_imbalance(y: &Array1<i64>) -> Result<ImbalanceVerdict> {
    let counts = class_counts(y)
        .into_iter()
        .map(|(label, count)| (label.to_string(), count))
        .collect();
    ImbalanceVerdict::from_distribution(ClassDistribution::from_counts(counts))
}
