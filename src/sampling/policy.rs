//! Adaptive rebalancing policy
//!
//! Picks an oversampling strategy that cannot fail for small minority
//! classes: replication when interpolation is impossible, SMOTE with a reduced
//! neighbourhood for tiny classes, and default SMOTE otherwise.

use crate::error::Result;
use crate::sampling::smote::DEFAULT_K_NEIGHBORS;
use crate::sampling::{check_aligned, class_counts, RandomOverSampler, Sampler, SMOTE};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Seed used by every rebalancing strategy
pub const REBALANCE_SEED: u64 = 42;

/// Largest minority count for which the SMOTE neighbourhood is shrunk
const REDUCED_NEIGHBOR_LIMIT: usize = 6;

/// Strategy chosen for a label distribution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RebalanceStrategy {
    /// No labels at all
    Empty,
    /// Every class already has the majority count
    AlreadyBalanced,
    /// Duplicate existing rows
    Replication,
    /// SMOTE interpolation with the given neighbourhood size
    Synthetic { k_neighbors: usize },
}

impl RebalanceStrategy {
    /// Decision table keyed by the minority class count
    pub fn select(minority: usize, majority: usize) -> Self {
        if majority == 0 {
            RebalanceStrategy::Empty
        } else if minority == majority {
            RebalanceStrategy::AlreadyBalanced
        } else if minority < 2 {
            RebalanceStrategy::Replication
        } else if minority <= REDUCED_NEIGHBOR_LIMIT {
            RebalanceStrategy::Synthetic {
                k_neighbors: minority - 1,
            }
        } else {
            RebalanceStrategy::Synthetic {
                k_neighbors: DEFAULT_K_NEIGHBORS,
            }
        }
    }

    /// Whether the strategy leaves the data untouched
    pub fn is_noop(&self) -> bool {
        matches!(self, RebalanceStrategy::Empty | RebalanceStrategy::AlreadyBalanced)
    }
}

impl std::fmt::Display for RebalanceStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RebalanceStrategy::Empty => write!(f, "none (no labels)"),
            RebalanceStrategy::AlreadyBalanced => write!(f, "none (already balanced)"),
            RebalanceStrategy::Replication => write!(f, "random oversampling"),
            RebalanceStrategy::Synthetic { k_neighbors } => {
                write!(f, "SMOTE (k_neighbors={})", k_neighbors)
            }
        }
    }
}

/// Rebalanced features and labels
#[derive(Debug, Clone)]
pub struct RebalanceResult {
    pub x: Array2<f64>,
    pub y: Array1<i64>,
    pub strategy: RebalanceStrategy,
}

/// Raise every class to the majority count.
///
/// The input is never modified; a no-op returns copies of it.
pub fn apply_rebalance(x: &Array2<f64>, y: &Array1<i64>) -> Result<RebalanceResult> {
    check_aligned(x, y)?;

    let counts = class_counts(y);
    let minority = counts.values().copied().min().unwrap_or(0);
    let majority = counts.values().copied().max().unwrap_or(0);
    let strategy = RebalanceStrategy::select(minority, majority);

    let resampled = match strategy {
        RebalanceStrategy::Empty | RebalanceStrategy::AlreadyBalanced => None,
        RebalanceStrategy::Replication => Some(
            RandomOverSampler::new()
                .with_seed(REBALANCE_SEED)
                .fit_resample(x, y)?,
        ),
        RebalanceStrategy::Synthetic { k_neighbors } => Some(
            SMOTE::new()
                .with_k_neighbors(k_neighbors)
                .with_seed(REBALANCE_SEED)
                .fit_resample(x, y)?,
        ),
    };

    info!(
        strategy = %strategy,
        minority,
        majority,
        rows_before = y.len(),
        rows_after = resampled.as_ref().map_or(y.len(), |r| r.y.len()),
        "Rebalance applied"
    );

    Ok(match resampled {
        Some(r) => RebalanceResult {
            x: r.x,
            y: r.y,
            strategy,
        },
        None => RebalanceResult {
            x: x.clone(),
            y: y.clone(),
            strategy,
        },
    })
}
