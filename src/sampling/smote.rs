//! SMOTE (Synthetic Minority Over-sampling Technique)

use crate::error::{PipelineError, Result};
use crate::sampling::{check_aligned, class_counts, class_indices, majority_targets, ResampleResult, Sampler};
use ndarray::{Array1, Array2, ArrayView1};
use rand::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Default number of nearest neighbours
pub const DEFAULT_K_NEIGHBORS: usize = 5;

/// SMOTE sampler raising every class to the majority count
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SMOTE {
    /// Number of nearest neighbours
    k_neighbors: usize,
    /// Random seed
    seed: Option<u64>,
    /// Target samples per class
    target_counts: Option<BTreeMap<i64, usize>>,
}

impl SMOTE {
    /// Create new SMOTE sampler
    pub fn new() -> Self {
        Self {
            k_neighbors: DEFAULT_K_NEIGHBORS,
            seed: None,
            target_counts: None,
        }
    }

    /// Set number of neighbours
    pub fn with_k_neighbors(mut self, k: usize) -> Self {
        self.k_neighbors = k.max(1);
        self
    }

    /// Set random seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    fn squared_distance(a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
        a.iter().zip(b.iter()).map(|(ai, bi)| (ai - bi).powi(2)).sum()
    }

    /// k nearest same-class neighbours of each sample, self excluded.
    /// Ties are broken by row position so the ordering is stable.
    fn neighbor_table(&self, samples: &Array2<f64>, k: usize) -> Vec<Vec<usize>> {
        let n = samples.nrows();
        (0..n)
            .map(|i| {
                let mut dists: Vec<(f64, usize)> = (0..n)
                    .filter(|&j| j != i)
                    .map(|j| (Self::squared_distance(samples.row(i), samples.row(j)), j))
                    .collect();
                dists.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
                dists.into_iter().take(k).map(|(_, j)| j).collect()
            })
            .collect()
    }
}

impl Default for SMOTE {
    fn default() -> Self {
        Self::new()
    }
}

impl Sampler for SMOTE {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<i64>) -> Result<()> {
        check_aligned(x, y)?;
        let counts = class_counts(y);
        let targets = majority_targets(y);

        for (class, &count) in &counts {
            let deficit = targets[class] > count;
            if deficit && count <= self.k_neighbors {
                return Err(PipelineError::InputContract(format!(
                    "SMOTE needs more than k_neighbors={} samples in class {}, found {}",
                    self.k_neighbors, class, count
                )));
            }
        }

        self.target_counts = Some(targets);
        Ok(())
    }

    fn resample(&self, x: &Array2<f64>, y: &Array1<i64>) -> Result<ResampleResult> {
        let targets = self
            .target_counts
            .as_ref()
            .ok_or(PipelineError::ModelNotFitted)?;
        check_aligned(x, y)?;

        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let indices = class_indices(y);
        let n_features = x.ncols();

        // Collect only synthetic samples (original data reused from x directly)
        let mut synthetic_x: Vec<f64> = Vec::new();
        let mut synthetic_y: Vec<i64> = Vec::new();
        let mut n_synthetic = Vec::new();

        for (&class, class_idx) in &indices {
            let target_count = targets.get(&class).copied().unwrap_or(0);
            let n_to_generate = target_count.saturating_sub(class_idx.len());

            if n_to_generate == 0 {
                n_synthetic.push((class, 0));
                continue;
            }

            let class_samples = x.select(ndarray::Axis(0), class_idx);
            let neighbors = self.neighbor_table(&class_samples, self.k_neighbors);

            for _ in 0..n_to_generate {
                let idx = rng.gen_range(0..class_samples.nrows());
                let neighbor_idx = neighbors[idx][rng.gen_range(0..neighbors[idx].len())];
                let gap: f64 = rng.gen();

                let sample = class_samples.row(idx);
                let neighbor = class_samples.row(neighbor_idx);
                synthetic_x.extend(
                    sample
                        .iter()
                        .zip(neighbor.iter())
                        .map(|(&p, &n)| p + gap * (n - p)),
                );
                synthetic_y.push(class);
            }

            n_synthetic.push((class, n_to_generate));
        }

        // Build result: original rows + synthetic rows
        let n_original = x.nrows();
        let n_total = n_original + synthetic_y.len();
        let result_x = Array2::from_shape_fn((n_total, n_features), |(i, j)| {
            if i < n_original {
                x[[i, j]]
            } else {
                synthetic_x[(i - n_original) * n_features + j]
            }
        });

        let mut all_y: Vec<i64> = y.to_vec();
        all_y.extend_from_slice(&synthetic_y);

        Ok(ResampleResult {
            x: result_x,
            y: Array1::from_vec(all_y),
            n_synthetic,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_imbalanced_data() -> (Array2<f64>, Array1<i64>) {
        // 20 majority samples around the origin, 5 minority around (10, 10)
        let mut data = Vec::new();
        let mut labels = Vec::new();

        for i in 0..20 {
            data.push((i % 5) as f64);
            data.push((i / 5) as f64);
            labels.push(0i64);
        }

        for i in 0..5 {
            data.push(10.0 + (i % 3) as f64);
            data.push(10.0 + (i / 3) as f64);
            labels.push(1i64);
        }

        let x = Array2::from_shape_vec((25, 2), data).unwrap();
        let y = Array1::from_vec(labels);

        (x, y)
    }

    #[test]
    fn test_smote_balances_classes() {
        let (x, y) = create_imbalanced_data();

        let mut smote = SMOTE::new().with_k_neighbors(3).with_seed(42);
        let result = smote.fit_resample(&x, &y).unwrap();

        let counts = class_counts(&result.y);
        assert_eq!(counts[&0], 20);
        assert_eq!(counts[&1], 20);
        assert_eq!(result.x.nrows(), result.y.len());
        assert_eq!(result.n_synthetic, vec![(0, 0), (1, 15)]);
    }

    #[test]
    fn test_smote_preserves_original() {
        let (x, y) = create_imbalanced_data();
        let mut smote = SMOTE::new().with_k_neighbors(4).with_seed(42);
        let result = smote.fit_resample(&x, &y).unwrap();

        for i in 0..x.nrows() {
            for j in 0..x.ncols() {
                assert_eq!(result.x[[i, j]], x[[i, j]]);
            }
        }
    }

    #[test]
    fn test_synthetic_points_within_minority_hull() {
        let (x, y) = create_imbalanced_data();
        let mut smote = SMOTE::new().with_k_neighbors(4).with_seed(7);
        let result = smote.fit_resample(&x, &y).unwrap();

        for i in x.nrows()..result.x.nrows() {
            assert!(result.x[[i, 0]] >= 10.0 && result.x[[i, 0]] <= 12.0);
            assert!(result.x[[i, 1]] >= 10.0 && result.x[[i, 1]] <= 11.0);
        }
    }

    #[test]
    fn test_same_seed_same_output() {
        let (x, y) = create_imbalanced_data();
        let a = SMOTE::new().with_k_neighbors(3).with_seed(42).fit_resample(&x, &y).unwrap();
        let b = SMOTE::new().with_k_neighbors(3).with_seed(42).fit_resample(&x, &y).unwrap();
        assert_eq!(a.x, b.x);
        assert_eq!(a.y, b.y);
    }

    #[test]
    fn test_too_few_neighbors_rejected() {
        let (x, y) = create_imbalanced_data();
        // minority class has 5 samples, k=5 needs 6
        let mut smote = SMOTE::new().with_seed(42);
        assert!(smote.fit(&x, &y).is_err());
    }

    #[test]
    fn test_neighbor_ties_stable() {
        let samples = Array2::from_shape_vec((4, 1), vec![0.0, 1.0, -1.0, 1.0]).unwrap();
        let smote = SMOTE::new();
        let table = smote.neighbor_table(&samples, 2);
        // rows 1 and 2 are both at distance 1 from row 0
        assert_eq!(table[0], vec![1, 2]);
        assert_eq!(table[1], vec![3, 0]);
    }

    #[test]
    fn test_resample_before_fit() {
        let (x, y) = create_imbalanced_data();
        let smote = SMOTE::new();
        assert!(matches!(smote.resample(&x, &y), Err(PipelineError::ModelNotFitted)));
    }
}
