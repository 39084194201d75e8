//! Random oversampling by row replication

use crate::error::{PipelineError, Result};
use crate::sampling::{check_aligned, class_indices, majority_targets, ResampleResult, Sampler};
use ndarray::{Array1, Array2};
use rand::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Random oversampler (duplicates existing rows of the smaller classes)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomOverSampler {
    /// Random seed
    seed: Option<u64>,
    /// Target counts
    target_counts: Option<BTreeMap<i64, usize>>,
}

impl RandomOverSampler {
    /// Create new random oversampler
    pub fn new() -> Self {
        Self {
            seed: None,
            target_counts: None,
        }
    }

    /// Set random seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

impl Default for RandomOverSampler {
    fn default() -> Self {
        Self::new()
    }
}

impl Sampler for RandomOverSampler {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<i64>) -> Result<()> {
        check_aligned(x, y)?;
        self.target_counts = Some(majority_targets(y));
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

        // Rows to emit: every original row, then the drawn duplicates
        let mut selected: Vec<usize> = (0..x.nrows()).collect();
        let mut n_synthetic = Vec::new();

        for (&class, class_idx) in &indices {
            let target_count = targets.get(&class).copied().unwrap_or(0);
            let n_to_add = target_count.saturating_sub(class_idx.len());

            for _ in 0..n_to_add {
                selected.push(class_idx[rng.gen_range(0..class_idx.len())]);
            }

            n_synthetic.push((class, n_to_add));
        }

        let result_x = x.select(ndarray::Axis(0), &selected);
        let result_y = Array1::from_iter(selected.iter().map(|&i| y[i]));

        Ok(ResampleResult {
            x: result_x,
            y: result_y,
            n_synthetic,
        })
    }
}
