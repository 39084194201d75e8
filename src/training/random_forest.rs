//! Random Forest implementation

use super::decision_tree::DecisionTree;
use super::models::{argmax_rows, check_fit_input, encode_classes, Capability, Classifier};
use crate::error::{PipelineError, Result};
use ndarray::{Array1, Array2};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Random forest classifier: bootstrap-aggregated Gini trees whose leaf
/// distributions are averaged for probabilities. Each split tries
/// floor(sqrt(n_features)) features.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForest {
    /// Individual trees
    trees: Vec<DecisionTree>,
    /// Number of trees
    pub n_estimators: usize,
    /// Random state
    pub random_state: Option<u64>,
    n_features: usize,
    classes: Vec<i64>,
}

impl Default for RandomForest {
    fn default() -> Self {
        Self::new(100)
    }
}

impl RandomForest {
    /// Create a new classifier forest
    pub fn new(n_estimators: usize) -> Self {
        Self {
            trees: Vec::new(),
            n_estimators,
            random_state: None,
            n_features: 0,
            classes: Vec::new(),
        }
    }

    /// Set random state
    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    fn compute_max_features(n_features: usize) -> usize {
        ((n_features as f64).sqrt().floor() as usize).max(1)
    }

    /// Get number of trees
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}

impl Classifier for RandomForest {
    /// Fit the forest, one tree after another
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<i64>) -> Result<()> {
        check_fit_input(x, y)?;
        if self.n_estimators == 0 {
            return Err(PipelineError::config_field("n_estimators", "must be at least 1"));
        }

        let n_samples = x.nrows();
        let (classes, encoded) = encode_classes(y);
        let max_features = Self::compute_max_features(x.ncols());
        let base_seed = self.random_state.unwrap_or(42);

        let mut trees = Vec::with_capacity(self.n_estimators);
        for tree_idx in 0..self.n_estimators {
            let seed = base_seed.wrapping_add(tree_idx as u64);
            let mut rng = ChaCha8Rng::seed_from_u64(seed);

            let sample_indices: Vec<usize> =
                (0..n_samples).map(|_| rng.gen_range(0..n_samples)).collect();

            let mut tree = DecisionTree::new().with_max_features(max_features);
            tree.fit(x, &encoded, classes.len(), &sample_indices, &mut rng)?;
            trees.push(tree);
        }

        debug!(
            n_trees = trees.len(),
            max_features,
            max_depth = trees.iter().map(|t| t.depth()).max().unwrap_or(0),
            "Forest grown"
        );

        self.trees = trees;
        self.n_features = x.ncols();
        self.classes = classes;
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<i64>> {
        let proba = self.predict_proba(x)?;
        Ok(argmax_rows(&proba)
            .into_iter()
            .map(|k| self.classes[k])
            .collect())
    }

    fn classes(&self) -> &[i64] {
        &self.classes
    }

    fn capability(&self) -> Capability {
        Capability::Probabilistic
    }

    /// Mean of the trees' leaf class distributions
    fn predict_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        if self.trees.is_empty() {
            return Err(PipelineError::ModelNotFitted);
        }

        let mut proba = Array2::<f64>::zeros((x.nrows(), self.classes.len()));
        for tree in &self.trees {
            proba += &tree.predict_proba(x)?;
        }
        proba /= self.trees.len() as f64;
        Ok(proba)
    }
}
