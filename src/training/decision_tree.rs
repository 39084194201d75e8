//! Classification tree used by the random forest

use crate::error::{PipelineError, Result};
use ndarray::Array2;
use rand::seq::index::sample;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Decision tree node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TreeNode {
    /// Leaf holding the class frequencies of its training samples
    Leaf {
        distribution: Vec<f64>,
        n_samples: usize,
    },
    /// Internal node with split
    Split {
        feature_idx: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
        n_samples: usize,
        impurity: f64,
    },
}

/// CART classifier with Gini impurity.
///
/// Works on dense class indices `0..n_classes`; the forest owns the mapping
/// back to labels. Sample indices may repeat (bootstrap draws).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    root: Option<TreeNode>,
    /// Maximum depth
    pub max_depth: Option<usize>,
    /// Minimum samples to split
    pub min_samples_split: usize,
    /// Minimum samples in leaf
    pub min_samples_leaf: usize,
    /// Features drawn at random per split (all when `None`)
    pub max_features: Option<usize>,
    n_classes: usize,
    n_features: usize,
}

impl Default for DecisionTree {
    fn default() -> Self {
        Self::new()
    }
}

struct Candidate {
    feature_idx: usize,
    threshold: f64,
    gain: f64,
}

fn gini(counts: &[usize], total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let n = total as f64;
    1.0 - counts
        .iter()
        .map(|&c| (c as f64 / n).powi(2))
        .sum::<f64>()
}

impl DecisionTree {
    pub fn new() -> Self {
        Self {
            root: None,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
            n_classes: 0,
            n_features: 0,
        }
    }

    /// Set maximum depth
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Set number of features tried per split
    pub fn with_max_features(mut self, max_features: usize) -> Self {
        self.max_features = Some(max_features);
        self
    }

    /// Grow the tree on the rows in `indices`
    pub fn fit<R: Rng>(
        &mut self,
        x: &Array2<f64>,
        y: &[usize],
        n_classes: usize,
        indices: &[usize],
        rng: &mut R,
    ) -> Result<()> {
        if x.nrows() != y.len() {
            return Err(PipelineError::Shape {
                expected: format!("y length = {}", x.nrows()),
                actual: format!("y length = {}", y.len()),
            });
        }
        if indices.is_empty() {
            return Err(PipelineError::InputContract(
                "cannot grow a tree on zero samples".to_string(),
            ));
        }
        self.n_classes = n_classes;
        self.n_features = x.ncols();
        self.root = Some(self.build_tree(x, y, indices, 0, rng));
        Ok(())
    }

    fn class_counts(&self, y: &[usize], indices: &[usize]) -> Vec<usize> {
        let mut counts = vec![0; self.n_classes];
        for &i in indices {
            counts[y[i]] += 1;
        }
        counts
    }

    fn leaf(&self, counts: &[usize], n_samples: usize) -> TreeNode {
        let n = n_samples.max(1) as f64;
        TreeNode::Leaf {
            distribution: counts.iter().map(|&c| c as f64 / n).collect(),
            n_samples,
        }
    }

    fn build_tree<R: Rng>(
        &self,
        x: &Array2<f64>,
        y: &[usize],
        indices: &[usize],
        depth: usize,
        rng: &mut R,
    ) -> TreeNode {
        let n_samples = indices.len();
        let counts = self.class_counts(y, indices);
        let impurity = gini(&counts, n_samples);

        let should_stop = n_samples < self.min_samples_split
            || n_samples < 2 * self.min_samples_leaf
            || self.max_depth.map_or(false, |d| depth >= d)
            || impurity == 0.0;

        if should_stop {
            return self.leaf(&counts, n_samples);
        }

        match self.find_best_split(x, y, indices, impurity, rng) {
            Some(best) => {
                let (left_indices, right_indices): (Vec<usize>, Vec<usize>) = indices
                    .iter()
                    .partition(|&&i| x[[i, best.feature_idx]] <= best.threshold);

                let left = Box::new(self.build_tree(x, y, &left_indices, depth + 1, rng));
                let right = Box::new(self.build_tree(x, y, &right_indices, depth + 1, rng));

                TreeNode::Split {
                    feature_idx: best.feature_idx,
                    threshold: best.threshold,
                    left,
                    right,
                    n_samples,
                    impurity,
                }
            }
            None => self.leaf(&counts, n_samples),
        }
    }

    /// Sweep each candidate feature in sorted order, tracking class counts on
    /// both sides of the threshold.
    fn find_best_split<R: Rng>(
        &self,
        x: &Array2<f64>,
        y: &[usize],
        indices: &[usize],
        parent_impurity: f64,
        rng: &mut R,
    ) -> Option<Candidate> {
        let n_features = self.n_features;
        let n_try = self.max_features.unwrap_or(n_features).clamp(1, n_features);
        let features = sample(rng, n_features, n_try);

        let total = indices.len();
        let parent_counts = self.class_counts(y, indices);
        let mut best: Option<Candidate> = None;

        for feature_idx in features.iter() {
            let mut order: Vec<usize> = indices.to_vec();
            order.sort_by(|&a, &b| x[[a, feature_idx]].total_cmp(&x[[b, feature_idx]]));

            let mut left_counts = vec![0usize; self.n_classes];
            let mut right_counts = parent_counts.clone();

            for pos in 0..total - 1 {
                let class = y[order[pos]];
                left_counts[class] += 1;
                right_counts[class] -= 1;

                let current = x[[order[pos], feature_idx]];
                let next = x[[order[pos + 1], feature_idx]];
                if current >= next {
                    continue;
                }

                let left_n = pos + 1;
                let right_n = total - left_n;
                if left_n < self.min_samples_leaf || right_n < self.min_samples_leaf {
                    continue;
                }

                let weighted = (left_n as f64 * gini(&left_counts, left_n)
                    + right_n as f64 * gini(&right_counts, right_n))
                    / total as f64;
                let gain = parent_impurity - weighted;

                if gain > best.as_ref().map_or(0.0, |b| b.gain) {
                    best = Some(Candidate {
                        feature_idx,
                        threshold: current + (next - current) / 2.0,
                        gain,
                    });
                }
            }
        }

        best
    }

    /// Class distribution of the leaf reached by one sample
    pub fn leaf_distribution(&self, sample: ndarray::ArrayView1<f64>) -> Result<&[f64]> {
        let mut node = self.root.as_ref().ok_or(PipelineError::ModelNotFitted)?;
        loop {
            match node {
                TreeNode::Leaf { distribution, .. } => return Ok(distribution),
                TreeNode::Split {
                    feature_idx,
                    threshold,
                    left,
                    right,
                    ..
                } => {
                    node = if sample[*feature_idx] <= *threshold {
                        left
                    } else {
                        right
                    };
                }
            }
        }
    }

    /// Class probabilities per row, shape (n_samples, n_classes)
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        if self.root.is_none() {
            return Err(PipelineError::ModelNotFitted);
        }
        if x.ncols() != self.n_features {
            return Err(PipelineError::Shape {
                expected: format!("{} features", self.n_features),
                actual: format!("{} features", x.ncols()),
            });
        }
        let mut out = Array2::zeros((x.nrows(), self.n_classes));
        for (i, row) in x.rows().into_iter().enumerate() {
            let dist = self.leaf_distribution(row)?;
            for (k, &p) in dist.iter().enumerate() {
                out[[i, k]] = p;
            }
        }
        Ok(out)
    }

    /// Depth of the fitted tree (a lone leaf has depth 0)
    pub fn depth(&self) -> usize {
        fn walk(node: &TreeNode) -> usize {
            match node {
                TreeNode::Leaf { .. } => 0,
                TreeNode::Split { left, right, .. } => 1 + walk(left).max(walk(right)),
            }
        }
        self.root.as_ref().map_or(0, walk)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_pure_split() {
        let x = array![[1.0, 0.0], [2.0, 0.0], [3.0, 0.0], [10.0, 0.0], [11.0, 0.0], [12.0, 0.0]];
        let y = vec![0, 0, 0, 1, 1, 1];
        let indices: Vec<usize> = (0..6).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(0);

        let mut tree = DecisionTree::new();
        tree.fit(&x, &y, 2, &indices, &mut rng).unwrap();

        let proba = tree.predict_proba(&array![[2.5, 0.0], [11.5, 0.0]]).unwrap();
        assert_eq!(proba.row(0).to_vec(), vec![1.0, 0.0]);
        assert_eq!(proba.row(1).to_vec(), vec![0.0, 1.0]);
        assert_eq!(tree.depth(), 1);
    }

    #[test]
    fn test_max_depth_gives_mixed_leaf() {
        let x = array![[1.0], [2.0], [3.0], [4.0]];
        let y = vec![0, 1, 0, 1];
        let indices: Vec<usize> = (0..4).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(0);

        let mut tree = DecisionTree::new().with_max_depth(0);
        tree.fit(&x, &y, 2, &indices, &mut rng).unwrap();
        let proba = tree.predict_proba(&array![[2.0]]).unwrap();
        assert_eq!(proba.row(0).to_vec(), vec![0.5, 0.5]);
    }

    #[test]
    fn test_repeated_indices_weight_samples() {
        let x = array![[0.0], [1.0]];
        let y = vec![0, 1];
        let mut rng = ChaCha8Rng::seed_from_u64(0);

        let mut tree = DecisionTree::new().with_max_depth(0);
        tree.fit(&x, &y, 2, &[0, 0, 0, 1], &mut rng).unwrap();
        let proba = tree.predict_proba(&array![[0.5]]).unwrap();
        assert_eq!(proba.row(0).to_vec(), vec![0.75, 0.25]);
    }

    #[test]
    fn test_constant_features_make_leaf() {
        let x = array![[1.0], [1.0], [1.0]];
        let y = vec![0, 1, 1];
        let mut rng = ChaCha8Rng::seed_from_u64(0);

        let mut tree = DecisionTree::new();
        tree.fit(&x, &y, 2, &[0, 1, 2], &mut rng).unwrap();
        assert_eq!(tree.depth(), 0);
    }
}
