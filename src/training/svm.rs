//! Support Vector Machine classifier
//!
//! Binary problems train one machine with SMO (Sequential Minimal
//! Optimization); more classes train one machine per class (one-vs-rest).
//! With probability estimates enabled each machine gets a Platt sigmoid fitted
//! on its training decision values.

use super::config::KernelType;
use super::models::{argmax_rows, check_fit_input, encode_classes, Capability, Classifier};
use crate::error::{PipelineError, Result};
use ndarray::{Array1, Array2, ArrayView1};
use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;
use tracing::debug;

/// Largest training set whose full kernel matrix is computed up front
pub const DEFAULT_DENSE_KERNEL_LIMIT: usize = 10_000;

/// Budget for cached kernel rows when the matrix is not precomputed
pub const DEFAULT_CACHE_SIZE_MB: usize = 200;

/// SVM configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SVMConfig {
    /// Regularization parameter (C)
    pub c: f64,
    /// Kernel function
    pub kernel: KernelType,
    /// Kernel coefficient; `None` means 1 / (n_features * X.var())
    pub gamma: Option<f64>,
    /// Polynomial degree
    pub degree: i32,
    /// Independent term for poly and sigmoid kernels
    pub coef0: f64,
    /// Tolerance for stopping criterion
    pub tol: f64,
    /// Maximum number of SMO sweeps
    pub max_iter: usize,
    /// Random seed
    pub random_state: Option<u64>,
    /// Fit Platt sigmoids for probability estimates
    pub probability: bool,
    /// Above this many training rows kernel rows are computed on demand
    pub dense_kernel_limit: usize,
    /// Memory for on-demand kernel rows, in megabytes
    pub cache_size_mb: usize,
}

impl Default for SVMConfig {
    fn default() -> Self {
        Self {
            c: 1.0,
            kernel: KernelType::Rbf,
            gamma: None,
            degree: 3,
            coef0: 0.0,
            tol: 1e-3,
            max_iter: 1000,
            random_state: Some(42),
            probability: false,
            dense_kernel_limit: DEFAULT_DENSE_KERNEL_LIMIT,
            cache_size_mb: DEFAULT_CACHE_SIZE_MB,
        }
    }
}

/// Kernel values over the training rows: a full matrix for small sets,
/// otherwise rows computed on demand and kept in a bounded FIFO cache.
enum KernelRows<'a> {
    Dense(Array2<f64>),
    OnDemand {
        svm: &'a SVMClassifier,
        x: &'a Array2<f64>,
        capacity: usize,
        cache: RefCell<RowCache>,
    },
}

#[derive(Default)]
struct RowCache {
    rows: HashMap<usize, Rc<Array1<f64>>>,
    order: VecDeque<usize>,
}

impl<'a> KernelRows<'a> {
    fn new(svm: &'a SVMClassifier, x: &'a Array2<f64>) -> Self {
        let n = x.nrows();
        if n <= svm.config.dense_kernel_limit {
            return KernelRows::Dense(svm.compute_kernel_matrix(x));
        }
        let row_bytes = n * std::mem::size_of::<f64>();
        let capacity = (svm.config.cache_size_mb * 1024 * 1024 / row_bytes.max(1)).max(2);
        debug!(samples = n, cached_rows = capacity, "SVM kernel rows computed on demand");
        KernelRows::OnDemand {
            svm,
            x,
            capacity,
            cache: RefCell::new(RowCache::default()),
        }
    }

    /// Run `f` on kernel row `idx` (the kernel is symmetric, so row == column)
    fn with_row<R>(&self, idx: usize, f: impl FnOnce(ArrayView1<f64>) -> R) -> R {
        match self {
            KernelRows::Dense(matrix) => f(matrix.row(idx)),
            KernelRows::OnDemand {
                svm,
                x,
                capacity,
                cache,
            } => {
                let cached = cache.borrow().rows.get(&idx).cloned();
                let row = match cached {
                    Some(row) => row,
                    None => {
                        let sample = x.row(idx);
                        let row = Rc::new(Array1::from_iter(
                            x.rows().into_iter().map(|other| svm.kernel(sample, other)),
                        ));
                        let mut cache = cache.borrow_mut();
                        if cache.order.len() >= *capacity {
                            if let Some(evicted) = cache.order.pop_front() {
                                cache.rows.remove(&evicted);
                            }
                        }
                        cache.order.push_back(idx);
                        cache.rows.insert(idx, Rc::clone(&row));
                        row
                    }
                };
                f(row.view())
            }
        }
    }

    fn get(&self, i: usize, j: usize) -> f64 {
        self.with_row(j, |row| row[i])
    }

    fn is_dense(&self) -> bool {
        matches!(self, KernelRows::Dense(_))
    }
}

/// A single binary machine: positive class vs the rest
#[derive(Debug, Clone, Serialize, Deserialize)]
struct BinarySVM {
    support_vectors: Array2<f64>,
    /// alpha_i * y_i for each support vector
    dual_coef: Array1<f64>,
    bias: f64,
    /// Platt sigmoid (A, B) when probabilities are enabled
    sigmoid: Option<(f64, f64)>,
}

/// Support Vector Classifier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SVMClassifier {
    config: SVMConfig,
    gamma: f64,
    classes: Vec<i64>,
    machines: Vec<BinarySVM>,
}

impl SVMClassifier {
    /// Create a new SVM classifier
    pub fn new(config: SVMConfig) -> Self {
        Self {
            config,
            gamma: 1.0,
            classes: Vec::new(),
            machines: Vec::new(),
        }
    }

    /// Kernel coefficient used by the last fit
    pub fn gamma(&self) -> f64 {
        self.gamma
    }

    /// Get number of support vectors
    pub fn n_support_vectors(&self) -> usize {
        self.machines.iter().map(|m| m.support_vectors.nrows()).sum()
    }

    fn resolve_gamma(&self, x: &Array2<f64>) -> f64 {
        if let Some(gamma) = self.config.gamma {
            return gamma;
        }
        let var = x.var(0.0);
        if var > 0.0 && var.is_finite() {
            1.0 / (x.ncols() as f64 * var)
        } else {
            1.0
        }
    }

    fn kernel(&self, a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
        match self.config.kernel {
            KernelType::Linear => a.dot(&b),
            KernelType::Poly => (self.gamma * a.dot(&b) + self.config.coef0).powi(self.config.degree),
            KernelType::Rbf => {
                let norm_sq: f64 = a.iter().zip(b.iter()).map(|(u, v)| (u - v) * (u - v)).sum();
                (-self.gamma * norm_sq).exp()
            }
            KernelType::Sigmoid => (self.gamma * a.dot(&b) + self.config.coef0).tanh(),
        }
    }

    fn compute_kernel_matrix(&self, x: &Array2<f64>) -> Array2<f64> {
        let n = x.nrows();
        let mut k = Array2::zeros((n, n));
        for i in 0..n {
            for j in i..n {
                let val = self.kernel(x.row(i), x.row(j));
                k[[i, j]] = val;
                k[[j, i]] = val;
            }
        }
        k
    }

    /// SMO training on labels in {-1, +1}; returns (alphas, bias)
    fn smo_train(
        &self,
        kernel: &KernelRows<'_>,
        y: &Array1<f64>,
        rng: &mut Xoshiro256PlusPlus,
    ) -> (Array1<f64>, f64) {
        let n = y.len();
        let c = self.config.c;
        let tol = self.config.tol;

        let mut alphas = Array1::<f64>::zeros(n);
        let mut bias = 0.0;

        let output = |alphas: &Array1<f64>, bias: f64, idx: usize| -> f64 {
            kernel.with_row(idx, |row| {
                let mut sum = bias;
                for i in 0..n {
                    if alphas[i] != 0.0 {
                        sum += alphas[i] * y[i] * row[i];
                    }
                }
                sum
            })
        };

        let mut passes = 0;
        let max_passes = 5;
        let mut total_iter = 0;

        while passes < max_passes && total_iter < self.config.max_iter && n > 1 {
            let mut num_changed = 0;

            for i in 0..n {
                let e_i = output(&alphas, bias, i) - y[i];

                // KKT violation
                if (y[i] * e_i < -tol && alphas[i] < c) || (y[i] * e_i > tol && alphas[i] > 0.0) {
                    let j = loop {
                        let j = rng.gen_range(0..n);
                        if j != i {
                            break j;
                        }
                    };

                    let e_j = output(&alphas, bias, j) - y[j];
                    let alpha_i_old = alphas[i];
                    let alpha_j_old = alphas[j];

                    let (l, h) = if y[i] != y[j] {
                        ((alphas[j] - alphas[i]).max(0.0), (c + alphas[j] - alphas[i]).min(c))
                    } else {
                        ((alphas[i] + alphas[j] - c).max(0.0), (alphas[i] + alphas[j]).min(c))
                    };
                    if (l - h).abs() < 1e-10 {
                        continue;
                    }

                    let (k_ij, k_ii, k_jj) = (kernel.get(i, j), kernel.get(i, i), kernel.get(j, j));
                    let eta = 2.0 * k_ij - k_ii - k_jj;
                    if eta >= 0.0 {
                        continue;
                    }

                    alphas[j] = (alphas[j] - y[j] * (e_i - e_j) / eta).max(l).min(h);
                    if (alphas[j] - alpha_j_old).abs() < 1e-5 {
                        continue;
                    }
                    alphas[i] += y[i] * y[j] * (alpha_j_old - alphas[j]);

                    let b1 = bias
                        - e_i
                        - y[i] * (alphas[i] - alpha_i_old) * k_ii
                        - y[j] * (alphas[j] - alpha_j_old) * k_ij;
                    let b2 = bias
                        - e_j
                        - y[i] * (alphas[i] - alpha_i_old) * k_ij
                        - y[j] * (alphas[j] - alpha_j_old) * k_jj;

                    bias = if alphas[i] > 0.0 && alphas[i] < c {
                        b1
                    } else if alphas[j] > 0.0 && alphas[j] < c {
                        b2
                    } else {
                        (b1 + b2) / 2.0
                    };

                    num_changed += 1;
                }
            }

            total_iter += 1;
            if num_changed == 0 {
                passes += 1;
            } else {
                passes = 0;
            }
        }

        if passes < max_passes && n > 1 {
            debug!(
                max_iter = self.config.max_iter,
                "SVM solver stopped at the iteration cap before converging"
            );
        }

        (alphas, bias)
    }

    fn train_machine(
        &self,
        x: &Array2<f64>,
        kernel: &KernelRows<'_>,
        y: &Array1<f64>,
        rng: &mut Xoshiro256PlusPlus,
    ) -> BinarySVM {
        let (alphas, bias) = self.smo_train(kernel, y, rng);

        let support: Vec<usize> = (0..alphas.len()).filter(|&i| alphas[i] > 1e-8).collect();
        let support_vectors = x.select(ndarray::Axis(0), &support);
        let dual_coef = Array1::from_iter(support.iter().map(|&i| alphas[i] * y[i]));

        let sigmoid = if self.config.probability {
            let decision: Vec<f64> = (0..y.len())
                .map(|idx| {
                    kernel.with_row(idx, |row| {
                        bias + support
                            .iter()
                            .zip(dual_coef.iter())
                            .map(|(&s, &coef)| coef * row[s])
                            .sum::<f64>()
                    })
                })
                .collect();
            let positive: Vec<bool> = y.iter().map(|&v| v > 0.0).collect();
            Some(platt_scaling(&decision, &positive))
        } else {
            None
        };

        BinarySVM {
            support_vectors,
            dual_coef,
            bias,
            sigmoid,
        }
    }

    fn machine_scores(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        if self.machines.is_empty() {
            return Err(PipelineError::ModelNotFitted);
        }
        let n_features = self.machines[0].support_vectors.ncols();
        if x.ncols() != n_features && self.n_support_vectors() > 0 {
            return Err(PipelineError::Shape {
                expected: format!("{} features", n_features),
                actual: format!("{} features", x.ncols()),
            });
        }

        let mut scores = Array2::zeros((x.nrows(), self.machines.len()));
        for (i, sample) in x.rows().into_iter().enumerate() {
            for (m, machine) in self.machines.iter().enumerate() {
                let mut sum = machine.bias;
                for (sv, &coef) in machine
                    .support_vectors
                    .rows()
                    .into_iter()
                    .zip(machine.dual_coef.iter())
                {
                    sum += coef * self.kernel(sample, sv);
                }
                scores[[i, m]] = sum;
            }
        }
        Ok(scores)
    }
}

impl Classifier for SVMClassifier {
    /// Fit the classifier (binary, or multi-class via One-vs-Rest)
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<i64>) -> Result<()> {
        check_fit_input(x, y)?;

        let (classes, encoded) = encode_classes(y);
        self.gamma = self.resolve_gamma(x);
        let kernel = KernelRows::new(self, x);
        debug!(dense = kernel.is_dense(), samples = x.nrows(), "SVM kernel prepared");

        let mut rng = match self.config.random_state {
            Some(seed) => Xoshiro256PlusPlus::seed_from_u64(seed),
            None => Xoshiro256PlusPlus::from_entropy(),
        };

        // Binary: a single machine with the larger label as the positive class
        let positives: Vec<usize> = if classes.len() == 2 {
            vec![1]
        } else {
            (0..classes.len()).collect()
        };

        let mut machines = Vec::with_capacity(positives.len());
        for positive in positives {
            let y_binary = Array1::from_iter(
                encoded
                    .iter()
                    .map(|&k| if k == positive { 1.0 } else { -1.0 }),
            );
            machines.push(self.train_machine(x, &kernel, &y_binary, &mut rng));
        }

        drop(kernel);

        self.machines = machines;
        self.classes = classes;
        debug!(
            kernel = %self.config.kernel,
            gamma = self.gamma,
            support_vectors = self.n_support_vectors(),
            "SVM fitted"
        );
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<i64>> {
        let scores = self.machine_scores(x)?;
        if self.classes.len() == 2 {
            Ok(scores.column(0).mapv(|s| {
                if s > 0.0 {
                    self.classes[1]
                } else {
                    self.classes[0]
                }
            }))
        } else {
            Ok(argmax_rows(&scores)
                .into_iter()
                .map(|k| self.classes[k])
                .collect())
        }
    }

    fn classes(&self) -> &[i64] {
        &self.classes
    }

    fn capability(&self) -> Capability {
        if self.config.probability {
            Capability::Probabilistic
        } else {
            Capability::ScoreBased
        }
    }

    fn predict_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        if !self.config.probability {
            return Err(PipelineError::Metric(
                "probability estimates are disabled for this SVM".to_string(),
            ));
        }
        let scores = self.machine_scores(x)?;
        let n = x.nrows();

        if self.classes.len() == 2 {
            let (a, b) = self.machines[0].sigmoid.unwrap_or((-1.0, 0.0));
            let mut proba = Array2::zeros((n, 2));
            for i in 0..n {
                let p = sigmoid_predict(scores[[i, 0]], a, b);
                proba[[i, 0]] = 1.0 - p;
                proba[[i, 1]] = p;
            }
            return Ok(proba);
        }

        let mut proba = Array2::zeros((n, self.classes.len()));
        for (m, machine) in self.machines.iter().enumerate() {
            let (a, b) = machine.sigmoid.unwrap_or((-1.0, 0.0));
            for i in 0..n {
                proba[[i, m]] = sigmoid_predict(scores[[i, m]], a, b);
            }
        }
        for mut row in proba.rows_mut() {
            let sum = row.sum();
            if sum > 0.0 {
                row /= sum;
            } else {
                row.fill(1.0 / self.classes.len() as f64);
            }
        }
        Ok(proba)
    }

    /// Binary: one column, positive for the larger label. Otherwise one
    /// column per class.
    fn decision_function(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        self.machine_scores(x)
    }
}

/// P(positive | f) = 1 / (1 + exp(A f + B)), evaluated without overflow
fn sigmoid_predict(decision: f64, a: f64, b: f64) -> f64 {
    let f_apb = decision * a + b;
    if f_apb >= 0.0 {
        (-f_apb).exp() / (1.0 + (-f_apb).exp())
    } else {
        1.0 / (1.0 + f_apb.exp())
    }
}

/// Platt's sigmoid fit with regularized targets, Newton steps and
/// backtracking line search. Returns (A, B).
fn platt_scaling(decision: &[f64], positive: &[bool]) -> (f64, f64) {
    const MAX_ITER: usize = 100;
    const MIN_STEP: f64 = 1e-10;
    const SIGMA: f64 = 1e-12;
    const EPS: f64 = 1e-5;

    let prior1 = positive.iter().filter(|&&p| p).count() as f64;
    let prior0 = positive.len() as f64 - prior1;

    let hi_target = (prior1 + 1.0) / (prior1 + 2.0);
    let lo_target = 1.0 / (prior0 + 2.0);
    let targets: Vec<f64> = positive
        .iter()
        .map(|&p| if p { hi_target } else { lo_target })
        .collect();

    let objective = |a: f64, b: f64| -> f64 {
        decision
            .iter()
            .zip(&targets)
            .map(|(&f, &t)| {
                let f_apb = f * a + b;
                if f_apb >= 0.0 {
                    t * f_apb + (1.0 + (-f_apb).exp()).ln()
                } else {
                    (t - 1.0) * f_apb + (1.0 + f_apb.exp()).ln()
                }
            })
            .sum()
    };

    let mut a = 0.0;
    let mut b = ((prior0 + 1.0) / (prior1 + 1.0)).ln();
    let mut fval = objective(a, b);

    for _ in 0..MAX_ITER {
        let (mut h11, mut h22, mut h21) = (SIGMA, SIGMA, 0.0);
        let (mut g1, mut g2) = (0.0, 0.0);

        for (&f, &t) in decision.iter().zip(&targets) {
            let f_apb = f * a + b;
            let (p, q) = if f_apb >= 0.0 {
                let e = (-f_apb).exp();
                (e / (1.0 + e), 1.0 / (1.0 + e))
            } else {
                let e = f_apb.exp();
                (1.0 / (1.0 + e), e / (1.0 + e))
            };
            let d2 = p * q;
            h11 += f * f * d2;
            h22 += d2;
            h21 += f * d2;
            let d1 = t - p;
            g1 += f * d1;
            g2 += d1;
        }

        if g1.abs() < EPS && g2.abs() < EPS {
            break;
        }

        let det = h11 * h22 - h21 * h21;
        let d_a = -(h22 * g1 - h21 * g2) / det;
        let d_b = -(-h21 * g1 + h11 * g2) / det;
        let gd = g1 * d_a + g2 * d_b;

        let mut step = 1.0;
        while step >= MIN_STEP {
            let new_a = a + step * d_a;
            let new_b = b + step * d_b;
            let new_f = objective(new_a, new_b);
            if new_f < fval + 1e-4 * step * gd {
                a = new_a;
                b = new_b;
                fval = new_f;
                break;
            }
            step /= 2.0;
        }

        if step < MIN_STEP {
            debug!("Platt scaling line search failed");
            break;
        }
    }

    (a, b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    fn create_linear_separable_data() -> (Array2<f64>, Array1<i64>) {
        let x = array![
            [1.0, 2.0], [2.0, 3.0], [3.0, 3.0], [2.0, 1.0],
            [6.0, 5.0], [7.0, 7.0], [8.0, 6.0], [7.0, 8.0]
        ];
        let y = array![0i64, 0, 0, 0, 1, 1, 1, 1];
        (x, y)
    }

    #[test]
    fn test_svm_classifier_linear() {
        let (x, y) = create_linear_separable_data();
        let config = SVMConfig {
            kernel: KernelType::Linear,
            ..SVMConfig::default()
        };
        let mut svm = SVMClassifier::new(config);
        svm.fit(&x, &y).unwrap();

        assert_eq!(svm.predict(&x).unwrap(), y);
        assert!(svm.n_support_vectors() > 0);
    }

    #[test]
    fn test_svm_classifier_rbf() {
        let (x, y) = create_linear_separable_data();
        let mut svm = SVMClassifier::new(SVMConfig::default());
        svm.fit(&x, &y).unwrap();

        let scores = svm.decision_function(&x).unwrap();
        assert_eq!(scores.dim(), (8, 1));
        assert!(scores[[0, 0]] < 0.0);
        assert!(scores[[7, 0]] > 0.0);
    }

    #[test]
    fn test_gamma_scale() {
        let x = array![[0.0, 0.0], [2.0, 2.0]];
        let y = array![0i64, 1];
        let mut svm = SVMClassifier::new(SVMConfig::default());
        svm.fit(&x, &y).unwrap();
        // var over all entries = 1, two features
        assert_abs_diff_eq!(svm.gamma(), 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_svm_classifier_multiclass() {
        let x = array![
            [0.0, 0.0], [0.5, 0.3], [0.2, 0.6],
            [5.0, 5.0], [5.4, 5.2], [5.1, 4.7],
            [0.0, 9.0], [0.4, 9.5], [0.3, 8.8]
        ];
        let y = array![0i64, 0, 0, 1, 1, 1, 2, 2, 2];
        let mut svm = SVMClassifier::new(SVMConfig::default());
        svm.fit(&x, &y).unwrap();

        assert_eq!(svm.decision_function(&x).unwrap().dim(), (9, 3));
        assert_eq!(svm.predict(&x).unwrap(), y);
    }

    #[test]
    fn test_capability_follows_probability_flag() {
        let plain = SVMClassifier::new(SVMConfig::default());
        assert_eq!(plain.capability(), Capability::ScoreBased);

        let calibrated = SVMClassifier::new(SVMConfig {
            probability: true,
            ..SVMConfig::default()
        });
        assert_eq!(calibrated.capability(), Capability::Probabilistic);
    }

    #[test]
    fn test_probabilities() {
        let (x, y) = create_linear_separable_data();
        let mut svm = SVMClassifier::new(SVMConfig {
            probability: true,
            ..SVMConfig::default()
        });
        svm.fit(&x, &y).unwrap();

        let proba = svm.predict_proba(&x).unwrap();
        assert_eq!(proba.dim(), (8, 2));
        for row in proba.rows() {
            assert_abs_diff_eq!(row.sum(), 1.0, epsilon = 1e-9);
        }
        assert!(proba[[7, 1]] > proba[[0, 1]]);
    }

    #[test]
    fn test_proba_disabled() {
        let (x, y) = create_linear_separable_data();
        let mut svm = SVMClassifier::new(SVMConfig::default());
        svm.fit(&x, &y).unwrap();
        assert!(svm.predict_proba(&x).is_err());
    }

    #[test]
    fn test_on_demand_kernel_matches_dense() {
        let x = array![
            [0.0, 0.0], [0.5, 0.3], [0.2, 0.6], [0.9, 0.1],
            [5.0, 5.0], [5.4, 5.2], [5.1, 4.7], [4.6, 5.3],
            [0.0, 9.0], [0.4, 9.5], [0.3, 8.8], [0.8, 9.1]
        ];
        let y = array![0i64, 0, 0, 0, 1, 1, 1, 1, 2, 2, 2, 2];

        let mut dense = SVMClassifier::new(SVMConfig {
            probability: true,
            ..SVMConfig::default()
        });
        dense.fit(&x, &y).unwrap();

        // two cached rows at most, so rows are evicted and recomputed
        let mut streamed = SVMClassifier::new(SVMConfig {
            probability: true,
            dense_kernel_limit: 4,
            cache_size_mb: 0,
            ..SVMConfig::default()
        });
        streamed.fit(&x, &y).unwrap();

        assert_eq!(streamed.n_support_vectors(), dense.n_support_vectors());
        let a = dense.decision_function(&x).unwrap();
        let b = streamed.decision_function(&x).unwrap();
        for (u, v) in a.iter().zip(b.iter()) {
            assert_abs_diff_eq!(u, v, epsilon = 1e-12);
        }
        assert_eq!(streamed.predict(&x).unwrap(), y);
        let proba = streamed.predict_proba(&x).unwrap();
        for row in proba.rows() {
            assert_abs_diff_eq!(row.sum(), 1.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_training_set_above_dense_limit_fits() {
        let n = 60;
        let x = Array2::from_shape_fn((n, 2), |(i, j)| {
            let class = (i % 2) as f64;
            class * 6.0 + ((i * 3 + j * 5) % 7) as f64 / 7.0
        });
        let y = Array1::from_shape_fn(n, |i| (i % 2) as i64);

        let mut svm = SVMClassifier::new(SVMConfig {
            dense_kernel_limit: 50,
            cache_size_mb: 0,
            ..SVMConfig::default()
        });
        svm.fit(&x, &y).unwrap();
        assert_eq!(svm.predict(&x).unwrap(), y);
    }

    #[test]
    fn test_platt_monotone() {
        let decision = [-3.0, -2.0, -1.0, 1.0, 2.0, 3.0];
        let positive = [false, false, false, true, true, true];
        let (a, b) = platt_scaling(&decision, &positive);
        assert!(a < 0.0);
        assert!(sigmoid_predict(2.0, a, b) > sigmoid_predict(-2.0, a, b));
    }
}
