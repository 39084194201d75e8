//! Linear model implementations

use super::models::{argmax_rows, check_fit_input, encode_classes, Capability, Classifier};
use crate::error::{PipelineError, Result};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Multinomial logistic regression with L2 penalty, fitted by full-batch
/// gradient descent. Two classes reduce to the usual sigmoid model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticRegression {
    /// Fitted weights, shape (n_features, n_classes)
    pub coefficients: Option<Array2<f64>>,
    /// Fitted intercepts, one per class
    pub intercept: Option<Array1<f64>>,
    /// Inverse regularization strength
    pub c: f64,
    /// Maximum iterations
    pub max_iter: usize,
    /// Convergence tolerance on the gradient norm
    pub tol: f64,
    /// Iterations used by the last fit
    pub n_iter: usize,
    /// Whether the last fit reached `tol`
    pub converged: bool,
    classes: Vec<i64>,
}

impl Default for LogisticRegression {
    fn default() -> Self {
        Self::new()
    }
}

impl LogisticRegression {
    /// Create a new logistic regression model
    pub fn new() -> Self {
        Self {
            coefficients: None,
            intercept: None,
            c: 1.0,
            max_iter: 100,
            tol: 1e-4,
            n_iter: 0,
            converged: false,
            classes: Vec::new(),
        }
    }

    /// Set maximum iterations
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Row-wise softmax, shifted by the row max for stability
    fn softmax(z: &mut Array2<f64>) {
        for mut row in z.rows_mut() {
            let max = row.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            row.mapv_inplace(|v| (v - max).exp());
            let sum = row.sum();
            row.mapv_inplace(|v| v / sum);
        }
    }

    fn linear(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        let (w, b) = match (&self.coefficients, &self.intercept) {
            (Some(w), Some(b)) => (w, b),
            _ => return Err(PipelineError::ModelNotFitted),
        };
        if x.ncols() != w.nrows() {
            return Err(PipelineError::Shape {
                expected: format!("{} features", w.nrows()),
                actual: format!("{} features", x.ncols()),
            });
        }
        Ok(x.dot(w) + &b.view().insert_axis(Axis(0)))
    }
}

impl Classifier for LogisticRegression {
    /// Fit the model using gradient descent
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<i64>) -> Result<()> {
        check_fit_input(x, y)?;
        let (classes, encoded) = encode_classes(y);
        let n_samples = x.nrows();
        let n_features = x.ncols();
        let n_classes = classes.len();
        let n = n_samples as f64;

        let mut targets = Array2::<f64>::zeros((n_samples, n_classes));
        for (i, &k) in encoded.iter().enumerate() {
            targets[[i, k]] = 1.0;
        }

        // Penalty 1/(2C) * ||W||^2 on the summed loss, expressed per sample
        let alpha = 1.0 / (self.c * n);

        // Step size from a Lipschitz bound on the mean loss gradient
        let mean_sq_norm = x.rows().into_iter().map(|r| r.dot(&r)).sum::<f64>() / n;
        let lr = 1.0 / (0.5 * (mean_sq_norm + 1.0) + alpha);

        let mut weights = Array2::<f64>::zeros((n_features, n_classes));
        let mut bias = Array1::<f64>::zeros(n_classes);

        self.converged = false;
        self.n_iter = 0;

        for iter in 0..self.max_iter {
            let mut proba = x.dot(&weights) + &bias.view().insert_axis(Axis(0));
            Self::softmax(&mut proba);

            let errors = proba - &targets;
            let dw = x.t().dot(&errors) / n + alpha * &weights;
            let db = errors.sum_axis(Axis(0)) / n;

            self.n_iter = iter + 1;
            let grad_norm = (dw.mapv(|v| v * v).sum() + db.mapv(|v| v * v).sum()).sqrt();
            if grad_norm < self.tol {
                self.converged = true;
                break;
            }

            weights = weights - lr * dw;
            bias = bias - lr * db;
        }

        if !self.converged {
            debug!(
                max_iter = self.max_iter,
                "Logistic regression did not converge; increase linear_model_max_iterations"
            );
        }

        self.coefficients = Some(weights);
        self.intercept = Some(bias);
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

    fn predict_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        let mut z = self.linear(x)?;
        Self::softmax(&mut z);
        Ok(z)
    }

    fn decision_function(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        self.linear(x)
    }
}
