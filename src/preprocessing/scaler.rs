//! Feature standardization

use crate::error::{PipelineError, Result};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

/// Non-zero fraction at or below which a matrix is treated as sparse
pub const SPARSE_DENSITY_THRESHOLD: f64 = 0.1;

/// Fraction of non-zero entries in a matrix
pub fn density(x: &Array2<f64>) -> f64 {
    if x.is_empty() {
        return 1.0;
    }
    x.iter().filter(|v| **v != 0.0).count() as f64 / x.len() as f64
}

/// Whether a matrix is mostly zeros and should not be densified by centering
pub fn is_sparse(x: &Array2<f64>) -> bool {
    density(x) <= SPARSE_DENSITY_THRESHOLD
}

/// Parameters for a fitted scaler
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ScalerParams {
    center: Array1<f64>, // mean, or zero when centering is off
    scale: Array1<f64>,  // population std, 1 for constant columns
}

/// Standard scaler: (x - mean) / std, fitted column-wise
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandardScaler {
    with_mean: bool,
    params: Option<ScalerParams>,
}

impl Default for StandardScaler {
    fn default() -> Self {
        Self::new()
    }
}

impl StandardScaler {
    /// Create a new scaler that centers and scales
    pub fn new() -> Self {
        Self {
            with_mean: true,
            params: None,
        }
    }

    /// Scaler configured for the given training matrix: centering is
    /// switched off for sparse input.
    pub fn for_input(x: &Array2<f64>) -> Self {
        Self::new().with_mean(!is_sparse(x))
    }

    /// Enable or disable centering
    pub fn with_mean(mut self, with_mean: bool) -> Self {
        self.with_mean = with_mean;
        self
    }

    pub fn centers(&self) -> bool {
        self.with_mean
    }

    /// Fit the scaler to the data
    pub fn fit(&mut self, x: &Array2<f64>) -> Result<&mut Self> {
        if x.nrows() == 0 {
            return Err(PipelineError::InputContract(
                "cannot fit scaler on zero rows".to_string(),
            ));
        }

        let mean = x
            .mean_axis(Axis(0))
            .ok_or_else(|| PipelineError::InputContract("empty feature matrix".to_string()))?;
        let std = x.std_axis(Axis(0), 0.0);

        let scale = std.mapv(|s| if s == 0.0 || !s.is_finite() { 1.0 } else { s });
        let center = if self.with_mean {
            mean
        } else {
            Array1::zeros(x.ncols())
        };

        self.params = Some(ScalerParams { center, scale });
        Ok(self)
    }

    /// Transform the data
    pub fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        let params = self.params.as_ref().ok_or(PipelineError::ModelNotFitted)?;
        if x.ncols() != params.scale.len() {
            return Err(PipelineError::Shape {
                expected: format!("{} columns", params.scale.len()),
                actual: format!("{} columns", x.ncols()),
            });
        }

        Ok((x - &params.center.view().insert_axis(Axis(0)))
            / &params.scale.view().insert_axis(Axis(0)))
    }

    /// Fit and transform in one step
    pub fn fit_transform(&mut self, x: &Array2<f64>) -> Result<Array2<f64>> {
        self.fit(x)?;
        self.transform(x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn test_standard_scaler() {
        let x = array![[1.0, 10.0], [2.0, 20.0], [3.0, 30.0], [4.0, 40.0], [5.0, 50.0]];

        let mut scaler = StandardScaler::new();
        let result = scaler.fit_transform(&x).unwrap();

        for col in result.columns() {
            assert_abs_diff_eq!(col.mean().unwrap(), 0.0, epsilon = 1e-10);
            assert_abs_diff_eq!(col.std(0.0), 1.0, epsilon = 1e-10);
        }
    }

    #[test]
    fn test_fit_on_train_applies_to_test() {
        let train = array![[0.0], [2.0]];
        let test = array![[4.0]];

        let mut scaler = StandardScaler::new();
        scaler.fit(&train).unwrap();
        let out = scaler.transform(&test).unwrap();
        // mean 1, std 1
        assert_abs_diff_eq!(out[[0, 0]], 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_constant_column_kept_finite() {
        let x = array![[7.0, 1.0], [7.0, 2.0]];
        let mut scaler = StandardScaler::new();
        let out = scaler.fit_transform(&x).unwrap();
        assert_eq!(out[[0, 0]], 0.0);
        assert_eq!(out[[1, 0]], 0.0);
    }

    #[test]
    fn test_sparse_input_skips_centering() {
        let mut x = Array2::<f64>::zeros((20, 5));
        x[[0, 0]] = 4.0;
        x[[3, 2]] = 2.0;
        assert!(is_sparse(&x));

        let mut scaler = StandardScaler::for_input(&x);
        assert!(!scaler.centers());
        let out = scaler.fit_transform(&x).unwrap();
        // zeros stay zero without centering
        assert_eq!(out[[1, 0]], 0.0);
        assert!(out[[0, 0]] > 0.0);
    }

    #[test]
    fn test_dense_input_centers() {
        let x = array![[1.0, 2.0], [3.0, 4.0]];
        assert!(StandardScaler::for_input(&x).centers());
    }

    #[test]
    fn test_transform_before_fit() {
        let scaler = StandardScaler::new();
        assert!(scaler.transform(&array![[1.0]]).is_err());
    }
}
