//! Training configuration

use crate::error::{PipelineError, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Kernel used by the SVM model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KernelType {
    Linear,
    Poly,
    Rbf,
    Sigmoid,
}

impl FromStr for KernelType {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "linear" => Ok(KernelType::Linear),
            "poly" | "polynomial" => Ok(KernelType::Poly),
            "rbf" => Ok(KernelType::Rbf),
            "sigmoid" => Ok(KernelType::Sigmoid),
            other => Err(PipelineError::config_field(
                "kernel_type",
                format!("unknown kernel '{}', expected linear, poly, rbf or sigmoid", other),
            )),
        }
    }
}

impl std::fmt::Display for KernelType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            KernelType::Linear => "linear",
            KernelType::Poly => "poly",
            KernelType::Rbf => "rbf",
            KernelType::Sigmoid => "sigmoid",
        };
        f.write_str(name)
    }
}

/// Configuration for a training run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Fraction of rows reserved for the test split
    pub test_size: f64,

    /// Seed for the split, the forest and the SVM solver
    pub random_state: u64,

    /// Preserve class proportions in the split
    pub stratify: bool,

    /// Iteration cap for logistic regression
    pub linear_model_max_iterations: usize,

    /// Standardize features for the linear and kernel models
    pub scale_linear_and_kernel_models: bool,

    /// SVM kernel name
    pub kernel_type: String,

    /// Calibrate SVM scores into probabilities
    pub enable_probability_estimates: bool,

    /// Print per-model progress lines
    pub show_progress: bool,

    /// Add confusion matrix and ROC-AUC to the report
    pub extended_metrics: bool,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            test_size: 0.3,
            random_state: 42,
            stratify: true,
            linear_model_max_iterations: 2000,
            scale_linear_and_kernel_models: true,
            kernel_type: "rbf".to_string(),
            enable_probability_estimates: false,
            show_progress: false,
            extended_metrics: false,
        }
    }
}

impl TrainingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_test_size(mut self, test_size: f64) -> Self {
        self.test_size = test_size;
        self
    }

    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = seed;
        self
    }

    pub fn with_stratify(mut self, stratify: bool) -> Self {
        self.stratify = stratify;
        self
    }

    pub fn with_max_iterations(mut self, max_iter: usize) -> Self {
        self.linear_model_max_iterations = max_iter;
        self
    }

    pub fn with_scaling(mut self, scale: bool) -> Self {
        self.scale_linear_and_kernel_models = scale;
        self
    }

    pub fn with_kernel(mut self, kernel: impl Into<String>) -> Self {
        self.kernel_type = kernel.into();
        self
    }

    pub fn with_probability_estimates(mut self, enabled: bool) -> Self {
        self.enable_probability_estimates = enabled;
        self
    }

    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    pub fn with_extended_metrics(mut self, enabled: bool) -> Self {
        self.extended_metrics = enabled;
        self
    }

    /// Parsed kernel type
    pub fn kernel(&self) -> Result<KernelType> {
        self.kernel_type.parse()
    }

    /// Check every field, naming the first offending one
    pub fn validate(&self) -> Result<()> {
        if !(self.test_size > 0.0 && self.test_size < 1.0) {
            return Err(PipelineError::config_field(
                "test_size",
                format!("must be in (0, 1), got {}", self.test_size),
            ));
        }
        if self.linear_model_max_iterations == 0 {
            return Err(PipelineError::config_field(
                "linear_model_max_iterations",
                "must be at least 1",
            ));
        }
        self.kernel()?;
        Ok(())
    }
}
