//! Classifier abstraction and per-model pipelines

use super::config::TrainingConfig;
use super::linear_models::LogisticRegression;
use super::random_forest::RandomForest;
use super::svm::{SVMClassifier, SVMConfig};
use crate::error::{PipelineError, Result};
use crate::preprocessing::StandardScaler;
use crate::utils::timed;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// What kind of scores a fitted model can produce beyond hard labels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Capability {
    /// Class probability estimates, one column per class
    Probabilistic,
    /// Unnormalized decision scores
    ScoreBased,
    /// Hard labels only
    LabelOnly,
}

/// Continuous scores for ranking metrics
#[derive(Debug, Clone)]
pub enum Scores {
    /// Shape (n_samples, n_classes); rows sum to one
    Probabilities(Array2<f64>),
    /// Shape (n_samples, 1) for binary problems, (n_samples, n_classes) otherwise
    Decision(Array2<f64>),
}

impl Scores {
    pub fn matrix(&self) -> &Array2<f64> {
        match self {
            Scores::Probabilities(m) | Scores::Decision(m) => m,
        }
    }
}

/// A classifier over integer labels
pub trait Classifier {
    /// Fit on aligned features and labels
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<i64>) -> Result<()>;

    /// Predict hard labels
    fn predict(&self, x: &Array2<f64>) -> Result<Array1<i64>>;

    /// Sorted distinct training labels (empty before fit)
    fn classes(&self) -> &[i64];

    /// Score capability, fixed once the model is configured
    fn capability(&self) -> Capability;

    /// Class probabilities, columns ordered like [`Classifier::classes`]
    fn predict_proba(&self, _x: &Array2<f64>) -> Result<Array2<f64>> {
        Err(PipelineError::Metric(
            "model does not produce probability estimates".to_string(),
        ))
    }

    /// Decision scores
    fn decision_function(&self, _x: &Array2<f64>) -> Result<Array2<f64>> {
        Err(PipelineError::Metric(
            "model does not produce decision scores".to_string(),
        ))
    }
}

/// Map labels to dense class indices. Returns the sorted classes and the
/// index of every sample's class.
pub(crate) fn encode_classes(y: &Array1<i64>) -> (Vec<i64>, Vec<usize>) {
    let mut classes: Vec<i64> = y.to_vec();
    classes.sort_unstable();
    classes.dedup();
    let encoded = y
        .iter()
        .map(|label| classes.binary_search(label).unwrap_or(0))
        .collect();
    (classes, encoded)
}

/// Shared preconditions for every classifier's fit
pub(crate) fn check_fit_input(x: &Array2<f64>, y: &Array1<i64>) -> Result<()> {
    if x.nrows() != y.len() {
        return Err(PipelineError::Shape {
            expected: format!("y length = {}", x.nrows()),
            actual: format!("y length = {}", y.len()),
        });
    }
    if x.nrows() == 0 {
        return Err(PipelineError::InputContract(
            "cannot fit on an empty training set".to_string(),
        ));
    }
    if x.ncols() == 0 {
        return Err(PipelineError::InputContract(
            "cannot fit on a feature matrix without columns".to_string(),
        ));
    }
    let first = y[0];
    if y.iter().all(|&label| label == first) {
        return Err(PipelineError::InputContract(format!(
            "training labels contain a single class ({}); at least 2 are required",
            first
        )));
    }
    Ok(())
}

/// Arg-max per row, first maximum wins
pub(crate) fn argmax_rows(m: &Array2<f64>) -> Vec<usize> {
    m.rows()
        .into_iter()
        .map(|row| {
            let mut best = 0;
            for (j, &v) in row.iter().enumerate() {
                if v > row[best] {
                    best = j;
                }
            }
            best
        })
        .collect()
}

/// A named model with its scaling policy
pub struct ModelSpec {
    pub name: &'static str,
    pub estimator: Box<dyn Classifier>,
    pub uses_scaling: bool,
}

impl std::fmt::Debug for ModelSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelSpec")
            .field("name", &self.name)
            .field("capability", &self.estimator.capability())
            .field("uses_scaling", &self.uses_scaling)
            .finish()
    }
}

pub const LOGISTIC_REGRESSION: &str = "Logistic Regression";
pub const RANDOM_FOREST: &str = "Random Forest";
pub const SVM: &str = "SVM";

/// The fixed model line-up, in fitting order
pub fn model_specs(config: &TrainingConfig) -> Result<Vec<ModelSpec>> {
    let scale = config.scale_linear_and_kernel_models;
    let svm_config = SVMConfig {
        kernel: config.kernel()?,
        random_state: Some(config.random_state),
        probability: config.enable_probability_estimates,
        ..SVMConfig::default()
    };

    Ok(vec![
        ModelSpec {
            name: LOGISTIC_REGRESSION,
            estimator: Box::new(
                LogisticRegression::new().with_max_iter(config.linear_model_max_iterations),
            ),
            uses_scaling: scale,
        },
        ModelSpec {
            name: RANDOM_FOREST,
            estimator: Box::new(RandomForest::new(100).with_random_state(config.random_state)),
            uses_scaling: false,
        },
        ModelSpec {
            name: SVM,
            estimator: Box::new(SVMClassifier::new(svm_config)),
            uses_scaling: scale,
        },
    ])
}

/// Optional scaler followed by an estimator
pub struct Pipeline {
    name: &'static str,
    scaler: Option<StandardScaler>,
    uses_scaling: bool,
    estimator: Box<dyn Classifier>,
}

impl Pipeline {
    pub fn new(spec: ModelSpec) -> Self {
        Self {
            name: spec.name,
            scaler: None,
            uses_scaling: spec.uses_scaling,
            estimator: spec.estimator,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn capability(&self) -> Capability {
        self.estimator.capability()
    }

    /// Fit the scaler (when used) and the estimator on the training split.
    /// Any error is reported as a fit failure of this model.
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<i64>) -> Result<()> {
        let label = format!("fit_{}", self.name.to_lowercase().replace(' ', "_"));
        timed(&label, || self.fit_inner(x, y))
            .map_err(|e| PipelineError::fit_failure(self.name, e))
    }

    fn fit_inner(&mut self, x: &Array2<f64>, y: &Array1<i64>) -> Result<()> {
        let x_fit = if self.uses_scaling {
            let mut scaler = StandardScaler::for_input(x);
            debug!(model = self.name, centering = scaler.centers(), "Fitting scaler");
            let scaled = scaler.fit_transform(x)?;
            self.scaler = Some(scaler);
            scaled
        } else {
            x.to_owned()
        };
        self.estimator.fit(&x_fit, y)
    }

    fn prepare(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        match &self.scaler {
            Some(scaler) => scaler.transform(x),
            None => Ok(x.to_owned()),
        }
    }

    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<i64>> {
        self.estimator.predict(&self.prepare(x)?)
    }

    pub fn classes(&self) -> &[i64] {
        self.estimator.classes()
    }

    /// Continuous scores according to the model's capability
    pub fn scores(&self, x: &Array2<f64>) -> Result<Option<Scores>> {
        let prepared = self.prepare(x)?;
        match self.capability() {
            Capability::Probabilistic => Ok(Some(Scores::Probabilities(
                self.estimator.predict_proba(&prepared)?,
            ))),
            Capability::ScoreBased => Ok(Some(Scores::Decision(
                self.estimator.decision_function(&prepared)?,
            ))),
            Capability::LabelOnly => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_encode_classes() {
        let y = array![7i64, 3, 7, 5];
        let (classes, encoded) = encode_classes(&y);
        assert_eq!(classes, vec![3, 5, 7]);
        assert_eq!(encoded, vec![2, 0, 2, 1]);
    }

    #[test]
    fn test_single_class_rejected() {
        let x = array![[1.0], [2.0]];
        let y = array![1i64, 1];
        assert!(check_fit_input(&x, &y).is_err());
    }

    #[test]
    fn test_every_model_rejects_empty_feature_set() {
        let x = Array2::<f64>::zeros((10, 0));
        let y = Array1::from_shape_fn(10, |i| (i % 2) as i64);
        assert!(matches!(
            check_fit_input(&x, &y),
            Err(PipelineError::InputContract(_))
        ));
        for spec in model_specs(&TrainingConfig::default()).unwrap() {
            let name = spec.name;
            let mut pipeline = Pipeline::new(spec);
            match pipeline.fit(&x, &y) {
                Err(PipelineError::FitFailure { model, .. }) => assert_eq!(model, name),
                other => panic!("expected fit failure for {}, got {:?}", name, other),
            }
        }
    }

    #[test]
    fn test_argmax_first_wins() {
        let m = array![[0.5, 0.5], [0.2, 0.8]];
        assert_eq!(argmax_rows(&m), vec![0, 1]);
    }

    #[test]
    fn test_model_order_and_capabilities() {
        let specs = model_specs(&TrainingConfig::default()).unwrap();
        let names: Vec<_> = specs.iter().map(|s| s.name).collect();
        assert_eq!(names, vec![LOGISTIC_REGRESSION, RANDOM_FOREST, SVM]);
        assert_eq!(specs[0].estimator.capability(), Capability::Probabilistic);
        assert_eq!(specs[1].estimator.capability(), Capability::Probabilistic);
        assert_eq!(specs[2].estimator.capability(), Capability::ScoreBased);
        assert!(specs[0].uses_scaling);
        assert!(!specs[1].uses_scaling);
        assert!(specs[2].uses_scaling);
    }

    #[test]
    fn test_svm_probabilistic_when_enabled() {
        let config = TrainingConfig::default().with_probability_estimates(true);
        let specs = model_specs(&config).unwrap();
        assert_eq!(specs[2].estimator.capability(), Capability::Probabilistic);
    }

    #[test]
    fn test_scaling_disabled() {
        let specs = model_specs(&TrainingConfig::default().with_scaling(false)).unwrap();
        assert!(specs.iter().all(|s| !s.uses_scaling));
    }

    #[test]
    fn test_pipeline_fit_failure_names_model() {
        let specs = model_specs(&TrainingConfig::default()).unwrap();
        let mut pipeline = Pipeline::new(specs.into_iter().next().unwrap());
        let x = array![[1.0, 2.0], [3.0, 4.0]];
        let y = array![0i64, 0];
        match pipeline.fit(&x, &y) {
            Err(PipelineError::FitFailure { model, .. }) => assert_eq!(model, LOGISTIC_REGRESSION),
            other => panic!("expected fit failure, got {:?}", other),
        }
    }
}
