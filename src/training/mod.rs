//! Model training module
//!
//! Trains a fixed line-up of baseline classifiers and evaluates them on a
//! held-out split:
//! - Logistic Regression (multinomial, gradient descent)
//! - Random Forest (bootstrap-aggregated Gini trees)
//! - Support Vector Machine (SMO, one-vs-rest for more than two classes)
//!
//! Linear and kernel models can be preceded by a standard scaler fitted on the
//! training split only.

mod config;
mod engine;
mod models;
mod observer;
pub mod decision_tree;
pub mod linear_models;
pub mod metrics;
pub mod random_forest;
pub mod split;
pub mod svm;

pub use config::{KernelType, TrainingConfig};
pub use engine::{train_models, train_models_with_observer, MetricsReport, ModelReport};
pub use metrics::MetricValue;
pub use models::{model_specs, Capability, Classifier, ModelSpec, Pipeline, Scores};
pub use models::{LOGISTIC_REGRESSION, RANDOM_FOREST, SVM};
pub use observer::{ConsoleProgress, TracingObserver, TrainingObserver};
pub use split::{train_test_split, DataSplit};
pub use decision_tree::{DecisionTree, TreeNode};
pub use linear_models::LogisticRegression;
pub use random_forest::RandomForest;
pub use svm::{SVMClassifier, SVMConfig};
