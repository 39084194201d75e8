//! ml-autopipeline - automated tabular classification
//!
//! Profiles a dataset, checks the label balance, optionally rebalances the
//! classes and evaluates a fixed line-up of baseline classifiers.
//!
//! # Modules
//!
//! ## Core
//! - [`sampling`] - Imbalance checks and the adaptive rebalancing policy (SMOTE, replication)
//! - [`training`] - Train/test split, baseline models and evaluation metrics
//! - [`preprocessing`] - Feature standardization
//!
//! ## Collaborators
//! - [`data`] - CSV loading, descriptive reports and feature/label encoding
//! - [`config`] - Config files and CLI merging
//! - [`logging`] - Tracing subscriber setup
//! - [`cli`] - Command-line driver
//!
//! # Example
//!
//! ```no_run
//! use ml_autopipeline::sampling::{apply_rebalance, check_label_imbalance};
//! use ml_autopipeline::training::{train_models, TrainingConfig};
//! use ndarray::array;
//!
//! let x = array![[1.0, 5.0], [2.0, 4.0], [3.0, 3.0], [4.0, 2.0], [5.0, 1.0], [6.0, 0.0]];
//! let y = array![0i64, 1, 0, 1, 0, 1];
//!
//! let verdict = check_label_imbalance(&y)?;
//! let (x, y) = if verdict.is_imbalanced {
//!     let balanced = apply_rebalance(&x, &y)?;
//!     (balanced.x, balanced.y)
//! } else {
//!     (x, y)
//! };
//!
//! let report = train_models(&x, &y, &TrainingConfig::default())?;
//! for name in report.names() {
//!     println!("{}", name);
//! }
//! # Ok::<(), ml_autopipeline::error::PipelineError>(())
//! ```

pub mod error;

pub mod preprocessing;
pub mod sampling;
pub mod training;

pub mod config;
pub mod data;
pub mod logging;
pub mod utils;

pub mod cli;

pub use error::{PipelineError, Result};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::error::{PipelineError, Result};

    pub use crate::sampling::{
        apply_rebalance, check_imbalance, check_label_imbalance, ImbalanceVerdict,
        RebalanceResult, RebalanceStrategy,
    };

    pub use crate::training::{
        train_models, train_models_with_observer, MetricValue, MetricsReport, TrainingConfig,
        TrainingObserver,
    };

    pub use crate::config::{load_config, merge_config, PipelineSettings, Precedence};
    pub use crate::data::{describe, encode_features, encode_labels, load_table};
    pub use crate::logging::LogSettings;
}
