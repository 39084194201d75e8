//! Training engine: split, fit every model in order, evaluate

use super::config::TrainingConfig;
use super::metrics::{evaluate, MetricValue};
use super::models::{model_specs, Pipeline};
use super::observer::{ConsoleProgress, TracingObserver, TrainingObserver};
use super::split::train_test_split;
use crate::error::Result;
use crate::utils::measure;
use ndarray::{Array1, Array2};
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, info};

/// Metrics of one evaluated model
#[derive(Debug, Clone)]
pub struct ModelReport {
    pub name: String,
    pub metrics: BTreeMap<String, MetricValue>,
    pub fit_time: Duration,
}

/// Per-model metrics in fitting order.
///
/// Serializes as `{model_name: {metric_name: value}}`.
#[derive(Debug, Clone, Default)]
pub struct MetricsReport {
    models: Vec<ModelReport>,
}

impl MetricsReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, report: ModelReport) {
        self.models.push(report);
    }

    /// Metrics for a model by display name
    pub fn get(&self, name: &str) -> Option<&BTreeMap<String, MetricValue>> {
        self.models
            .iter()
            .find(|m| m.name == name)
            .map(|m| &m.metrics)
    }

    /// Model names in fitting order
    pub fn names(&self) -> Vec<&str> {
        self.models.iter().map(|m| m.name.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ModelReport> {
        self.models.iter()
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl Serialize for MetricsReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.models.len()))?;
        for model in &self.models {
            map.serialize_entry(&model.name, &model.metrics)?;
        }
        map.end()
    }
}

/// Train and evaluate the fixed model line-up.
///
/// Progress goes to the tracing subscriber, and also to stdout when
/// `config.show_progress` is set.
pub fn train_models(x: &Array2<f64>, y: &Array1<i64>, config: &TrainingConfig) -> Result<MetricsReport> {
    if config.show_progress {
        train_models_with_observer(x, y, config, &mut ConsoleProgress::new())
    } else {
        train_models_with_observer(x, y, config, &mut TracingObserver)
    }
}

/// [`train_models`] with an explicit progress observer
pub fn train_models_with_observer(
    x: &Array2<f64>,
    y: &Array1<i64>,
    config: &TrainingConfig,
    observer: &mut dyn TrainingObserver,
) -> Result<MetricsReport> {
    config.validate()?;
    info!(
        test_size = config.test_size,
        stratify = config.stratify,
        scale_linear_models = config.scale_linear_and_kernel_models,
        extended_metrics = config.extended_metrics,
        "Starting training pipeline"
    );

    let (split, split_time) = measure(|| {
        train_test_split(x, y, config.test_size, config.random_state, config.stratify)
    });
    let split = split?;
    observer.on_split(split.y_train.len(), split.y_test.len(), split_time);
    debug!(
        train_shape = ?split.x_train.dim(),
        test_shape = ?split.x_test.dim(),
        "Split ready"
    );

    let specs = model_specs(config)?;
    let total = specs.len();
    let mut report = MetricsReport::new();

    for (index, spec) in specs.into_iter().enumerate() {
        let mut pipeline = Pipeline::new(spec);
        let name = pipeline.name();
        observer.on_model_start(index, total, name);

        let (metrics, elapsed) = measure(|| -> Result<BTreeMap<String, MetricValue>> {
            pipeline.fit(&split.x_train, &split.y_train)?;
            let predictions = pipeline.predict(&split.x_test)?;

            let scores = if config.extended_metrics {
                pipeline.scores(&split.x_test).unwrap_or_else(|e| {
                    debug!(model = name, error = %e, "Scores unavailable");
                    None
                })
            } else {
                None
            };

            evaluate(
                &split.y_test,
                &predictions,
                scores.as_ref(),
                pipeline.classes(),
                config.extended_metrics,
            )
        });
        let metrics = metrics?;

        observer.on_model_finished(index, total, name, &metrics, elapsed);
        report.push(ModelReport {
            name: name.to_string(),
            metrics,
            fit_time: elapsed,
        });
    }

    info!(models = report.len(), "Training pipeline complete");
    Ok(report)
}
