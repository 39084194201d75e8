//! Progress reporting for training runs

use super::metrics::{MetricValue, ACCURACY, F1_SCORE};
use colored::*;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::info;

/// Receives progress events from [`train_models_with_observer`](super::train_models_with_observer).
/// Every method has an empty default so observers only implement what they need.
pub trait TrainingObserver {
    /// The train/test split is ready
    fn on_split(&mut self, _n_train: usize, _n_test: usize, _elapsed: Duration) {}

    /// Model `index` (0-based) of `total` starts fitting
    fn on_model_start(&mut self, _index: usize, _total: usize, _name: &str) {}

    /// Model finished fitting and evaluation
    fn on_model_finished(
        &mut self,
        _index: usize,
        _total: usize,
        _name: &str,
        _metrics: &BTreeMap<String, MetricValue>,
        _elapsed: Duration,
    ) {
    }
}

fn scalar(metrics: &BTreeMap<String, MetricValue>, key: &str) -> f64 {
    metrics
        .get(key)
        .and_then(MetricValue::as_scalar)
        .unwrap_or(f64::NAN)
}

/// Emits progress as tracing events
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl TrainingObserver for TracingObserver {
    fn on_split(&mut self, n_train: usize, n_test: usize, elapsed: Duration) {
        info!(
            n_train,
            n_test,
            "data_split took {:.3}s",
            elapsed.as_secs_f64()
        );
    }

    fn on_model_start(&mut self, index: usize, total: usize, name: &str) {
        info!(model = name, "Fitting model {}/{}: {}", index + 1, total, name);
    }

    fn on_model_finished(
        &mut self,
        _index: usize,
        _total: usize,
        name: &str,
        metrics: &BTreeMap<String, MetricValue>,
        elapsed: Duration,
    ) {
        info!(
            model = name,
            elapsed_secs = elapsed.as_secs_f64(),
            "Completed {}: Acc={:.3} F1={:.3}",
            name,
            scalar(metrics, ACCURACY),
            scalar(metrics, F1_SCORE)
        );
    }
}

/// Colored per-model progress lines on stdout, plus the tracing events
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleProgress {
    inner: TracingObserver,
}

impl ConsoleProgress {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TrainingObserver for ConsoleProgress {
    fn on_split(&mut self, n_train: usize, n_test: usize, elapsed: Duration) {
        self.inner.on_split(n_train, n_test, elapsed);
        println!(
            "  {} {} train / {} test rows {}",
            "›".truecolor(120, 170, 255),
            n_train,
            n_test,
            format!("({:.3}s)", elapsed.as_secs_f64()).truecolor(100, 100, 100)
        );
    }

    fn on_model_start(&mut self, index: usize, total: usize, name: &str) {
        self.inner.on_model_start(index, total, name);
        println!(
            "  {} [{}/{}] Training {}",
            "›".truecolor(120, 170, 255),
            index + 1,
            total,
            name.cyan()
        );
    }

    fn on_model_finished(
        &mut self,
        index: usize,
        total: usize,
        name: &str,
        metrics: &BTreeMap<String, MetricValue>,
        elapsed: Duration,
    ) {
        self.inner
            .on_model_finished(index, total, name, metrics, elapsed);
        println!(
            "  {} [{}/{}] {} acc {:.3} f1 {:.3} {}",
            "✓".truecolor(100, 210, 120),
            index + 1,
            total,
            name,
            scalar(metrics, ACCURACY),
            scalar(metrics, F1_SCORE),
            format!("({:.3}s)", elapsed.as_secs_f64()).truecolor(100, 100, 100)
        );
    }
}
