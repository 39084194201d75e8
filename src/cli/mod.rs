//! ml-autopipeline CLI
//!
//! Single command: profile a CSV, check the label balance, optionally
//! rebalance, then train and evaluate the baseline models.

use anyhow::Context;
use clap::Parser;
use colored::*;
use serde_json::{json, Value};
use std::path::PathBuf;

use crate::config::{load_config, merge_config, ConfigMap, PipelineSettings, Precedence};
use crate::data::{describe, encode_features, encode_labels, load_table, DatasetReport};
use crate::sampling::{apply_rebalance, check_imbalance, check_label_imbalance, ImbalanceVerdict};
use crate::training::{train_models, MetricValue, MetricsReport};
use crate::utils::{measure, timed};

// ─── Styling helpers ───────────────────────────────────────────────────────────

fn dim(s: &str) -> ColoredString { s.truecolor(100, 100, 100) }
fn accent(s: &str) -> ColoredString { s.truecolor(120, 170, 255) }
fn muted(s: &str) -> ColoredString { s.truecolor(140, 140, 140) }
fn ok(s: &str) -> ColoredString { s.truecolor(100, 210, 120) }

fn kv(key: &str, val: &str) -> String {
    format!("{} {}", muted(key), val.white())
}

fn step_run(msg: &str) {
    print!("  {} {}... ", accent("›"), msg);
}

fn step_done(detail: &str) {
    println!("{} {}", ok("done"), dim(detail));
}

fn section(title: &str) {
    println!();
    println!("  {}", title.white().bold());
    println!("  {}", dim(&"─".repeat(56)));
}

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser, Debug, Default)]
#[command(name = "ml-autopipeline")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Profile a tabular dataset and evaluate baseline classifiers")]
#[command(long_about = None)]
pub struct Cli {
    /// Input CSV file
    #[arg(short, long)]
    pub file: Option<PathBuf>,

    /// Target column name
    #[arg(short, long)]
    pub target: Option<String>,

    /// Rebalance the classes before training when they are imbalanced
    #[arg(long)]
    pub apply_smote: bool,

    /// YAML or JSON settings file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Which source wins when both set a key (cli, file)
    #[arg(long, default_value = "cli")]
    pub precedence: Precedence,

    /// Fraction of rows held out for evaluation
    #[arg(long)]
    pub test_size: Option<f64>,

    /// Seed for the split and the models
    #[arg(long)]
    pub random_state: Option<u64>,

    /// Split without preserving class proportions
    #[arg(long)]
    pub no_stratify: bool,

    /// Iteration cap for logistic regression
    #[arg(long)]
    pub max_iter: Option<usize>,

    /// Skip feature standardization for the linear and kernel models
    #[arg(long)]
    pub no_scaling: bool,

    /// SVM kernel (linear, poly, rbf, sigmoid)
    #[arg(long)]
    pub kernel: Option<String>,

    /// Calibrate SVM scores into probabilities
    #[arg(long)]
    pub svm_probability: bool,

    /// Print per-model progress lines
    #[arg(long)]
    pub show_progress: bool,

    /// Add confusion matrix and ROC-AUC to the report
    #[arg(long)]
    pub extended_metrics: bool,

    /// Log level or filter directive
    #[arg(long)]
    pub log_level: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub log_json: bool,

    /// Append logs to this file instead of stderr
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Write the metrics report to this JSON file
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// `true` when set, null otherwise, so an unset switch never overrides a file value
fn flag(set: bool) -> Value {
    if set { Value::Bool(true) } else { Value::Null }
}

impl Cli {
    /// Flags as a settings mapping; anything not given on the command line is null
    pub fn to_config_map(&self) -> ConfigMap {
        let value = json!({
            "file": self.file,
            "target": self.target,
            "apply_smote": flag(self.apply_smote),
            "output": self.output,
            "test_size": self.test_size,
            "random_state": self.random_state,
            "stratify": if self.no_stratify { Value::Bool(false) } else { Value::Null },
            "linear_model_max_iterations": self.max_iter,
            "scale_linear_and_kernel_models": if self.no_scaling { Value::Bool(false) } else { Value::Null },
            "kernel_type": self.kernel,
            "enable_probability_estimates": flag(self.svm_probability),
            "show_progress": flag(self.show_progress),
            "extended_metrics": flag(self.extended_metrics),
            "log_level": self.log_level,
            "log_json": flag(self.log_json),
            "log_file": self.log_file,
        });
        match value {
            Value::Object(map) => map,
            _ => ConfigMap::new(),
        }
    }

    /// Merge the flags with the config file, if any
    pub fn resolve(&self) -> anyhow::Result<PipelineSettings> {
        let file_map = match &self.config {
            Some(path) => load_config(path)
                .with_context(|| format!("loading config {}", path.display()))?,
            None => ConfigMap::new(),
        };
        let merged = merge_config(&self.to_config_map(), &file_map, self.precedence);
        Ok(PipelineSettings::from_map(merged)?)
    }
}

// ─── Output ────────────────────────────────────────────────────────────────────

fn print_dataset_report(report: &DatasetReport) {
    section("Dataset");
    println!("  {}", kv("Shape", &format!("{} rows × {} cols", report.shape.0, report.shape.1)));
    println!("  {}", kv("Columns", &report.columns.join(", ")));
    println!("  {}", kv("Missing", &report.total_missing().to_string()));
    println!();
    println!("  {:<24} {:<12} {:>8}", muted("Column"), muted("Type"), muted("Missing"));
    for column in &report.columns {
        let dtype = report.dtypes.get(column).map(String::as_str).unwrap_or("?");
        let missing = report.missing_counts.get(column).copied().unwrap_or(0);
        println!("  {:<24} {:<12} {:>8}", column, dim(dtype), missing);
    }
    if !report.sample_rows.is_empty() {
        println!();
        println!("  {}", muted("Head"));
        for row in &report.sample_rows {
            let cells: Vec<String> = row.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
            println!("  {}", dim(&cells.join("  ")));
        }
    }
}

fn print_verdict(verdict: &ImbalanceVerdict) {
    section("Class balance");
    println!("  {}", kv("Distribution", &verdict.distribution.to_string()));
    println!("  {}", kv("Ratio", &format!("{:.2}", verdict.ratio)));
    if verdict.is_imbalanced {
        println!("  {} {}", "!".yellow().bold(), "Dataset is imbalanced".yellow());
    } else {
        println!("  {} {}", ok("✓"), "Classes are balanced");
    }
}

fn print_metrics(report: &MetricsReport) {
    section("Results");
    for model in report.iter() {
        println!();
        println!(
            "  {} {}",
            model.name.white().bold(),
            dim(&format!("({:.3}s)", model.fit_time.as_secs_f64()))
        );
        for (key, value) in &model.metrics {
            match value {
                MetricValue::Scalar(v) => println!("    {:<22} {:.4}", muted(key), v),
                MetricValue::Matrix(rows) => {
                    println!("    {}", muted(key));
                    for row in rows {
                        let cells: Vec<String> = row.iter().map(|c| format!("{:>6}", c)).collect();
                        println!("    {}", cells.join(" "));
                    }
                }
            }
        }
    }
    println!();
}

// ─── Pipeline ──────────────────────────────────────────────────────────────────

/// Run the full pipeline with resolved settings
pub fn run_pipeline(settings: &PipelineSettings) -> anyhow::Result<MetricsReport> {
    let file = settings.require_file()?;
    let target = settings.require_target()?;

    section("Load");
    step_run(&format!("Reading {}", file.display()));
    let (df, elapsed) = measure(|| timed("load_table", || load_table(file)));
    let df = df.with_context(|| format!("reading {}", file.display()))?;
    step_done(&format!("{} rows × {} cols in {:?}", df.height(), df.width(), elapsed));

    print_dataset_report(&describe(&df)?);

    let verdict = check_imbalance(&df, target)?;
    print_verdict(&verdict);

    section("Encode");
    step_run("One-hot encoding features");
    let features = encode_features(&df, target)?;
    let labels = encode_labels(&df, target)?;
    step_done(&format!("{} features", features.feature_names.len()));

    let (x, y) = if verdict.is_imbalanced && settings.apply_smote {
        step_run("Rebalancing classes");
        let rebalanced = apply_rebalance(&features.x, &labels.y)?;
        step_done(&rebalanced.strategy.to_string());
        let after = check_label_imbalance(&rebalanced.y)?;
        let counts: Vec<String> = after
            .distribution
            .iter()
            .map(|(code, count)| match code.parse::<i64>() {
                Ok(code) => format!("{}: {}", labels.display(code), count),
                Err(_) => format!("{}: {}", code, count),
            })
            .collect();
        println!("  {}", kv("New distribution", &format!("{{{}}}", counts.join(", "))));
        (rebalanced.x, rebalanced.y)
    } else {
        (features.x, labels.y)
    };

    section("Train");
    let report = train_models(&x, &y, &settings.training)?;
    print_metrics(&report);

    if let Some(path) = &settings.output {
        std::fs::write(path, report.to_json_pretty()?)
            .with_context(|| format!("writing report to {}", path.display()))?;
        println!("  {} {}", ok("✓"), kv("Report", &path.display().to_string()));
    }

    Ok(report)
}

/// Resolve settings, set up logging and run
pub fn run(cli: &Cli) -> anyhow::Result<()> {
    let settings = cli.resolve()?;
    crate::logging::configure(&settings.logging)?;
    run_pipeline(&settings)?;
    Ok(())
}
