//! Integration test: CSV ingestion, profiling and encoding feeding the trainer

use ml_autopipeline::data::{describe, encode_features, encode_labels, load_table, CsvLoader};
use ml_autopipeline::error::PipelineError;
use ml_autopipeline::training::{train_models, TrainingConfig};
use std::io::Write;
use tempfile::NamedTempFile;

fn write_csv(contents: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

fn churn_csv() -> String {
    let mut csv = String::from("tenure,plan,monthly,churned\n");
    for i in 0..24 {
        let plan = ["basic", "pro", "team"][i % 3];
        let churned = if i % 2 == 0 { "yes" } else { "no" };
        let monthly = if i % 2 == 0 { 20.0 + i as f64 } else { 80.0 + i as f64 };
        csv.push_str(&format!("{},{},{:.1},{}\n", i + 1, plan, monthly, churned));
    }
    csv
}

#[test]
fn test_load_and_describe() {
    let file = write_csv("a,b,label\n1,x,0\n2,,1\n3,y,0\n");
    let df = load_table(file.path()).unwrap();
    let report = describe(&df).unwrap();

    assert_eq!(report.shape, (3, 3));
    assert_eq!(report.columns, vec!["a", "b", "label"]);
    assert_eq!(report.missing_counts["b"], 1);
    assert_eq!(report.total_missing(), 1);
    assert_eq!(report.sample_rows.len(), 3);
}

#[test]
fn test_missing_file() {
    let err = load_table("/nonexistent/data.csv").unwrap_err();
    assert!(matches!(err, PipelineError::NotFound(_)));
}

#[test]
fn test_custom_separator() {
    let file = write_csv("a;label\n1;0\n2;1\n");
    let df = CsvLoader::new().with_separator(b';').load(file.path()).unwrap();
    assert_eq!(df.width(), 2);
}

#[test]
fn test_encoded_table_trains() {
    let file = write_csv(&churn_csv());
    let df = load_table(file.path()).unwrap();

    let features = encode_features(&df, "churned").unwrap();
    assert_eq!(
        features.feature_names,
        vec!["tenure", "plan_basic", "plan_pro", "plan_team", "monthly"]
    );
    assert_eq!(features.x.dim(), (24, 5));

    let labels = encode_labels(&df, "churned").unwrap();
    assert_eq!(labels.display(0), "no");
    assert_eq!(labels.display(1), "yes");

    let report = train_models(&features.x, &labels.y, &TrainingConfig::default()).unwrap();
    assert_eq!(report.len(), 3);
}

#[test]
fn test_one_hot_rows_have_single_indicator() {
    let file = write_csv(&churn_csv());
    let df = load_table(file.path()).unwrap();
    let features = encode_features(&df, "churned").unwrap();
    for row in features.x.rows() {
        let hot: f64 = row.iter().skip(1).take(3).sum();
        assert_eq!(hot, 1.0);
    }
}
