//! Integration test: training pipeline end-to-end

use ml_autopipeline::error::PipelineError;
use ml_autopipeline::training::metrics::{
    ACCURACY, CONFUSION_MATRIX, F1_SCORE, PRECISION, RECALL, ROC_AUC, ROC_AUC_OVR_WEIGHTED,
};
use ml_autopipeline::training::{
    model_specs, train_models, train_test_split, Pipeline, TrainingConfig, LOGISTIC_REGRESSION,
    RANDOM_FOREST, SVM,
};
use ndarray::{array, Array1, Array2};

fn six_rows() -> (Array2<f64>, Array1<i64>) {
    (
        array![[1.0, 5.0], [2.0, 4.0], [3.0, 3.0], [4.0, 2.0], [5.0, 1.0], [6.0, 0.0]],
        array![0i64, 1, 0, 1, 0, 1],
    )
}

/// Two well separated blobs, `per_class` rows each
fn binary_blobs(per_class: usize) -> (Array2<f64>, Array1<i64>) {
    let n = per_class * 2;
    let x = Array2::from_shape_fn((n, 3), |(i, j)| {
        let class = (i % 2) as f64;
        let jitter = ((i * 7 + j * 3) % 11) as f64 / 11.0;
        class * 4.0 + jitter + j as f64 * 0.1
    });
    let y = Array1::from_shape_fn(n, |i| (i % 2) as i64);
    (x, y)
}

fn three_blobs(per_class: usize) -> (Array2<f64>, Array1<i64>) {
    let n = per_class * 3;
    let x = Array2::from_shape_fn((n, 2), |(i, j)| {
        let class = (i % 3) as f64;
        let jitter = ((i * 5 + j * 13) % 7) as f64 / 7.0;
        if j == 0 { class * 5.0 + jitter } else { (2.0 - class) * 3.0 + jitter }
    });
    let y = Array1::from_shape_fn(n, |i| (i % 3) as i64);
    (x, y)
}

#[test]
fn test_six_row_report_has_three_models() {
    let (x, y) = six_rows();
    let report = train_models(&x, &y, &TrainingConfig::default()).unwrap();

    assert_eq!(report.len(), 3);
    assert_eq!(report.names(), vec![LOGISTIC_REGRESSION, RANDOM_FOREST, SVM]);
    for model in report.iter() {
        for key in [ACCURACY, PRECISION, RECALL, F1_SCORE] {
            let value = model.metrics[key].as_scalar().unwrap();
            assert!((0.0..=1.0).contains(&value), "{} {} = {}", model.name, key, value);
        }
        assert!(!model.metrics.contains_key(CONFUSION_MATRIX));
    }
}

#[test]
fn test_extended_confusion_rows_match_test_counts() {
    let (x, y) = binary_blobs(10);
    let config = TrainingConfig::default().with_extended_metrics(true);
    let report = train_models(&x, &y, &config).unwrap();

    // stratified 30% of 10 + 10 rows holds out 3 of each class
    for model in report.iter() {
        let matrix = model.metrics[CONFUSION_MATRIX].as_matrix().unwrap();
        assert_eq!(matrix.len(), 2);
        let row_sums: Vec<u64> = matrix.iter().map(|r| r.iter().sum()).collect();
        assert_eq!(row_sums, vec![3, 3], "{}", model.name);
    }

    // probabilistic models always report a binary AUC
    for name in [LOGISTIC_REGRESSION, RANDOM_FOREST] {
        let auc = report.get(name).unwrap()[ROC_AUC].as_scalar().unwrap();
        assert!((0.0..=1.0).contains(&auc));
    }
    // SVM falls back to decision scores
    assert!(report.get(SVM).unwrap().contains_key(ROC_AUC));
}

#[test]
fn test_separable_data_is_learned() {
    let (x, y) = binary_blobs(20);
    let report = train_models(&x, &y, &TrainingConfig::default()).unwrap();
    for model in report.iter() {
        let acc = model.metrics[ACCURACY].as_scalar().unwrap();
        assert!(acc >= 0.9, "{} accuracy {}", model.name, acc);
    }
}

#[test]
fn test_multiclass_auc_needs_probabilities() {
    let (x, y) = three_blobs(10);
    let config = TrainingConfig::default().with_extended_metrics(true);
    let report = train_models(&x, &y, &config).unwrap();

    assert!(report.get(LOGISTIC_REGRESSION).unwrap().contains_key(ROC_AUC_OVR_WEIGHTED));
    assert!(report.get(RANDOM_FOREST).unwrap().contains_key(ROC_AUC_OVR_WEIGHTED));
    // decision scores alone do not give a multiclass AUC
    let svm = report.get(SVM).unwrap();
    assert!(!svm.contains_key(ROC_AUC_OVR_WEIGHTED));
    assert_eq!(svm[CONFUSION_MATRIX].as_matrix().unwrap().len(), 3);
}

#[test]
fn test_svm_probabilities_enable_multiclass_auc() {
    let (x, y) = three_blobs(10);
    let config = TrainingConfig::default()
        .with_extended_metrics(true)
        .with_probability_estimates(true);
    let report = train_models(&x, &y, &config).unwrap();
    assert!(report.get(SVM).unwrap().contains_key(ROC_AUC_OVR_WEIGHTED));
}

#[test]
fn test_stratified_single_member_class_fails() {
    let x = Array2::from_shape_fn((7, 2), |(i, j)| (i + j) as f64);
    let y = array![0i64, 0, 0, 1, 1, 1, 2];
    let err = train_models(&x, &y, &TrainingConfig::default()).unwrap_err();
    assert!(matches!(err, PipelineError::Split(_)));
}

#[test]
fn test_unstratified_split_accepts_single_member_class() {
    let x = Array2::from_shape_fn((7, 2), |(i, j)| (i + j) as f64);
    let y = array![0i64, 0, 0, 1, 1, 1, 2];
    let split = train_test_split(&x, &y, 0.3, 42, false).unwrap();
    assert_eq!(split.y_train.len() + split.y_test.len(), 7);
}

#[test]
fn test_fit_failure_names_model() {
    let x = Array2::from_shape_fn((4, 2), |(i, j)| (i * j) as f64);
    let y = array![1i64, 1, 1, 1];
    let spec = model_specs(&TrainingConfig::default()).unwrap().remove(0);
    let mut pipeline = Pipeline::new(spec);

    let err = pipeline.fit(&x, &y).unwrap_err();
    match err {
        PipelineError::FitFailure { model, .. } => assert_eq!(model, LOGISTIC_REGRESSION),
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn test_feature_matrix_without_columns_is_an_error() {
    let x = Array2::<f64>::zeros((10, 0));
    let y = Array1::from_shape_fn(10, |i| (i % 2) as i64);
    let err = train_models(&x, &y, &TrainingConfig::default()).unwrap_err();
    match err {
        PipelineError::FitFailure { model, reason } => {
            assert_eq!(model, LOGISTIC_REGRESSION);
            assert!(reason.contains("without columns"));
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn test_invalid_test_size_rejected() {
    let (x, y) = six_rows();
    let config = TrainingConfig::default().with_test_size(1.0);
    let err = train_models(&x, &y, &config).unwrap_err();
    assert!(matches!(err, PipelineError::Configuration { ref field, .. } if field == "test_size"));
}

#[test]
fn test_misaligned_input_rejected() {
    let x = Array2::<f64>::zeros((5, 2));
    let y = array![0i64, 1, 0];
    assert!(matches!(
        train_models(&x, &y, &TrainingConfig::default()),
        Err(PipelineError::InputContract(_))
    ));
}

#[test]
fn test_same_seed_same_report() {
    let (x, y) = binary_blobs(12);
    let config = TrainingConfig::default().with_extended_metrics(true);
    let a = train_models(&x, &y, &config).unwrap().to_json_pretty().unwrap();
    let b = train_models(&x, &y, &config).unwrap().to_json_pretty().unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_unscaled_and_linear_kernel_run() {
    let (x, y) = binary_blobs(10);
    let config = TrainingConfig::default()
        .with_scaling(false)
        .with_kernel("linear")
        .with_stratify(false);
    let report = train_models(&x, &y, &config).unwrap();
    assert_eq!(report.len(), 3);
}
