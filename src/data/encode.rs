//! Table → numeric feature matrix and label vector

use crate::error::{PipelineError, Result};
use ndarray::{Array1, Array2};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::debug;

/// Numeric features with the name of every column
#[derive(Debug, Clone)]
pub struct EncodedFeatures {
    pub x: Array2<f64>,
    pub feature_names: Vec<String>,
}

/// Encoded labels and the display name of each code
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelEncoding {
    pub y: Array1<i64>,
    /// (code, original value), sorted by code
    pub names: Vec<(i64, String)>,
}

impl LabelEncoding {
    /// Original value for a code
    pub fn display(&self, code: i64) -> String {
        self.names
            .iter()
            .find(|(c, _)| *c == code)
            .map(|(_, name)| name.clone())
            .unwrap_or_else(|| code.to_string())
    }
}

fn is_categorical(dtype: &DataType) -> bool {
    !(dtype.is_integer() || dtype.is_float() || matches!(dtype, DataType::Boolean))
}

fn numeric_column(series: &Series) -> Result<Vec<f64>> {
    if series.null_count() > 0 {
        return Err(PipelineError::InputContract(format!(
            "feature column '{}' has {} missing values; impute or drop them first",
            series.name(),
            series.null_count()
        )));
    }
    let values = series.cast(&DataType::Float64)?;
    Ok(values.f64()?.into_no_null_iter().collect())
}

/// One indicator column per distinct value, in sorted order. Nulls get all
/// zeros.
fn one_hot(series: &Series) -> Result<Vec<(String, Vec<f64>)>> {
    let strings = series.cast(&DataType::String)?;
    let values: Vec<Option<&str>> = strings.str()?.into_iter().collect();
    let categories: BTreeSet<&str> = values.iter().flatten().copied().collect();

    Ok(categories
        .into_iter()
        .map(|category| {
            let indicator = values
                .iter()
                .map(|v| if *v == Some(category) { 1.0 } else { 0.0 })
                .collect();
            (format!("{}_{}", series.name(), category), indicator)
        })
        .collect())
}

/// Encode every column except `target` as numeric features: numbers are cast
/// to f64, booleans to 0/1, and anything else is one-hot expanded.
pub fn encode_features(df: &DataFrame, target: &str) -> Result<EncodedFeatures> {
    if df.column(target).is_err() {
        return Err(PipelineError::InputContract(format!(
            "target column '{}' not found",
            target
        )));
    }

    let mut feature_names = Vec::new();
    let mut columns: Vec<Vec<f64>> = Vec::new();

    for column in df.get_columns() {
        if column.name().as_str() == target {
            continue;
        }
        let series = column.as_materialized_series();
        if is_categorical(series.dtype()) {
            for (name, values) in one_hot(series)? {
                feature_names.push(name);
                columns.push(values);
            }
        } else {
            feature_names.push(series.name().to_string());
            columns.push(numeric_column(series)?);
        }
    }

    if columns.is_empty() {
        return Err(PipelineError::InputContract(
            "table has no feature columns besides the target".to_string(),
        ));
    }

    let n_rows = df.height();
    let x = Array2::from_shape_fn((n_rows, columns.len()), |(i, j)| columns[j][i]);
    debug!(rows = n_rows, features = feature_names.len(), "Encoded features");

    Ok(EncodedFeatures { x, feature_names })
}

/// Encode the target column. Integer labels are kept as they are; any other
/// type is mapped to codes 0.. in sorted order of its values.
pub fn encode_labels(df: &DataFrame, target: &str) -> Result<LabelEncoding> {
    let column = df.column(target).map_err(|_| {
        PipelineError::InputContract(format!("target column '{}' not found", target))
    })?;
    let series = column.as_materialized_series();
    if series.null_count() > 0 {
        return Err(PipelineError::InputContract(format!(
            "target column '{}' has {} missing values",
            target,
            series.null_count()
        )));
    }

    let dtype = series.dtype().clone();
    if dtype.is_integer() {
        let values: Vec<i64> = series
            .cast(&DataType::Int64)?
            .i64()?
            .into_no_null_iter()
            .collect();
        let distinct: BTreeSet<i64> = values.iter().copied().collect();
        return Ok(LabelEncoding {
            y: Array1::from_vec(values),
            names: distinct.into_iter().map(|v| (v, v.to_string())).collect(),
        });
    }

    if dtype.is_float() || matches!(dtype, DataType::Boolean) {
        let values: Vec<f64> = series
            .cast(&DataType::Float64)?
            .f64()?
            .into_no_null_iter()
            .collect();
        let mut distinct = values.clone();
        distinct.sort_by(|a, b| a.total_cmp(b));
        distinct.dedup();
        let codes = values
            .iter()
            .map(|v| distinct.iter().position(|d| d == v).unwrap_or(0) as i64)
            .collect();
        let names = if matches!(dtype, DataType::Boolean) {
            distinct
                .iter()
                .enumerate()
                .map(|(i, &v)| (i as i64, (v != 0.0).to_string()))
                .collect()
        } else {
            distinct
                .iter()
                .enumerate()
                .map(|(i, v)| (i as i64, v.to_string()))
                .collect()
        };
        return Ok(LabelEncoding {
            y: Array1::from_vec(codes),
            names,
        });
    }

    let strings = series.cast(&DataType::String)?;
    let values: Vec<&str> = strings.str()?.into_no_null_iter().collect();
    let distinct: Vec<&str> = values
        .iter()
        .copied()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let codes = values
        .iter()
        .map(|v| distinct.binary_search(v).unwrap_or(0) as i64)
        .collect();

    Ok(LabelEncoding {
        y: Array1::from_vec(codes),
        names: distinct
            .iter()
            .enumerate()
            .map(|(i, v)| (i as i64, v.to_string()))
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_hot_and_numeric() {
        let df = df!(
            "size" => &[1.0f64, 2.0, 3.0],
            "color" => &[Some("red"), Some("blue"), None],
            "flag" => &[true, false, true],
            "target" => &[0i64, 1, 0]
        )
        .unwrap();

        let encoded = encode_features(&df, "target").unwrap();
        assert_eq!(
            encoded.feature_names,
            vec!["size", "color_blue", "color_red", "flag"]
        );
        assert_eq!(encoded.x.dim(), (3, 4));
        assert_eq!(encoded.x.row(0).to_vec(), vec![1.0, 0.0, 1.0, 1.0]);
        assert_eq!(encoded.x.row(2).to_vec(), vec![3.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_numeric_nulls_rejected() {
        let df = df!(
            "a" => &[Some(1.0f64), None],
            "target" => &[0i64, 1]
        )
        .unwrap();
        assert!(matches!(
            encode_features(&df, "target"),
            Err(PipelineError::InputContract(_))
        ));
    }

    #[test]
    fn test_integer_labels_kept() {
        let df = df!("target" => &[3i64, 7, 3]).unwrap();
        let labels = encode_labels(&df, "target").unwrap();
        assert_eq!(labels.y.to_vec(), vec![3, 7, 3]);
        assert_eq!(labels.display(7), "7");
    }

    #[test]
    fn test_string_labels_sorted_codes() {
        let df = df!("target" => &["spam", "ham", "spam", "eggs"]).unwrap();
        let labels = encode_labels(&df, "target").unwrap();
        assert_eq!(labels.y.to_vec(), vec![2, 1, 2, 0]);
        assert_eq!(labels.display(0), "eggs");
        assert_eq!(labels.names.len(), 3);
    }

    #[test]
    fn test_missing_target() {
        let df = df!("a" => &[1i64]).unwrap();
        assert!(encode_features(&df, "target").is_err());
        assert!(encode_labels(&df, "target").is_err());
    }
}
