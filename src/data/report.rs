//! Descriptive dataset report

use crate::error::Result;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Rows included in the report sample
const SAMPLE_ROWS: usize = 5;

/// Shape, schema and a small sample of a table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetReport {
    /// (rows, columns)
    pub shape: (usize, usize),
    /// Column names in table order
    pub columns: Vec<String>,
    pub missing_counts: BTreeMap<String, usize>,
    pub dtypes: BTreeMap<String, String>,
    /// First rows as column → value records
    pub sample_rows: Vec<BTreeMap<String, Value>>,
}

impl DatasetReport {
    /// Total number of missing cells
    pub fn total_missing(&self) -> usize {
        self.missing_counts.values().sum()
    }
}

fn to_json(value: AnyValue) -> Value {
    match value {
        AnyValue::Null => Value::Null,
        AnyValue::Boolean(b) => Value::Bool(b),
        AnyValue::Int8(v) => Value::from(v),
        AnyValue::Int16(v) => Value::from(v),
        AnyValue::Int32(v) => Value::from(v),
        AnyValue::Int64(v) => Value::from(v),
        AnyValue::UInt8(v) => Value::from(v),
        AnyValue::UInt16(v) => Value::from(v),
        AnyValue::UInt32(v) => Value::from(v),
        AnyValue::UInt64(v) => Value::from(v),
        AnyValue::Float32(v) => Value::from(v as f64),
        AnyValue::Float64(v) => Value::from(v),
        AnyValue::String(s) => Value::String(s.to_string()),
        other => Value::String(other.to_string()),
    }
}

/// Build the descriptive report for a table
pub fn describe(df: &DataFrame) -> Result<DatasetReport> {
    let mut columns = Vec::with_capacity(df.width());
    let mut missing_counts = BTreeMap::new();
    let mut dtypes = BTreeMap::new();

    for column in df.get_columns() {
        let name = column.name().to_string();
        missing_counts.insert(name.clone(), column.null_count());
        dtypes.insert(name.clone(), column.dtype().to_string());
        columns.push(name);
    }

    let n_sample = df.height().min(SAMPLE_ROWS);
    let mut sample_rows = Vec::with_capacity(n_sample);
    for row in 0..n_sample {
        let mut record = BTreeMap::new();
        for column in df.get_columns() {
            record.insert(column.name().to_string(), to_json(column.get(row)?));
        }
        sample_rows.push(record);
    }

    Ok(DatasetReport {
        shape: df.shape(),
        columns,
        missing_counts,
        dtypes,
        sample_rows,
    })
}
