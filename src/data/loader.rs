//! CSV loading

use crate::error::{PipelineError, Result};
use polars::prelude::*;
use std::fs::File;
use std::path::Path;
use tracing::info;

/// CSV loader with header and schema inference
#[derive(Debug, Clone)]
pub struct CsvLoader {
    /// Rows scanned to infer column types
    infer_schema_length: Option<usize>,
    /// Field separator
    separator: u8,
}

impl Default for CsvLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl CsvLoader {
    /// Create a new loader
    pub fn new() -> Self {
        Self {
            infer_schema_length: Some(1000),
            separator: b',',
        }
    }

    /// Set the number of rows used for type inference (`None` scans all)
    pub fn with_infer_schema_length(mut self, rows: Option<usize>) -> Self {
        self.infer_schema_length = rows;
        self
    }

    /// Set the field separator
    pub fn with_separator(mut self, separator: u8) -> Self {
        self.separator = separator;
        self
    }

    /// Load a CSV file
    pub fn load(&self, path: impl AsRef<Path>) -> Result<DataFrame> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(PipelineError::NotFound(path.to_path_buf()));
        }
        let file = File::open(path)?;

        let df = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(self.infer_schema_length)
            .with_parse_options(CsvParseOptions::default().with_separator(self.separator))
            .into_reader_with_file_handle(file)
            .finish()
            .map_err(|e| PipelineError::Parse(format!("{}: {}", path.display(), e)))?;

        info!(path = %path.display(), rows = df.height(), cols = df.width(), "Loaded table");
        Ok(df)
    }
}

/// Load a CSV table with default options
pub fn load_table(path: impl AsRef<Path>) -> Result<DataFrame> {
    CsvLoader::new().load(path)
}
