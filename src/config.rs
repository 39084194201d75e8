//! Run settings: config files, CLI merging and the resolved settings struct

use crate::error::{PipelineError, Result};
use crate::logging::LogSettings;
use crate::training::TrainingConfig;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

/// Flat key/value mapping read from a config file or built from CLI flags
pub type ConfigMap = Map<String, Value>;

/// Which source wins when both set a key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Precedence {
    /// Any non-null CLI value overrides the file
    #[default]
    Cli,
    /// CLI values only fill keys the file does not set
    File,
}

impl FromStr for Precedence {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "cli" => Ok(Precedence::Cli),
            "file" | "config" => Ok(Precedence::File),
            other => Err(PipelineError::config_field(
                "precedence",
                format!("unknown precedence '{}', expected cli or file", other),
            )),
        }
    }
}

enum ConfigFormat {
    Yaml,
    Json,
}

fn detect_format(path: &Path) -> Result<ConfigFormat> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match extension.as_deref() {
        Some("yml") | Some("yaml") => Ok(ConfigFormat::Yaml),
        Some("json") => Ok(ConfigFormat::Json),
        _ => Err(PipelineError::Config(format!(
            "unsupported config format '{}': use .yml, .yaml or .json",
            path.display()
        ))),
    }
}

/// Load a YAML or JSON config file into a flat mapping.
///
/// An empty file yields an empty mapping. The root must be a mapping.
pub fn load_config(path: impl AsRef<Path>) -> Result<ConfigMap> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(PipelineError::Config(format!(
            "config file not found: {}",
            path.display()
        )));
    }
    let format = detect_format(path)?;
    let contents = std::fs::read_to_string(path)?;
    if contents.trim().is_empty() {
        return Ok(ConfigMap::new());
    }

    let value: Value = match format {
        ConfigFormat::Yaml => serde_yaml::from_str(&contents)?,
        ConfigFormat::Json => serde_json::from_str(&contents)
            .map_err(|e| PipelineError::Config(format!("{}: {}", path.display(), e)))?,
    };

    match value {
        Value::Object(map) => {
            debug!(path = %path.display(), keys = map.len(), "Loaded config file");
            Ok(map)
        }
        // a YAML document holding only comments parses as null
        Value::Null => Ok(ConfigMap::new()),
        _ => Err(PipelineError::Config(
            "Config root must be a mapping/object".to_string(),
        )),
    }
}

/// Combine CLI values with file values.
///
/// Starts from the file mapping. With [`Precedence::Cli`] every non-null CLI
/// value overwrites; with [`Precedence::File`] CLI values are only added for
/// keys the file lacks.
pub fn merge_config(cli: &ConfigMap, file: &ConfigMap, precedence: Precedence) -> ConfigMap {
    let mut merged = file.clone();
    for (key, value) in cli {
        match precedence {
            Precedence::Cli if !value.is_null() => {
                merged.insert(key.clone(), value.clone());
            }
            _ => {
                merged.entry(key.clone()).or_insert_with(|| value.clone());
            }
        }
    }
    merged
}

/// Fully resolved settings for one pipeline run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    /// Input CSV
    pub file: Option<PathBuf>,
    /// Label column
    pub target: Option<String>,
    /// Rebalance the training data when the labels are imbalanced
    pub apply_smote: bool,
    /// Write the metrics report here as JSON
    pub output: Option<PathBuf>,
    #[serde(flatten)]
    pub training: TrainingConfig,
    #[serde(flatten)]
    pub logging: LogSettings,
}

impl PipelineSettings {
    /// Build settings from a merged mapping. Null values fall back to defaults.
    pub fn from_map(map: ConfigMap) -> Result<Self> {
        let map: ConfigMap = map.into_iter().filter(|(_, v)| !v.is_null()).collect();
        serde_json::from_value(Value::Object(map))
            .map_err(|e| PipelineError::Config(format!("invalid settings: {}", e)))
    }

    /// Input file, required for a run
    pub fn require_file(&self) -> Result<&Path> {
        self.file
            .as_deref()
            .ok_or_else(|| PipelineError::config_field("file", "no input file given"))
    }

    /// Target column, required for a run
    pub fn require_target(&self) -> Result<&str> {
        self.target
            .as_deref()
            .ok_or_else(|| PipelineError::config_field("target", "no target column given"))
    }
}
