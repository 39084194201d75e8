//! Tracing subscriber setup
//!
//! `configure` installs one global subscriber on first use. Later calls only
//! swap the level filter, so repeated configuration never adds a second sink.

use crate::error::{PipelineError, Result};
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, reload, EnvFilter, Layer, Registry};

/// Filter used when neither the settings nor `RUST_LOG` say otherwise
pub const DEFAULT_LEVEL: &str = "info";

static FILTER_HANDLE: OnceLock<reload::Handle<EnvFilter, Registry>> = OnceLock::new();

/// Log sink settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// Level or filter directive, e.g. `debug` or `ml_autopipeline=trace`
    #[serde(rename = "log_level")]
    pub level: String,
    /// Emit JSON lines instead of text
    #[serde(rename = "log_json")]
    pub json: bool,
    /// Append to this file instead of stderr
    #[serde(rename = "log_file")]
    pub file: Option<PathBuf>,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: DEFAULT_LEVEL.to_string(),
            json: false,
            file: None,
        }
    }
}

impl LogSettings {
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    pub fn with_file(mut self, file: impl Into<PathBuf>) -> Self {
        self.file = Some(file.into());
        self
    }
}

/// `RUST_LOG` wins over the configured level
fn build_filter(level: &str) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(level).map_err(|e| {
        PipelineError::config_field("log_level", format!("invalid filter '{}': {}", level, e))
    })
}

fn make_writer(settings: &LogSettings) -> Result<BoxMakeWriter> {
    Ok(match &settings.file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            BoxMakeWriter::new(Mutex::new(file))
        }
        None => BoxMakeWriter::new(std::io::stderr),
    })
}

/// Install the global subscriber, or update its level if already installed.
///
/// Output format and destination are fixed by the first call.
pub fn configure(settings: &LogSettings) -> Result<()> {
    let filter = build_filter(&settings.level)?;

    if let Some(handle) = FILTER_HANDLE.get() {
        return handle
            .reload(filter)
            .map_err(|e| PipelineError::Config(format!("cannot update log filter: {}", e)));
    }

    let (filter_layer, handle) = reload::Layer::new(filter);
    let writer = make_writer(settings)?;
    let with_ansi = settings.file.is_none();

    let fmt_layer = if settings.json {
        fmt::layer()
            .json()
            .with_current_span(false)
            .with_writer(writer)
            .boxed()
    } else {
        fmt::layer()
            .with_target(true)
            .with_ansi(with_ansi)
            .with_writer(writer)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| PipelineError::Config(format!("cannot install log subscriber: {}", e)))?;

    // A concurrent first call may have won the race; its handle is equivalent
    let _ = FILTER_HANDLE.set(handle);
    Ok(())
}

/// Whether a subscriber has been installed through [`configure`]
pub fn is_configured() -> bool {
    FILTER_HANDLE.get().is_some()
}
