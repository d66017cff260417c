use std::path::PathBuf;
use thiserror::Error;

/// Failures while turning a source file into a [`crate::types::CropDataset`].
///
/// Every variant is recoverable: callers substitute the built-in fallback
/// dataset and keep going.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("source file not found: {}", path.display())]
    SourceNotFound { path: PathBuf },
    #[error("required field '{field}' not found in {source_name}")]
    MissingRequiredField {
        field: &'static str,
        source_name: String,
    },
    #[error("malformed source: {0}")]
    Csv(#[from] csv::Error),
    #[error("could not read source: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug, PartialEq)]
pub enum ModelError {
    #[error("unknown region '{0}'")]
    UnknownRegion(String),
    #[error("unknown crop '{0}'")]
    UnknownCrop(String),
    #[error("unknown cost item '{0}'")]
    UnknownCostItem(String),
    #[error("scenario comparison needs 2 to 3 scenarios, got {0}")]
    ScenarioCount(usize),
    #[error("baseline index {index} out of range for {count} scenarios")]
    BaselineOutOfRange { index: usize, count: usize },
}

/// A single export failed. Other exports are unaffected.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("write error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("report template unavailable: {0}")]
    Template(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("could not read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}
