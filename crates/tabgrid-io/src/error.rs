//! Error types for table export.

use tabgrid_core::CoreError;
use thiserror::Error;

pub type ExportResult<T> = Result<T, ExportError>;

#[derive(Error, Debug)]
pub enum ExportError {
    /// Scenario settings the exporter cannot work with. Raised before any file is written.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A record carries a value the target table cannot represent.
    #[error("Data integrity error: {0}")]
    DataIntegrity(String),

    #[error("Unsupported variant: {0}")]
    UnsupportedVariant(String),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl ExportError {
    /// Whether the error was raised while validating configuration.
    pub fn is_configuration(&self) -> bool {
        matches!(self, ExportError::Configuration(_))
    }
}
