use std::path::PathBuf;
use thiserror::Error;

use crate::pipeline::Stage;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Failed to load configuration document '{}': {reason}", path.display())]
    ConfigLoad { path: PathBuf, reason: String },

    #[error("Missing configuration section: '{section}'")]
    MissingSection { section: String },

    #[error("Missing required field '{field}' in section '{section}'")]
    MissingField { section: String, field: String },

    #[error("Field '{field}' in section '{section}' must be {expected}")]
    InvalidField {
        section: String,
        field: String,
        expected: &'static str,
    },

    #[error("No file found at {}", path.display())]
    SourceNotFound { path: PathBuf },

    #[error("Unknown stage: '{0}'")]
    UnknownStage(String),

    #[error("No component registered for stage '{}'", .0.key())]
    NoComponent(Stage),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

impl PipelineError {
    pub fn missing_section(section: impl Into<String>) -> Self {
        PipelineError::MissingSection {
            section: section.into(),
        }
    }

    pub fn missing_field(section: impl Into<String>, field: impl Into<String>) -> Self {
        PipelineError::MissingField {
            section: section.into(),
            field: field.into(),
        }
    }

    pub fn source_not_found(path: impl Into<PathBuf>) -> Self {
        PipelineError::SourceNotFound { path: path.into() }
    }

    /// Short machine-friendly label, used as a metrics label and in failure events.
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::ConfigLoad { .. } => "config_load",
            PipelineError::MissingSection { .. } => "missing_section",
            PipelineError::MissingField { .. } => "missing_field",
            PipelineError::InvalidField { .. } => "invalid_field",
            PipelineError::SourceNotFound { .. } => "source_not_found",
            PipelineError::UnknownStage(_) => "unknown_stage",
            PipelineError::NoComponent(_) => "no_component",
            PipelineError::Io(_) => "io",
            PipelineError::Csv(_) => "csv",
            PipelineError::Json(_) => "json",
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
