//! Error types for the spec module.

use std::path::PathBuf;
use thiserror::Error;

use crate::validator::ValidationErrors;

/// Result type alias for spec operations.
pub type SpecResult<T> = Result<T, SpecError>;

/// Errors that can occur while loading, validating or reconciling a spec.
#[derive(Error, Debug)]
pub enum SpecError {
    #[error("Failed to load spec document {path}: {message}")]
    Load { path: PathBuf, message: String },

    #[error("Failed to include {path}: {message}")]
    Include { path: PathBuf, message: String },

    #[error("Include cycle detected at {0}")]
    IncludeCycle(PathBuf),

    #[error("Spec validation failed: {0}")]
    Validation(ValidationErrors),

    #[error("Invalid version '{version}': {message}")]
    InvalidVersion { version: String, message: String },

    #[error("New version {declared} is not a bump over the current version {current}")]
    VersionRegression { declared: String, current: String },

    #[error("Invalid manifest {path}: {message}")]
    Manifest { path: PathBuf, message: String },

    #[error("Extraction failed: {0}")]
    Extraction(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml_edit::TomlError),
}

impl From<ValidationErrors> for SpecError {
    fn from(errors: ValidationErrors) -> Self {
        Self::Validation(errors)
    }
}
