//! Error types for the core module.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur during generation.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Unimplemented codegen spec item type {0}")]
    UnsupportedKind(String),

    #[error("Spec item {identifier}: data type {data_type} has no bit width")]
    MissingBitWidth { identifier: String, data_type: String },

    #[error("Flag {identifier}::{flag} = {value} does not fit in {data_type}")]
    FlagOutOfRange {
        identifier: String,
        flag: String,
        value: String,
        data_type: String,
    },

    #[error("Invalid configuration {path}: {message}")]
    InvalidConfig { path: PathBuf, message: String },

    #[error("Spec error: {0}")]
    Spec(#[from] constgen_spec::SpecError),

    #[error("Template error: {0}")]
    Template(#[from] constgen_templates::TemplateError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
