//! Error types for templates.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for template operations.
pub type TemplateResult<T> = Result<T, TemplateError>;

/// Errors that can occur during template operations.
#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("Template not found: {0}")]
    NotFound(String),

    #[error("Template directory not found: {0}")]
    DirectoryNotFound(PathBuf),

    #[error("Variable not provided for template {template}: {variable}")]
    MissingVariable { template: String, variable: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to walk template directory: {0}")]
    Walk(#[from] walkdir::Error),
}
