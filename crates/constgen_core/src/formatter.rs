//! External source formatter invocation.

use std::path::Path;
use std::process::Command;

use thiserror::Error;
use tracing::{debug, info};

/// Errors from running the formatter. These are reported, never fatal.
#[derive(Error, Debug)]
pub enum FormatterError {
    #[error("Failed to run formatter {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Formatter {program} failed ({status}): {stderr}")]
    Failed {
        program: String,
        status: String,
        stderr: String,
    },
}

/// Post-processes a generated file in place.
#[cfg_attr(test, mockall::automock)]
pub trait Formatter {
    fn format(&self, path: &Path) -> Result<(), FormatterError>;
}

/// Runs an external program with the file path as its last argument.
#[derive(Debug, Clone)]
pub struct CommandFormatter {
    program: String,
    args: Vec<String>,
}

impl Default for CommandFormatter {
    fn default() -> Self {
        Self::rustfmt()
    }
}

impl CommandFormatter {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn rustfmt() -> Self {
        Self::new("rustfmt").args(["--edition", "2021"])
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Check if the program can be started at all.
    pub fn is_available(&self) -> bool {
        Command::new(&self.program)
            .arg("--version")
            .output()
            .map(|output| output.status.success())
            .unwrap_or(false)
    }
}

impl Formatter for CommandFormatter {
    fn format(&self, path: &Path) -> Result<(), FormatterError> {
        info!("Running formatter {} on {:?}", self.program, path);

        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(path)
            .output()
            .map_err(|source| FormatterError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(FormatterError::Failed {
                program: self.program.clone(),
                status: output.status.to_string(),
                stderr: stderr.trim().to_string(),
            });
        }

        debug!("Formatter finished");
        Ok(())
    }
}

/// Leaves files untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopFormatter;

impl Formatter for NoopFormatter {
    fn format(&self, path: &Path) -> Result<(), FormatterError> {
        debug!("Formatting disabled, leaving {:?} as generated", path);
        Ok(())
    }
}
