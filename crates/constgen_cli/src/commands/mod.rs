//! CLI command definitions.
//!
//! Each subcommand maps to one stage of the constant generation workflow.

use std::path::Path;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::debug;

use constgen_core::GeneratorConfig;

pub mod extract;
pub mod generate;
pub mod validate;

/// constgen - Rust constant groups from YAML definitions
#[derive(Parser)]
#[command(name = "constgen")]
#[command(version, about = "constgen - Rust constant groups from YAML definitions")]
#[command(long_about = r#"
constgen turns a YAML definition of enumerations and bit-flag sets into a
Rust source file, keeping the crate version in step with the definition.

WORKFLOWS:
  validate  → Check a definition and report every problem found
  generate  → Validate, render, reconcile the crate version and format
  extract   → Turn exported table rows into definition entries

EXIT CODES:
  0 - Success
  1 - General error
  2 - Invalid arguments or configuration
  3 - Validation failure
  4 - Version regression
  5 - Template error
"#)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Validate a definition file
    Validate(validate::ValidateArgs),

    /// Generate Rust source from a definition file
    Generate(generate::GenerateArgs),

    /// Extract definition entries from exported table rows
    Extract(extract::ExtractArgs),
}

/// Configuration from an explicit file, else `constgen.toml` in the
/// working directory, else defaults.
pub fn resolve_config(path: Option<&Path>) -> Result<GeneratorConfig> {
    if let Some(path) = path {
        return GeneratorConfig::load(path)
            .with_context(|| format!("Failed to load configuration {}", path.display()));
    }

    let default_path = Path::new(GeneratorConfig::FILE_NAME);
    if default_path.is_file() {
        debug!("Using {}", GeneratorConfig::FILE_NAME);
        return Ok(GeneratorConfig::load(default_path)?);
    }

    Ok(GeneratorConfig::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use tempfile::tempdir;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_generate() {
        let cli = Cli::try_parse_from([
            "constgen",
            "--verbose",
            "generate",
            "--spec",
            "codegen/definition.yaml",
            "--no-format",
        ])
        .unwrap();
        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::Generate(_)));
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        assert!(Cli::try_parse_from(["constgen", "-v", "-q", "validate"]).is_err());
    }

    #[test]
    fn test_resolve_explicit_config() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("custom.toml");
        std::fs::write(&path, "output_path = \"out/defs.rs\"\n").unwrap();

        let config = resolve_config(Some(&path)).unwrap();
        assert_eq!(config.output_path, temp.path().join("out/defs.rs"));
    }

    #[test]
    fn test_resolve_missing_explicit_config() {
        let temp = tempdir().unwrap();
        assert!(resolve_config(Some(&temp.path().join("absent.toml"))).is_err());
    }
}
