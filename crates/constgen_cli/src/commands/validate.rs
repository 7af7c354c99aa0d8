//! Validate command - Check a definition without generating anything.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use tracing::info;

use constgen_spec::{DocumentLoader, SchemaValidator, SpecError, ValidationErrors};

use super::resolve_config;

#[derive(Args)]
pub struct ValidateArgs {
    /// Configuration file (defaults to ./constgen.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Definition file to validate
    #[arg(short, long)]
    spec: Option<PathBuf>,

    /// Root that commentsFrom paths are resolved against
    #[arg(short, long)]
    root: Option<PathBuf>,

    /// Accept definitions without a valid version
    #[arg(long)]
    no_version_check: bool,

    /// Print errors as a JSON object keyed by field path
    #[arg(long)]
    json: bool,
}

pub fn execute(args: ValidateArgs) -> Result<()> {
    let mut config = resolve_config(args.config.as_deref())?;
    if let Some(spec) = args.spec {
        config = config.spec_path(spec);
    }
    if let Some(root) = args.root {
        config = config.project_root(root);
    }
    if args.no_version_check {
        config = config.without_version_check();
    }

    info!("Validating {}", config.spec_path.display());
    let document = DocumentLoader::load(&config.spec_path)?;
    let validator = SchemaValidator::new(config.validator_options());

    match validator.validate(&document) {
        Ok(spec) => {
            if args.json {
                println!("{{}}");
            } else {
                println!("✅ {} is valid ({} item(s))", config.spec_path.display(), spec.spec.len());
            }
            Ok(())
        }
        Err(errors) => {
            report(&errors, args.json)?;
            Err(SpecError::from(errors).into())
        }
    }
}

fn report(errors: &ValidationErrors, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(errors)?);
        return Ok(());
    }

    println!("❌ {} validation error(s):", errors.len());
    for (field, messages) in errors.to_map() {
        for message in messages {
            println!("   - {}: {}", field, message);
        }
    }
    Ok(())
}
