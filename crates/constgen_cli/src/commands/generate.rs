//! Generate command - Run the full generation pipeline.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use tracing::{info, warn};

use constgen_core::{CommandFormatter, Pipeline};
use constgen_spec::VersionAction;

use super::resolve_config;

#[derive(Args)]
pub struct GenerateArgs {
    /// Configuration file (defaults to ./constgen.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Definition file to generate from
    #[arg(short, long)]
    spec: Option<PathBuf>,

    /// Generated source file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Manifest whose package version follows the definition
    #[arg(short, long)]
    manifest: Option<PathBuf>,

    /// Root that commentsFrom paths are resolved against
    #[arg(short, long)]
    root: Option<PathBuf>,

    /// Directory of template overrides
    #[arg(short, long)]
    templates: Option<PathBuf>,

    /// Skip the external formatter
    #[arg(long)]
    no_format: bool,

    /// Accept definitions without a valid version
    #[arg(long)]
    no_version_check: bool,
}

pub fn execute(args: GenerateArgs) -> Result<()> {
    let mut config = resolve_config(args.config.as_deref())?;
    if let Some(spec) = args.spec {
        config = config.spec_path(spec);
    }
    if let Some(output) = args.output {
        config = config.output_path(output);
    }
    if let Some(manifest) = args.manifest {
        config = config.manifest_path(manifest);
    }
    if let Some(root) = args.root {
        config = config.project_root(root);
    }
    if let Some(templates) = args.templates {
        config = config.template_dir(templates);
    }
    if args.no_format {
        config = config.without_formatter();
    }
    if args.no_version_check {
        config = config.without_version_check();
    }

    if config.formatter.enabled {
        let formatter = CommandFormatter::new(&config.formatter.program);
        if !formatter.is_available() {
            warn!(
                "Formatter {} is not available, output will be left unformatted",
                formatter.program()
            );
        }
    }

    info!("Generating from {}", config.spec_path.display());
    let report = Pipeline::new(config).run()?;

    println!(
        "✅ Wrote {} item(s) and {} import(s) to {}",
        report.items,
        report.imports,
        report.output_path.display()
    );
    match &report.version_action {
        Some(VersionAction::Bump { from, to }) => println!("   Crate version {} → {}", from, to),
        Some(VersionAction::Unchanged(version)) => println!("   Crate version unchanged at {}", version),
        None => {}
    }
    if let Some(error) = &report.formatter_error {
        println!("⚠️  Output left unformatted: {}", error);
    }

    Ok(())
}
