//! Extract command - Fill a definition body from exported table rows.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use constgen_spec::extract::{extract_entries, read_rows, update_spec_body};
use constgen_spec::CommentMaterializer;

use super::resolve_config;

#[derive(Args)]
pub struct ExtractArgs {
    /// JSON file holding an array of [key, subkey, value] rows
    #[arg(long)]
    rows: PathBuf,

    /// Item definition file whose body is replaced
    #[arg(short, long)]
    spec: PathBuf,

    /// Configuration file (defaults to ./constgen.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Root that comment files are written under
    #[arg(short, long)]
    root: Option<PathBuf>,

    /// Comment file directory, relative to the root
    #[arg(long)]
    comments_dir: Option<String>,

    /// Heading label used in comment files
    #[arg(long, default_value = CommentMaterializer::DEFAULT_LABEL)]
    label: String,
}

pub fn execute(args: ExtractArgs) -> Result<()> {
    let config = resolve_config(args.config.as_deref())?;
    let root = args.root.unwrap_or(config.project_root);
    let comments_dir = args.comments_dir.unwrap_or(config.comments_dir);

    info!("Extracting entries from {}", args.rows.display());
    let rows = read_rows(&args.rows)
        .with_context(|| format!("Failed to read rows from {}", args.rows.display()))?;

    let materializer = CommentMaterializer::new(root)
        .comments_dir(comments_dir)
        .label(args.label);
    let entries = extract_entries(&rows, &materializer)?;

    update_spec_body(&args.spec, &entries)?;
    println!(
        "✅ Wrote {} entries to {}",
        entries.len(),
        args.spec.display()
    );
    Ok(())
}
