//! constgen CLI - Main entry point.
//!
//! Exit codes:
//! - 0: Success
//! - 1: General error
//! - 2: Invalid arguments or configuration
//! - 3: Validation failure
//! - 4: Version regression
//! - 5: Template error

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use constgen_core::CoreError;
use constgen_spec::SpecError;
use constgen_templates::TemplateError;

mod commands;

use commands::{Cli, Commands};

/// CI-friendly exit codes
pub struct ExitCodes;

impl ExitCodes {
    pub const SUCCESS: u8 = 0;
    pub const GENERAL_ERROR: u8 = 1;
    pub const INVALID_ARGS: u8 = 2;
    pub const VALIDATION_FAILURE: u8 = 3;
    pub const VERSION_REGRESSION: u8 = 4;
    pub const TEMPLATE_ERROR: u8 = 5;
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "warn"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("constgen={},warn", level)));

    // Already initialized when embedded in tests
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .try_init();

    let result = match cli.command {
        Commands::Validate(args) => commands::validate::execute(args),
        Commands::Generate(args) => commands::generate::execute(args),
        Commands::Extract(args) => commands::extract::execute(args),
    };

    match result {
        Ok(()) => ExitCode::from(ExitCodes::SUCCESS),
        Err(e) => {
            let exit_code = categorize_error(&e);
            eprintln!("Error: {:#}", e);
            ExitCode::from(exit_code)
        }
    }
}

/// Map an error to its exit code by the first typed error in the chain.
fn categorize_error(e: &anyhow::Error) -> u8 {
    for cause in e.chain() {
        if let Some(err) = cause.downcast_ref::<CoreError>() {
            return match err {
                CoreError::Spec(spec) => categorize_spec_error(spec),
                CoreError::Template(_) => ExitCodes::TEMPLATE_ERROR,
                CoreError::InvalidConfig { .. } => ExitCodes::INVALID_ARGS,
                _ => ExitCodes::GENERAL_ERROR,
            };
        }
        if let Some(err) = cause.downcast_ref::<SpecError>() {
            return categorize_spec_error(err);
        }
        if cause.downcast_ref::<TemplateError>().is_some() {
            return ExitCodes::TEMPLATE_ERROR;
        }
    }
    ExitCodes::GENERAL_ERROR
}

fn categorize_spec_error(e: &SpecError) -> u8 {
    match e {
        SpecError::Validation(_) | SpecError::InvalidVersion { .. } => {
            ExitCodes::VALIDATION_FAILURE
        }
        SpecError::VersionRegression { .. } => ExitCodes::VERSION_REGRESSION,
        _ => ExitCodes::GENERAL_ERROR,
    }
}
