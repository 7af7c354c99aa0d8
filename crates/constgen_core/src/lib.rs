//! # constgen_core
//!
//! Code generation pipeline for constgen.
//!
//! This crate renders validated constant-group specs into Rust source and
//! drives a complete run: loading, validation, rendering, version
//! reconciliation, writing, and formatting.
//!
//! # Architecture
//!
//! - **Generator**: per-kind renderers producing fragments, combined by an
//!   explicit generator state
//! - **Formatter**: the external post-processor behind a trait
//! - **Config**: run settings read from `constgen.toml`
//! - **Pipeline**: the end-to-end run
//!
//! # Example
//!
//! ```rust,no_run
//! use constgen_core::{GeneratorConfig, Pipeline};
//!
//! let config = GeneratorConfig::load("constgen.toml").unwrap();
//! let report = Pipeline::new(config).run().unwrap();
//! println!("Generated {} declarations", report.items);
//! ```

pub mod config;
pub mod error;
pub mod formatter;
pub mod generator;
pub mod pipeline;

pub use config::{FormatterConfig, GeneratorConfig};
pub use error::{CoreError, CoreResult};
pub use formatter::{CommandFormatter, Formatter, FormatterError, NoopFormatter};
pub use generator::{CodeGenerator, Fragment, GeneratedOutput, GeneratorState};
pub use pipeline::{Pipeline, RunReport};
