//! End-to-end generation run.
//!
//! Load → validate → render → reconcile version → write → format. The
//! version check runs before anything is written, and a formatter failure
//! leaves the written file in place.

use std::path::PathBuf;

use tracing::{info, warn};

use constgen_spec::{
    DocumentLoader, SchemaValidator, SpecDocument, SpecError, VersionAction, VersionReconciler,
};
use constgen_templates::{TemplateLoader, TemplateRenderer, TemplateSet};

use crate::config::GeneratorConfig;
use crate::error::CoreResult;
use crate::formatter::Formatter;
use crate::generator::CodeGenerator;

/// Summary of a finished run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub output_path: PathBuf,
    pub items: usize,
    pub imports: usize,
    /// `None` when the definition declares no version.
    pub version_action: Option<VersionAction>,
    /// Set when the formatter could not be run or failed.
    pub formatter_error: Option<String>,
}

/// A configured generation pipeline.
pub struct Pipeline {
    config: GeneratorConfig,
}

impl Pipeline {
    pub fn new(config: GeneratorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Load the definition document and validate it.
    pub fn load_and_validate(&self) -> CoreResult<SpecDocument> {
        let document = DocumentLoader::load(&self.config.spec_path)?;
        let validator = SchemaValidator::new(self.config.validator_options());
        let spec = validator.validate(&document).map_err(SpecError::from)?;
        info!("Validation passed: {} item(s)", spec.spec.len());
        Ok(spec)
    }

    /// Renderer over the built-in templates and any configured overrides.
    pub fn renderer(&self) -> CoreResult<TemplateRenderer> {
        let templates = match &self.config.template_dir {
            Some(dir) => TemplateLoader::new(dir).load()?,
            None => TemplateSet::builtin(),
        };
        Ok(TemplateRenderer::new(templates))
    }

    /// Run with the formatter described by the configuration.
    pub fn run(&self) -> CoreResult<RunReport> {
        let formatter = self.config.build_formatter();
        self.run_with(formatter.as_ref())
    }

    /// Run with an explicit formatter.
    pub fn run_with(&self, formatter: &dyn Formatter) -> CoreResult<RunReport> {
        let spec = self.load_and_validate()?;

        info!("Generating Rust source");
        let renderer = self.renderer()?;
        let output = CodeGenerator::new(&renderer).generate(&spec)?;

        let version_action = match spec.declared_version()? {
            Some(declared) => {
                info!("Reconciling crate version with {}", declared);
                Some(VersionReconciler::apply(&declared, &self.config.manifest_path)?)
            }
            None => {
                info!("Spec declares no version, leaving manifest untouched");
                None
            }
        };

        output.write_to(&self.config.output_path)?;

        let formatter_error = match formatter.format(&self.config.output_path) {
            Ok(()) => None,
            Err(e) => {
                warn!("Formatter failed, output left unformatted: {}", e);
                Some(e.to_string())
            }
        };

        info!("Done");
        Ok(RunReport {
            output_path: self.config.output_path.clone(),
            items: output.declarations.len(),
            imports: output.import_count,
            version_action,
            formatter_error,
        })
    }
}
