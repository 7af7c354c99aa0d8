//! Generation run configuration.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use constgen_spec::{ValidatorOptions, VersionPolicy};

use crate::error::{CoreError, CoreResult};
use crate::formatter::{CommandFormatter, Formatter, NoopFormatter};

/// External formatter settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormatterConfig {
    /// Run the formatter after writing output
    pub enabled: bool,
    /// Program to invoke
    pub program: String,
    /// Arguments placed before the file path
    pub args: Vec<String>,
}

impl Default for FormatterConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            program: "rustfmt".to_string(),
            args: vec!["--edition".to_string(), "2021".to_string()],
        }
    }
}

/// Settings for one generation run, usually read from `constgen.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Spec document to generate from
    pub spec_path: PathBuf,
    /// Root that `commentsFrom` paths are relative to
    pub project_root: PathBuf,
    /// Manifest whose `package.version` tracks the definition version
    pub manifest_path: PathBuf,
    /// Generated source file
    pub output_path: PathBuf,
    /// Directory of template overrides
    pub template_dir: Option<PathBuf>,
    /// Require a valid semantic version in the definition
    pub validate_version: bool,
    /// Where extracted comment files are written, relative to the project root
    pub comments_dir: String,
    pub formatter: FormatterConfig,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            spec_path: PathBuf::from("definition.yaml"),
            project_root: PathBuf::from("."),
            manifest_path: PathBuf::from("Cargo.toml"),
            output_path: PathBuf::from("src/generated.rs"),
            template_dir: None,
            validate_version: true,
            comments_dir: "docs/opcode".to_string(),
            formatter: FormatterConfig::default(),
        }
    }
}

impl GeneratorConfig {
    /// Conventional configuration file name.
    pub const FILE_NAME: &'static str = "constgen.toml";

    pub fn new() -> Self {
        Self::default()
    }

    /// Read a config file. Relative paths in it are taken relative to the
    /// directory holding the file.
    pub fn load(path: impl AsRef<Path>) -> CoreResult<Self> {
        let path = path.as_ref();
        debug!("Loading configuration from {:?}", path);

        let content = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content).map_err(|e| CoreError::InvalidConfig {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let base = path.parent().unwrap_or_else(|| Path::new(""));
        Ok(config.relative_to(base))
    }

    /// Resolve every relative path against `base`.
    pub fn relative_to(mut self, base: &Path) -> Self {
        let resolve = |p: &Path| if p.is_absolute() { p.to_path_buf() } else { base.join(p) };
        self.spec_path = resolve(&self.spec_path);
        self.project_root = resolve(&self.project_root);
        self.manifest_path = resolve(&self.manifest_path);
        self.output_path = resolve(&self.output_path);
        self.template_dir = self.template_dir.as_deref().map(resolve);
        self
    }

    pub fn spec_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.spec_path = path.into();
        self
    }

    pub fn project_root(mut self, path: impl Into<PathBuf>) -> Self {
        self.project_root = path.into();
        self
    }

    pub fn manifest_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.manifest_path = path.into();
        self
    }

    pub fn output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_path = path.into();
        self
    }

    pub fn template_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.template_dir = Some(path.into());
        self
    }

    pub fn without_version_check(mut self) -> Self {
        self.validate_version = false;
        self
    }

    pub fn without_formatter(mut self) -> Self {
        self.formatter.enabled = false;
        self
    }

    pub fn version_policy(&self) -> VersionPolicy {
        if self.validate_version {
            VersionPolicy::Required
        } else {
            VersionPolicy::Disabled
        }
    }

    pub fn validator_options(&self) -> ValidatorOptions {
        ValidatorOptions::new(&self.project_root).version_policy(self.version_policy())
    }

    /// Formatter described by this configuration.
    pub fn build_formatter(&self) -> Box<dyn Formatter> {
        if self.formatter.enabled {
            Box::new(
                CommandFormatter::new(&self.formatter.program).args(self.formatter.args.clone()),
            )
        } else {
            Box::new(NoopFormatter)
        }
    }
}
