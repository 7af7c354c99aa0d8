//! Template loading functionality.

use std::fs;
use std::path::PathBuf;

use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::error::{TemplateError, TemplateResult};
use crate::renderer::TemplateSet;

/// Loads `<name>.tmpl` files from a directory.
pub struct TemplateLoader {
    templates_path: PathBuf,
}

impl TemplateLoader {
    /// File extension of template files.
    pub const EXTENSION: &'static str = "tmpl";

    /// Create a new template loader.
    pub fn new(templates_path: impl Into<PathBuf>) -> Self {
        Self {
            templates_path: templates_path.into(),
        }
    }

    /// Built-in templates overridden by whatever the directory provides.
    pub fn load(&self) -> TemplateResult<TemplateSet> {
        let mut set = TemplateSet::builtin();
        self.load_into(&mut set)?;
        Ok(set)
    }

    /// Add or replace templates in `set`. Returns how many were loaded.
    pub fn load_into(&self, set: &mut TemplateSet) -> TemplateResult<usize> {
        if !self.templates_path.is_dir() {
            return Err(TemplateError::DirectoryNotFound(self.templates_path.clone()));
        }

        let mut loaded = 0;
        for entry in WalkDir::new(&self.templates_path).min_depth(1).max_depth(1) {
            let entry = entry?;
            let path = entry.path();
            if !path.is_file() || path.extension().map_or(true, |ext| ext != Self::EXTENSION) {
                continue;
            }
            let Some(name) = path.file_stem().map(|s| s.to_string_lossy().to_string()) else {
                continue;
            };

            if !TemplateSet::REQUIRED.contains(&name.as_str()) {
                warn!("Template {:?} is not used by the generator", path);
            }

            debug!("Loading template {} from {:?}", name, path);
            set.insert(name, fs::read_to_string(path)?);
            loaded += 1;
        }

        info!("Loaded {} template(s) from {:?}", loaded, self.templates_path);
        Ok(loaded)
    }
}
