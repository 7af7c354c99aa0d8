//! Spec document loading with `!include` resolution.

use std::fs;
use std::path::{Path, PathBuf};

use serde_yaml::Value;
use tracing::debug;

use crate::error::{SpecError, SpecResult};

/// Loads YAML documents and substitutes `!include` nodes.
///
/// A node such as `body: !include opcodes.yaml` is replaced by the parsed
/// content of `opcodes.yaml`, resolved relative to the including file.
/// Included files may include further files; revisiting a file already on
/// the include chain is an error.
pub struct DocumentLoader;

impl DocumentLoader {
    /// Tag marking an inclusion directive.
    pub const INCLUDE_TAG: &'static str = "include";

    /// Load a document from disk.
    pub fn load(path: impl AsRef<Path>) -> SpecResult<Value> {
        let path = path.as_ref();
        debug!("Loading spec document from {:?}", path);

        let content = fs::read_to_string(path).map_err(|e| SpecError::Load {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let value: Value = serde_yaml::from_str(&content).map_err(|e| SpecError::Load {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let mut chain = vec![Self::canonical(path)];
        Self::resolve(value, base_dir(path), &mut chain)
    }

    /// Load a document from memory, resolving includes against `base_dir`.
    pub fn load_str(content: &str, base_dir: impl AsRef<Path>) -> SpecResult<Value> {
        let value: Value = serde_yaml::from_str(content).map_err(|e| SpecError::Load {
            path: PathBuf::from("<memory>"),
            message: e.to_string(),
        })?;
        Self::resolve(value, base_dir.as_ref(), &mut Vec::new())
    }

    fn resolve(value: Value, base: &Path, chain: &mut Vec<PathBuf>) -> SpecResult<Value> {
        match value {
            Value::Tagged(tagged) if tagged.tag == Self::INCLUDE_TAG => {
                let target = match &tagged.value {
                    Value::String(target) => base.join(target),
                    other => {
                        return Err(SpecError::Include {
                            path: base.to_path_buf(),
                            message: format!("expected a file path, found {:?}", other),
                        })
                    }
                };
                Self::include(&target, chain)
            }
            Value::Tagged(mut tagged) => {
                tagged.value = Self::resolve(tagged.value, base, chain)?;
                Ok(Value::Tagged(tagged))
            }
            Value::Sequence(items) => items
                .into_iter()
                .map(|item| Self::resolve(item, base, chain))
                .collect::<SpecResult<Vec<_>>>()
                .map(Value::Sequence),
            Value::Mapping(mapping) => {
                let mut resolved = serde_yaml::Mapping::with_capacity(mapping.len());
                for (key, item) in mapping {
                    resolved.insert(key, Self::resolve(item, base, chain)?);
                }
                Ok(Value::Mapping(resolved))
            }
            scalar => Ok(scalar),
        }
    }

    fn include(target: &Path, chain: &mut Vec<PathBuf>) -> SpecResult<Value> {
        let canonical = Self::canonical(target);
        if chain.contains(&canonical) {
            return Err(SpecError::IncludeCycle(target.to_path_buf()));
        }

        debug!("Including {:?}", target);
        let content = fs::read_to_string(target).map_err(|e| SpecError::Include {
            path: target.to_path_buf(),
            message: e.to_string(),
        })?;
        let value: Value = serde_yaml::from_str(&content).map_err(|e| SpecError::Include {
            path: target.to_path_buf(),
            message: e.to_string(),
        })?;

        chain.push(canonical);
        let resolved = Self::resolve(value, base_dir(target), chain);
        chain.pop();
        resolved
    }

    fn canonical(path: &Path) -> PathBuf {
        fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
    }
}

fn base_dir(path: &Path) -> &Path {
    path.parent().unwrap_or_else(|| Path::new("."))
}
