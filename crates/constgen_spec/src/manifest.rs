//! Package manifest access.

use std::fs;
use std::path::{Path, PathBuf};

use semver::Version;
use toml_edit::{DocumentMut, Item};
use tracing::debug;

use crate::error::{SpecError, SpecResult};

/// A Cargo-style manifest holding the published `package.version`.
///
/// Only `package.version` is ever changed. Comments, key order and
/// formatting of everything else are written back as they were read.
#[derive(Debug, Clone)]
pub struct PackageManifest {
    path: PathBuf,
    document: DocumentMut,
}

impl PackageManifest {
    pub fn load(path: impl AsRef<Path>) -> SpecResult<Self> {
        let path = path.as_ref();
        debug!("Reading manifest from {:?}", path);

        let content = fs::read_to_string(path)?;
        let document: DocumentMut = content.parse()?;
        Ok(Self {
            path: path.to_path_buf(),
            document,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn version_str(&self) -> SpecResult<&str> {
        self.document
            .get("package")
            .and_then(|package| package.get("version"))
            .and_then(|version| version.as_str())
            .ok_or_else(|| self.invalid("package.version must be a string"))
    }

    pub fn version(&self) -> SpecResult<Version> {
        let version = self.version_str()?;
        Version::parse(version).map_err(|e| SpecError::InvalidVersion {
            version: version.to_string(),
            message: e.to_string(),
        })
    }

    pub fn set_version(&mut self, version: &Version) -> SpecResult<()> {
        let path = self.path.clone();
        let package = self
            .document
            .get_mut("package")
            .and_then(Item::as_table_like_mut)
            .ok_or_else(|| SpecError::Manifest {
                path,
                message: "missing [package] table".to_string(),
            })?;

        // Keep the spacing and any trailing comment of the old value.
        let mut value = toml_edit::Value::from(version.to_string());
        if let Some(old) = package.get("version").and_then(Item::as_value) {
            *value.decor_mut() = old.decor().clone();
        }
        package.insert("version", Item::Value(value));
        Ok(())
    }

    pub fn save(&self) -> SpecResult<()> {
        debug!("Writing manifest to {:?}", self.path);
        fs::write(&self.path, self.document.to_string())?;
        Ok(())
    }

    fn invalid(&self, message: &str) -> SpecError {
        SpecError::Manifest {
            path: self.path.clone(),
            message: message.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const MANIFEST: &str = r#"[package]
name = "vlcb-defs"
version = "1.2.0"
edition = "2021"

[dependencies]
bitflags = "2.4"
num_enum = { version = "0.7", default-features = false }
"#;

    #[test]
    fn test_read_version() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("Cargo.toml");
        fs::write(&path, MANIFEST).unwrap();

        let manifest = PackageManifest::load(&path).unwrap();
        assert_eq!(manifest.version().unwrap(), Version::new(1, 2, 0));
    }

    #[test]
    fn test_set_version_preserves_other_keys() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("Cargo.toml");
        fs::write(&path, MANIFEST).unwrap();

        let mut manifest = PackageManifest::load(&path).unwrap();
        manifest.set_version(&Version::new(1, 3, 0)).unwrap();
        manifest.save().unwrap();

        let reloaded = PackageManifest::load(&path).unwrap();
        assert_eq!(reloaded.version_str().unwrap(), "1.3.0");
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("name = \"vlcb-defs\""));
        assert!(content.contains("bitflags = \"2.4\""));
        assert!(content.contains("default-features = false"));
    }

    #[test]
    fn test_bump_changes_only_the_version_line() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("Cargo.toml");
        let original = r#"# crate manifest
[package]
name = "defs"
version = "1.2.0"   # bumped by constgen
edition = "2021"

[dependencies]
num_enum = "0.7"
bitflags = "2"
"#;
        fs::write(&path, original).unwrap();

        let mut manifest = PackageManifest::load(&path).unwrap();
        manifest.set_version(&Version::new(1, 3, 0)).unwrap();
        manifest.save().unwrap();

        let expected = original.replace(
            "version = \"1.2.0\"   # bumped by constgen",
            "version = \"1.3.0\"   # bumped by constgen",
        );
        assert_eq!(fs::read_to_string(&path).unwrap(), expected);
    }

    #[test]
    fn test_workspace_inherited_version_rejected() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("Cargo.toml");
        fs::write(&path, "[package]\nname = \"x\"\nversion.workspace = true\n").unwrap();

        let manifest = PackageManifest::load(&path).unwrap();
        assert!(matches!(manifest.version(), Err(SpecError::Manifest { .. })));
    }
}
