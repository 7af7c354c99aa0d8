//! Reconciliation of the declared spec version with the package manifest.

use std::cmp::Ordering;
use std::path::Path;

use semver::{BuildMetadata, Version};
use tracing::{info, warn};

use crate::error::{SpecError, SpecResult};
use crate::manifest::PackageManifest;

/// Outcome of comparing the declared version with the manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionAction {
    /// Versions match; nothing is written.
    Unchanged(Version),
    /// The manifest is behind and gets bumped.
    Bump { from: Version, to: Version },
}

impl VersionAction {
    pub fn is_bump(&self) -> bool {
        matches!(self, Self::Bump { .. })
    }
}

/// Enforces that the declared version never goes backwards.
pub struct VersionReconciler;

impl VersionReconciler {
    /// Decide what to do for `declared` against the `manifest` version.
    ///
    /// Ordering is semantic-version precedence; build metadata is ignored.
    pub fn reconcile(declared: &Version, manifest: &Version) -> SpecResult<VersionAction> {
        match precedence(declared, manifest) {
            Ordering::Equal => Ok(VersionAction::Unchanged(declared.clone())),
            Ordering::Greater => Ok(VersionAction::Bump {
                from: manifest.clone(),
                to: declared.clone(),
            }),
            Ordering::Less => Err(SpecError::VersionRegression {
                declared: declared.to_string(),
                current: manifest.to_string(),
            }),
        }
    }

    /// Reconcile against the manifest at `path`, persisting a bump.
    pub fn apply(declared: &Version, path: impl AsRef<Path>) -> SpecResult<VersionAction> {
        let mut manifest = PackageManifest::load(path)?;
        let current = manifest.version()?;
        let action = Self::reconcile(declared, &current)?;

        match &action {
            VersionAction::Unchanged(version) => {
                warn!(
                    "{:?} already has version {}; make sure you are not overwriting a published version",
                    manifest.path(),
                    version
                );
            }
            VersionAction::Bump { from, to } => {
                manifest.set_version(to)?;
                manifest.save()?;
                info!("Updated {:?} from version {} to {}", manifest.path(), from, to);
            }
        }

        Ok(action)
    }
}

fn precedence(a: &Version, b: &Version) -> Ordering {
    let strip = |v: &Version| Version {
        build: BuildMetadata::EMPTY,
        ..v.clone()
    };
    strip(a).cmp(&strip(b))
}
