//! # constgen_spec
//!
//! Definition model, loading, and validation for constgen.
//!
//! A spec document declares groups of numeric constants (enumerations and
//! bit-flag sets) that the generator turns into Rust source.
//!
//! ## Features
//!
//! - **Loading**: YAML documents with `!include` substitution
//! - **Validation**: every rule violation reported with its field location
//! - **Versioning**: declared version reconciled against a package manifest
//! - **Comments**: per-constant comment files referenced by `commentsFrom`
//! - **Extraction**: table rows turned into spec entries
//!
//! ## Example
//!
//! ```rust,no_run
//! use constgen_spec::{DocumentLoader, SchemaValidator, ValidatorOptions};
//!
//! let document = DocumentLoader::load("definition.yaml").unwrap();
//! let validator = SchemaValidator::new(ValidatorOptions::new("."));
//!
//! match validator.validate(&document) {
//!     Ok(spec) => println!("{} items", spec.spec.len()),
//!     Err(errors) => {
//!         for (field, messages) in errors.to_map() {
//!             eprintln!("{}: {}", field, messages.join(", "));
//!         }
//!     }
//! }
//! ```

pub mod comments;
pub mod error;
pub mod extract;
pub mod loader;
pub mod manifest;
pub mod models;
pub mod validator;
pub mod version;

pub use comments::{normalize_comments, CommentMaterializer, CommentRecord};
pub use error::{SpecError, SpecResult};
pub use extract::{ExtractedRecord, TableRow};
pub use loader::DocumentLoader;
pub use manifest::PackageManifest;
pub use models::*;
pub use validator::{
    FieldError, FieldPath, SchemaValidator, ValidationErrors, ValidatorOptions, VersionPolicy,
};
pub use version::{VersionAction, VersionReconciler};
