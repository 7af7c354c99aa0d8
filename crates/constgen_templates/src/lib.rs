//! # constgen_templates
//!
//! Template loading and rendering for constgen.
//!
//! Rendering is a pure function of a template name and a context of string
//! variables. The Rust backend's templates are built in; a directory of
//! `<name>.tmpl` files can replace any of them.
//!
//! ## Example
//!
//! ```rust,no_run
//! use constgen_templates::{context, TemplateLoader, TemplateRenderer};
//!
//! let templates = TemplateLoader::new("templates").load().unwrap();
//! let renderer = TemplateRenderer::new(templates);
//!
//! let line = renderer
//!     .render("import", &context([("path", "bitflags::bitflags")]))
//!     .unwrap();
//! assert_eq!(line, "use bitflags::bitflags;\n");
//! ```

pub mod error;
pub mod loader;
pub mod renderer;

pub use error::{TemplateError, TemplateResult};
pub use loader::TemplateLoader;
pub use renderer::{context, Context, TemplateRenderer, TemplateSet};
