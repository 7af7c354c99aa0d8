//! Template rendering.

use std::collections::{BTreeMap, HashMap};

use regex::{Captures, Regex};
use tracing::trace;

use crate::error::{TemplateError, TemplateResult};

/// Variables available to a template.
pub type Context = HashMap<String, String>;

/// Named template sources.
#[derive(Debug, Clone, Default)]
pub struct TemplateSet {
    templates: BTreeMap<String, String>,
}

impl TemplateSet {
    /// Names of the templates every backend set must provide.
    pub const REQUIRED: [&'static str; 8] = [
        "imports",
        "import",
        "doc_line",
        "attribute",
        "enum",
        "enum_variant",
        "flags",
        "flag",
    ];

    /// Create an empty template set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Templates for the Rust backend.
    pub fn builtin() -> Self {
        let mut set = Self::new();
        set.insert("imports", include_str!("../templates/rust/imports.tmpl"));
        set.insert("import", include_str!("../templates/rust/import.tmpl"));
        set.insert("doc_line", include_str!("../templates/rust/doc_line.tmpl"));
        set.insert("attribute", include_str!("../templates/rust/attribute.tmpl"));
        set.insert("enum", include_str!("../templates/rust/enum.tmpl"));
        set.insert("enum_variant", include_str!("../templates/rust/enum_variant.tmpl"));
        set.insert("flags", include_str!("../templates/rust/flags.tmpl"));
        set.insert("flag", include_str!("../templates/rust/flag.tmpl"));
        set
    }

    /// Add or replace a template.
    pub fn insert(&mut self, name: impl Into<String>, source: impl Into<String>) {
        self.templates.insert(name.into(), source.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.templates.get(name).map(String::as_str)
    }

    /// Required templates this set lacks.
    pub fn missing(&self) -> Vec<&'static str> {
        Self::REQUIRED
            .into_iter()
            .filter(|name| !self.templates.contains_key(*name))
            .collect()
    }
}

/// Renders named templates by replacing `{{variable}}` placeholders.
pub struct TemplateRenderer {
    variable_pattern: Regex,
    templates: TemplateSet,
}

impl Default for TemplateRenderer {
    fn default() -> Self {
        Self::new(TemplateSet::builtin())
    }
}

impl TemplateRenderer {
    /// Create a renderer over the given templates.
    pub fn new(templates: TemplateSet) -> Self {
        Self {
            // Match {{variable_name}} pattern
            variable_pattern: Regex::new(r"\{\{([a-zA-Z_][a-zA-Z0-9_]*)\}\}").unwrap(),
            templates,
        }
    }

    pub fn templates(&self) -> &TemplateSet {
        &self.templates
    }

    /// Render the template called `name`.
    pub fn render(&self, name: &str, context: &Context) -> TemplateResult<String> {
        let source = self
            .templates
            .get(name)
            .ok_or_else(|| TemplateError::NotFound(name.to_string()))?;
        trace!("Rendering template {}", name);
        self.render_content(name, source, context)
    }

    /// Render `content`, failing on the first placeholder without a value.
    pub fn render_content(
        &self,
        template: &str,
        content: &str,
        context: &Context,
    ) -> TemplateResult<String> {
        if let Some(caps) = self
            .variable_pattern
            .captures_iter(content)
            .find(|caps| !context.contains_key(&caps[1]))
        {
            return Err(TemplateError::MissingVariable {
                template: template.to_string(),
                variable: caps[1].to_string(),
            });
        }

        Ok(self
            .variable_pattern
            .replace_all(content, |caps: &Captures| context[&caps[1]].clone())
            .into_owned())
    }
}

/// Build a context from name/value pairs.
pub fn context<I, K, V>(pairs: I) -> Context
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_content() {
        let renderer = TemplateRenderer::default();
        let vars = context([("name", "Mode"), ("repr", "u8")]);

        let rendered = renderer
            .render_content("inline", "enum {{name}}: {{repr}} {}", &vars)
            .unwrap();
        assert_eq!(rendered, "enum Mode: u8 {}");
    }

    #[test]
    fn test_missing_variable() {
        let renderer = TemplateRenderer::default();
        let err = renderer
            .render("import", &Context::new())
            .unwrap_err();
        assert!(matches!(
            err,
            TemplateError::MissingVariable { ref variable, .. } if variable == "path"
        ));
    }

    #[test]
    fn test_unknown_template() {
        let renderer = TemplateRenderer::default();
        let err = renderer.render("struct", &Context::new()).unwrap_err();
        assert!(matches!(err, TemplateError::NotFound(_)));
    }

    #[test]
    fn test_builtin_set_is_complete() {
        assert!(TemplateSet::builtin().missing().is_empty());
        assert_eq!(TemplateSet::new().missing().len(), TemplateSet::REQUIRED.len());
    }

    #[test]
    fn test_render_import() {
        let renderer = TemplateRenderer::default();
        let rendered = renderer
            .render("import", &context([("path", "bitflags::bitflags")]))
            .unwrap();
        assert_eq!(rendered, "use bitflags::bitflags;\n");
    }

    #[test]
    fn test_values_are_not_rescanned() {
        let renderer = TemplateRenderer::default();
        let rendered = renderer
            .render_content("inline", "{{a}}", &context([("a", "{{b}}")]))
            .unwrap();
        assert_eq!(rendered, "{{b}}");
    }
}
