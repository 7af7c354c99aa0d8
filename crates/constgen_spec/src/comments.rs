//! Per-constant comment files and comment normalization.
//!
//! Comment files are produced upstream of generation, while rows are turned
//! into spec entries. Their paths end up in `commentsFrom`, which the schema
//! validator later requires to exist.

use std::fs;
use std::path::PathBuf;

use tracing::debug;

use crate::error::SpecResult;

/// Split a block comment into lines. Absent comments yield no lines.
pub fn normalize_comments(comments: Option<&str>) -> Vec<String> {
    comments
        .map(|text| text.lines().map(str::to_string).collect())
        .unwrap_or_default()
}

/// Descriptive fields harvested for one constant.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommentRecord {
    pub name: String,
    pub priority: String,
    pub services: String,
    pub parameters: String,
    pub conditions: String,
    pub direction: String,
    pub modes: String,
    pub result: String,
}

impl CommentRecord {
    /// Render the fixed-format block. `label` names the identifying line.
    pub fn render(&self, label: &str) -> String {
        [
            (label, &self.name),
            ("Priority", &self.priority),
            ("Services", &self.services),
            ("Parameters", &self.parameters),
            ("Conditions", &self.conditions),
            ("Direction", &self.direction),
            ("States / Modes", &self.modes),
            ("Result", &self.result),
        ]
        .iter()
        .map(|(key, value)| format!("# {}: {}", key, value))
        .collect::<Vec<_>>()
        .join("\n")
    }
}

/// Writes comment files under a fixed directory of the project root.
#[derive(Debug, Clone)]
pub struct CommentMaterializer {
    project_root: PathBuf,
    comments_dir: String,
    label: String,
}

impl CommentMaterializer {
    pub const DEFAULT_DIR: &'static str = "docs/opcode";
    pub const DEFAULT_LABEL: &'static str = "Opcode";

    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
            comments_dir: Self::DEFAULT_DIR.to_string(),
            label: Self::DEFAULT_LABEL.to_string(),
        }
    }

    pub fn comments_dir(mut self, dir: impl Into<String>) -> Self {
        self.comments_dir = dir.into().trim_end_matches('/').to_string();
        self
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Project-relative path of the comment file for `name`.
    pub fn relative_path(&self, name: &str) -> String {
        format!("{}/{}.md", self.comments_dir, name.to_lowercase())
    }

    /// Write the record's comment file, replacing any existing one, and
    /// return the project-relative path for `commentsFrom`.
    pub fn materialize(&self, record: &CommentRecord) -> SpecResult<String> {
        let relative = self.relative_path(&record.name);
        let path = self.project_root.join(&relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        debug!("Writing comment file {:?}", path);
        fs::write(&path, record.render(&self.label))?;
        Ok(relative)
    }
}
