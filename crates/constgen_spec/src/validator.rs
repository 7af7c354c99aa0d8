//! Schema validation for spec documents.
//!
//! Validation runs over the loaded YAML tree rather than the typed model so
//! every violation can be reported with its exact location, and so a single
//! pass reports all of them. A clean document is then converted into
//! [`SpecDocument`].

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use serde::{Serialize, Serializer};
use serde_yaml::{Mapping, Value};
use tracing::debug;

use crate::models::{DataType, ItemKind, SpecDocument};

/// One step in a field location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

/// Location of a field inside the document, rendered as `spec[0].body[2].value`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldPath(Vec<PathSegment>);

impl FieldPath {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn key(&self, key: impl Into<String>) -> Self {
        let mut segments = self.0.clone();
        segments.push(PathSegment::Key(key.into()));
        Self(segments)
    }

    pub fn index(&self, index: usize) -> Self {
        let mut segments = self.0.clone();
        segments.push(PathSegment::Index(index));
        Self(segments)
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("<root>");
        }
        for (i, segment) in self.0.iter().enumerate() {
            match segment {
                PathSegment::Key(key) if i == 0 => write!(f, "{}", key)?,
                PathSegment::Key(key) => write!(f, ".{}", key)?,
                PathSegment::Index(index) => write!(f, "[{}]", index)?,
            }
        }
        Ok(())
    }
}

/// A single rule violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub path: FieldPath,
    pub message: String,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.path, self.message)
    }
}

/// Every violation found in a document, in discovery order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, path: FieldPath, message: impl Into<String>) {
        self.errors.push(FieldError {
            path,
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.errors.iter()
    }

    /// Messages recorded for the field rendered as `path`.
    pub fn messages_at(&self, path: &str) -> Vec<&str> {
        self.errors
            .iter()
            .filter(|e| e.path.to_string() == path)
            .map(|e| e.message.as_str())
            .collect()
    }

    /// Structured report: field location to its messages.
    pub fn to_map(&self) -> BTreeMap<String, Vec<String>> {
        let mut map: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for error in &self.errors {
            map.entry(error.path.to_string())
                .or_default()
                .push(error.message.clone());
        }
        map
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self.errors.iter().map(ToString::to_string).collect();
        f.write_str(&rendered.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

impl Serialize for ValidationErrors {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.to_map())
    }
}

/// Whether the top-level `version` is checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VersionPolicy {
    /// `version` must be present and a valid semantic version.
    #[default]
    Required,
    /// `version` is optional and not parsed.
    Disabled,
}

/// Validator settings.
#[derive(Debug, Clone)]
pub struct ValidatorOptions {
    /// Root that `commentsFrom` paths are resolved against.
    pub project_root: PathBuf,
    pub version_policy: VersionPolicy,
}

impl Default for ValidatorOptions {
    fn default() -> Self {
        Self {
            project_root: PathBuf::from("."),
            version_policy: VersionPolicy::default(),
        }
    }
}

impl ValidatorOptions {
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
            ..Default::default()
        }
    }

    pub fn version_policy(mut self, policy: VersionPolicy) -> Self {
        self.version_policy = policy;
        self
    }
}

/// Validator for spec documents.
pub struct SchemaValidator {
    options: ValidatorOptions,
}

impl SchemaValidator {
    pub fn new(options: ValidatorOptions) -> Self {
        Self { options }
    }

    /// Validate a loaded document and convert it to the typed model.
    pub fn validate(&self, document: &Value) -> Result<SpecDocument, ValidationErrors> {
        let errors = self.check(document);
        if !errors.is_empty() {
            debug!("Validation found {} error(s)", errors.len());
            return Err(errors);
        }

        serde_yaml::from_value(document.clone()).map_err(|e| {
            let mut errors = ValidationErrors::new();
            errors.add(FieldPath::root(), e.to_string());
            errors
        })
    }

    /// Collect every violation without converting.
    pub fn check(&self, document: &Value) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        let root = FieldPath::root();

        let Some(map) = document.as_mapping() else {
            errors.add(root, "must be a hash");
            return errors;
        };

        self.check_version(map, &root, &mut errors);

        let spec_path = root.key("spec");
        match map.get("spec") {
            None | Some(Value::Null) => errors.add(spec_path, "is missing"),
            Some(Value::Sequence(items)) => {
                for (index, item) in items.iter().enumerate() {
                    self.check_item(item, &spec_path.index(index), &mut errors);
                }
            }
            Some(_) => errors.add(spec_path, "must be an array"),
        }

        errors
    }

    fn check_version(&self, map: &Mapping, root: &FieldPath, errors: &mut ValidationErrors) {
        let path = root.key("version");
        match (map.get("version"), self.options.version_policy) {
            (None | Some(Value::Null), VersionPolicy::Required) => errors.add(path, "is missing"),
            (None | Some(Value::Null), VersionPolicy::Disabled) => {}
            (Some(Value::String(version)), VersionPolicy::Required) => {
                if semver::Version::parse(version).is_err() {
                    errors.add(path, "must be a valid semver version");
                }
            }
            (Some(Value::String(_)), VersionPolicy::Disabled) => {}
            (Some(_), _) => errors.add(path, "must be a string"),
        }
    }

    fn check_item(&self, item: &Value, path: &FieldPath, errors: &mut ValidationErrors) {
        let Some(map) = item.as_mapping() else {
            errors.add(path.clone(), "must be a hash");
            return;
        };

        let kind = match map.get("type") {
            None | Some(Value::Null) => {
                errors.add(path.key("type"), "is missing");
                None
            }
            Some(Value::String(name)) => match ItemKind::from(name.clone()) {
                ItemKind::Unsupported(_) => {
                    errors.add(path.key("type"), "must be either Enum or Flags");
                    None
                }
                kind => Some(kind),
            },
            Some(_) => {
                errors.add(path.key("type"), "must be a string");
                None
            }
        };

        check_identifier(map, path, errors);
        let data_type = kind
            .as_ref()
            .and_then(|kind| check_data_type(map, kind, path, errors));
        check_optional_string(map, "comments", path, errors);
        self.check_comments_from(map, path, errors);

        let body_path = path.key("body");
        let entries = match map.get("body") {
            None | Some(Value::Null) => return,
            Some(Value::Sequence(entries)) => entries,
            Some(_) => {
                errors.add(body_path, "must be an array");
                return;
            }
        };

        for (index, entry) in entries.iter().enumerate() {
            let entry_path = body_path.index(index);
            let Some(entry) = entry.as_mapping() else {
                errors.add(entry_path, "must be a hash");
                continue;
            };
            match kind {
                Some(ItemKind::Enum) => self.check_enum_entry(entry, data_type, &entry_path, errors),
                Some(ItemKind::Flags) => self.check_flags_entry(entry, &entry_path, errors),
                _ => {}
            }
        }
    }

    /// Enum variants are checked against the parent's representation.
    fn check_enum_entry(
        &self,
        entry: &Mapping,
        data_type: Option<DataType>,
        path: &FieldPath,
        errors: &mut ValidationErrors,
    ) {
        check_identifier(entry, path, errors);

        let value_path = path.key("value");
        match entry.get("value") {
            None | Some(Value::Null) => errors.add(value_path, "is missing"),
            Some(value) => {
                if let Some(data_type) = data_type {
                    if let Some(message) = enum_value_error(value, data_type) {
                        errors.add(value_path, message);
                    }
                }
            }
        }

        check_optional_bool(entry, "is_default", path, errors);
        check_optional_string(entry, "comments", path, errors);
        self.check_comments_from(entry, path, errors);
    }

    fn check_flags_entry(&self, entry: &Mapping, path: &FieldPath, errors: &mut ValidationErrors) {
        check_identifier(entry, path, errors);

        let value_path = path.key("value");
        match entry.get("value") {
            None | Some(Value::Null) => errors.add(value_path, "is missing"),
            Some(value) if !is_integer(value) => errors.add(value_path, "must be an integer"),
            Some(_) => {}
        }

        check_optional_bool(entry, "is_default", path, errors);
        check_optional_string(entry, "comments", path, errors);
        self.check_comments_from(entry, path, errors);
    }

    fn check_comments_from(&self, map: &Mapping, path: &FieldPath, errors: &mut ValidationErrors) {
        let field = path.key("commentsFrom");
        match map.get("commentsFrom") {
            None | Some(Value::Null) => {}
            Some(Value::String(relative)) => {
                if !self.options.project_root.join(relative).is_file() {
                    errors.add(field, format!("file does not exist: {}", relative));
                }
            }
            Some(_) => errors.add(field, "must be a string"),
        }
    }
}

fn check_identifier(map: &Mapping, path: &FieldPath, errors: &mut ValidationErrors) {
    let field = path.key("identifier");
    match map.get("identifier") {
        None | Some(Value::Null) => errors.add(field, "is missing"),
        Some(Value::String(identifier)) if identifier.is_empty() => {
            errors.add(field, "must be filled")
        }
        Some(Value::String(identifier)) => {
            if identifier.starts_with(|c: char| c.is_ascii_digit()) {
                errors.add(field, "must not start with a digit");
            }
        }
        Some(_) => errors.add(field, "must be a string"),
    }
}

/// Legal representation for the item, if one was given.
fn check_data_type(
    map: &Mapping,
    kind: &ItemKind,
    path: &FieldPath,
    errors: &mut ValidationErrors,
) -> Option<DataType> {
    let field = path.key("data_type");
    let allowed = kind.allowed_data_types();
    match map.get("data_type") {
        None | Some(Value::Null) => {
            errors.add(field, "must be present");
            None
        }
        Some(Value::String(name)) => match DataType::parse(name) {
            Some(data_type) if allowed.contains(&data_type) => Some(data_type),
            _ => {
                let names: Vec<&str> = allowed.iter().map(DataType::as_str).collect();
                errors.add(field, format!("must be one of: {}", names.join(", ")));
                None
            }
        },
        Some(_) => {
            errors.add(field, "must be a string");
            None
        }
    }
}

fn check_optional_string(map: &Mapping, key: &str, path: &FieldPath, errors: &mut ValidationErrors) {
    match map.get(key) {
        None | Some(Value::Null) | Some(Value::String(_)) => {}
        Some(_) => errors.add(path.key(key), "must be a string"),
    }
}

fn check_optional_bool(map: &Mapping, key: &str, path: &FieldPath, errors: &mut ValidationErrors) {
    match map.get(key) {
        None | Some(Value::Null) | Some(Value::Bool(_)) => {}
        Some(_) => errors.add(path.key(key), "must be a boolean"),
    }
}

fn is_integer(value: &Value) -> bool {
    matches!(value, Value::Number(n) if n.is_i64() || n.is_u64())
}

fn enum_value_error(value: &Value, data_type: DataType) -> Option<&'static str> {
    if data_type.is_unsigned() {
        let non_negative = matches!(value, Value::Number(n) if n.is_u64());
        (!non_negative).then_some("must be a positive integer")
    } else if data_type.is_signed() {
        (!is_integer(value)).then_some("must be an integer")
    } else {
        let single = matches!(value, Value::String(s) if s.chars().count() == 1);
        (!single).then_some("must be a single character")
    }
}
