//! Data models for constant-group definitions.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use crate::comments::normalize_comments;
use crate::error::{SpecError, SpecResult};

/// The kind of constant group a spec item declares.
///
/// Unknown kinds survive typed loading so the generator can refuse them
/// itself instead of relying on validation having run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ItemKind {
    Enum,
    Flags,
    Unsupported(String),
}

impl ItemKind {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Enum => "Enum",
            Self::Flags => "Flags",
            Self::Unsupported(name) => name,
        }
    }

    /// Representations this kind may be backed by.
    pub fn allowed_data_types(&self) -> &'static [DataType] {
        match self {
            Self::Enum => &DataType::ENUM_TYPES,
            Self::Flags => &DataType::FLAGS_TYPES,
            Self::Unsupported(_) => &[],
        }
    }
}

impl From<String> for ItemKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "Enum" => Self::Enum,
            "Flags" => Self::Flags,
            _ => Self::Unsupported(value),
        }
    }
}

impl From<ItemKind> for String {
    fn from(kind: ItemKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Underlying representation of a constant group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    U8,
    U16,
    U32,
    U64,
    I8,
    I16,
    I32,
    I64,
    Char,
}

impl DataType {
    pub const ENUM_TYPES: [DataType; 9] = [
        Self::U8,
        Self::U16,
        Self::U32,
        Self::U64,
        Self::I8,
        Self::I16,
        Self::I32,
        Self::I64,
        Self::Char,
    ];

    /// Flags are always unsigned bit patterns.
    pub const FLAGS_TYPES: [DataType; 4] = [Self::U8, Self::U16, Self::U32, Self::U64];

    pub fn parse(name: &str) -> Option<Self> {
        Self::ENUM_TYPES.into_iter().find(|t| t.as_str() == name)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::U8 => "u8",
            Self::U16 => "u16",
            Self::U32 => "u32",
            Self::U64 => "u64",
            Self::I8 => "i8",
            Self::I16 => "i16",
            Self::I32 => "i32",
            Self::I64 => "i64",
            Self::Char => "char",
        }
    }

    pub fn is_unsigned(&self) -> bool {
        self.as_str().starts_with('u')
    }

    pub fn is_signed(&self) -> bool {
        self.as_str().starts_with('i')
    }

    /// Width in bits, taken from the name with its class letter stripped.
    /// `char` has no width in its name and yields `None`.
    pub fn size_in_bits(&self) -> Option<u32> {
        self.as_str()[1..].parse().ok()
    }

    /// Integer type used for `#[repr(..)]`. Rust has no `repr(char)`, so
    /// character groups are stored as their `u32` scalar value.
    pub fn repr(&self) -> &'static str {
        match self {
            Self::Char => "u32",
            other => other.as_str(),
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The value of a single constant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConstValue {
    Unsigned(u64),
    Signed(i64),
    Char(char),
}

impl ConstValue {
    /// Rust expression for this value as an enum discriminant.
    pub fn discriminant(&self) -> String {
        match self {
            Self::Unsigned(v) => v.to_string(),
            Self::Signed(v) => v.to_string(),
            Self::Char(c) => format!("{:?} as u32", c),
        }
    }

    /// Check if the value is non-negative and representable in `width` bits.
    pub fn fits_unsigned(&self, width: u32) -> bool {
        let bits = match self {
            Self::Unsigned(v) => *v,
            Self::Signed(v) if *v >= 0 => *v as u64,
            Self::Signed(_) => return false,
            Self::Char(c) => *c as u64,
        };
        width >= u64::BITS || bits >> width == 0
    }

    /// Binary literal zero-padded to `width` bits, for flag constants.
    pub fn binary_literal(&self, width: u32) -> String {
        let width = width as usize;
        match self {
            Self::Unsigned(v) => format!("0b{:0width$b}", v, width = width),
            Self::Signed(v) => format!("0b{:0width$b}", v, width = width),
            Self::Char(c) => format!("0b{:0width$b}", *c as u32, width = width),
        }
    }
}

impl fmt::Display for ConstValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unsigned(v) => write!(f, "{}", v),
            Self::Signed(v) => write!(f, "{}", v),
            Self::Char(c) => write!(f, "{:?}", c),
        }
    }
}

/// One named constant: an enum variant or a flag bit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodyEntry {
    pub identifier: String,
    pub value: ConstValue,
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "std::ops::Not::not"
    )]
    pub is_default: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comments: Option<String>,
    #[serde(default, rename = "commentsFrom", skip_serializing_if = "Option::is_none")]
    pub comments_from: Option<String>,
}

impl BodyEntry {
    pub fn new(identifier: impl Into<String>, value: ConstValue) -> Self {
        Self {
            identifier: identifier.into(),
            value,
            is_default: false,
            comments: None,
            comments_from: None,
        }
    }

    pub fn with_comments(mut self, comments: impl Into<String>) -> Self {
        self.comments = Some(comments.into());
        self
    }

    pub fn with_comments_from(mut self, path: impl Into<String>) -> Self {
        self.comments_from = Some(path.into());
        self
    }

    pub fn as_default(mut self) -> Self {
        self.is_default = true;
        self
    }

    pub fn comment_lines(&self) -> Vec<String> {
        normalize_comments(self.comments.as_deref())
    }
}

/// One declared type to generate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecItem {
    #[serde(rename = "type")]
    pub kind: ItemKind,
    pub identifier: String,
    pub data_type: DataType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comments: Option<String>,
    #[serde(default, rename = "commentsFrom", skip_serializing_if = "Option::is_none")]
    pub comments_from: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub body: Vec<BodyEntry>,
}

impl SpecItem {
    pub fn new(kind: ItemKind, identifier: impl Into<String>, data_type: DataType) -> Self {
        Self {
            kind,
            identifier: identifier.into(),
            data_type,
            comments: None,
            comments_from: None,
            body: Vec::new(),
        }
    }

    pub fn with_comments(mut self, comments: impl Into<String>) -> Self {
        self.comments = Some(comments.into());
        self
    }

    pub fn with_entry(mut self, entry: BodyEntry) -> Self {
        self.body.push(entry);
        self
    }

    pub fn comment_lines(&self) -> Vec<String> {
        normalize_comments(self.comments.as_deref())
    }

    /// Number of entries marked as the fallback variant.
    pub fn default_count(&self) -> usize {
        self.body.iter().filter(|e| e.is_default).count()
    }
}

/// Top-level definition document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub spec: Vec<SpecItem>,
}

impl SpecDocument {
    /// Build the typed document without running the schema validator.
    pub fn from_value(value: serde_yaml::Value) -> SpecResult<Self> {
        Ok(serde_yaml::from_value(value)?)
    }

    pub fn from_yaml_str(content: &str) -> SpecResult<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Parsed declared version, if the document carries one.
    pub fn declared_version(&self) -> SpecResult<Option<semver::Version>> {
        self.version
            .as_deref()
            .map(|v| {
                semver::Version::parse(v).map_err(|e| SpecError::InvalidVersion {
                    version: v.to_string(),
                    message: e.to_string(),
                })
            })
            .transpose()
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_kind_round_trip() {
        assert_eq!(ItemKind::from("Enum".to_string()), ItemKind::Enum);
        assert_eq!(ItemKind::from("Flags".to_string()), ItemKind::Flags);
        assert_eq!(
            ItemKind::from("Struct".to_string()),
            ItemKind::Unsupported("Struct".to_string())
        );
        assert_eq!(String::from(ItemKind::Flags), "Flags");
    }

    #[test]
    fn test_data_type_sizes() {
        assert_eq!(DataType::U8.size_in_bits(), Some(8));
        assert_eq!(DataType::U64.size_in_bits(), Some(64));
        assert_eq!(DataType::I16.size_in_bits(), Some(16));
        assert_eq!(DataType::Char.size_in_bits(), None);
        assert_eq!(DataType::Char.repr(), "u32");
        assert_eq!(DataType::parse("i32"), Some(DataType::I32));
        assert_eq!(DataType::parse("f32"), None);
    }

    #[test]
    fn test_flags_types_are_unsigned() {
        assert!(DataType::FLAGS_TYPES.iter().all(DataType::is_unsigned));
        assert!(!ItemKind::Flags.allowed_data_types().contains(&DataType::Char));
        assert!(ItemKind::Enum.allowed_data_types().contains(&DataType::Char));
    }

    #[test]
    fn test_const_value_rendering() {
        assert_eq!(ConstValue::Unsigned(5).binary_literal(8), "0b00000101");
        assert!(ConstValue::Unsigned(255).fits_unsigned(8));
        assert!(!ConstValue::Unsigned(256).fits_unsigned(8));
        assert!(!ConstValue::Signed(-1).fits_unsigned(8));
        assert!(ConstValue::Signed(3).fits_unsigned(8));
        assert!(ConstValue::Unsigned(u64::MAX).fits_unsigned(64));
        assert_eq!(ConstValue::Signed(-3).discriminant(), "-3");
        assert_eq!(ConstValue::Char('a').discriminant(), "'a' as u32");
    }

    #[test]
    fn test_document_from_yaml() {
        let doc = SpecDocument::from_yaml_str(
            r#"
version: 1.0.0
spec:
  - type: Enum
    identifier: Mode
    data_type: u8
    body:
      - identifier: Off
        value: 0
        is_default: true
      - identifier: On
        value: 0x01
        is_default: ~
  - type: Enum
    identifier: Grade
    data_type: char
    body:
      - identifier: A
        value: "a"
"#,
        )
        .unwrap();

        assert_eq!(doc.spec.len(), 2);
        let mode = &doc.spec[0];
        assert_eq!(mode.kind, ItemKind::Enum);
        assert_eq!(mode.body[1].value, ConstValue::Unsigned(1));
        assert!(!mode.body[1].is_default);
        assert_eq!(mode.default_count(), 1);
        assert_eq!(doc.spec[1].body[0].value, ConstValue::Char('a'));
        assert_eq!(
            doc.declared_version().unwrap(),
            Some(semver::Version::new(1, 0, 0))
        );
    }
}
