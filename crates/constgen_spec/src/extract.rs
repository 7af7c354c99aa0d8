//! Conversion of extracted table rows into spec entries.
//!
//! Rows come from an external table extractor as `[key, subkey, value]`
//! triples. A row keyed `Name` opens a new record; the following rows fill
//! it in until the next `Name`.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use regex::{Captures, Regex};
use serde_yaml::{Mapping, Value};
use tracing::{debug, info};

use crate::comments::{CommentMaterializer, CommentRecord};
use crate::error::{SpecError, SpecResult};
use crate::models::{BodyEntry, ConstValue};

/// One `[key, subkey, value]` row.
pub type TableRow = [String; 3];

/// Fields collected for one constant, keyed by `key + subkey`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedRecord {
    fields: BTreeMap<String, String>,
}

impl ExtractedRecord {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(key.into(), value.into());
    }

    fn field(&self, key: &str) -> String {
        self.get(key).unwrap_or_default().to_string()
    }

    fn comment_record(&self, name: &str) -> CommentRecord {
        CommentRecord {
            name: name.to_string(),
            priority: self.field("Priority"),
            services: self.field("Services"),
            parameters: self.field("Parameters"),
            conditions: self.field("Conditions"),
            direction: self.field("Direction"),
            modes: self.field("States / Modes"),
            result: self.field("Result"),
        }
    }
}

/// Read rows from a JSON array of triples.
pub fn read_rows(path: impl AsRef<Path>) -> SpecResult<Vec<TableRow>> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Group rows into records. Rows before the first `Name` row are dropped.
pub fn group_records(rows: &[TableRow]) -> Vec<ExtractedRecord> {
    let mut records = Vec::new();
    let mut current: Option<ExtractedRecord> = None;

    for [key, subkey, value] in rows {
        // The decimal value row comes without a key.
        let key = if key.is_empty() && subkey == "Decimal" {
            "Value"
        } else {
            key.as_str()
        };

        if key == "Name" {
            records.extend(current.take());
            current = Some(ExtractedRecord::default());
        }

        if let Some(record) = current.as_mut() {
            record.insert(format!("{}{}", key, subkey), value.clone());
        }
    }

    records.extend(current);
    records
}

/// Turn free text into a PascalCase identifier, keeping only letters.
pub fn to_identifier(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_ascii_alphabetic() || c.is_whitespace())
        .collect::<String>()
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                None => String::new(),
                Some(first) => {
                    first.to_ascii_uppercase().to_string() + &chars.as_str().to_ascii_lowercase()
                }
            }
        })
        .collect()
}

/// Build the spec entry for a record, writing its comment file.
pub fn record_to_entry(
    record: &ExtractedRecord,
    materializer: &CommentMaterializer,
) -> SpecResult<BodyEntry> {
    let name = record
        .get("Name")
        .filter(|name| !name.is_empty())
        .ok_or_else(|| SpecError::Extraction("record without a name".to_string()))?;
    let description = record
        .get("Description")
        .ok_or_else(|| SpecError::Extraction(format!("{}: missing Description", name)))?;

    let identifier = to_identifier(description.lines().next().unwrap_or_default());
    if identifier.is_empty() {
        return Err(SpecError::Extraction(format!(
            "{}: description yields an empty identifier",
            name
        )));
    }

    let value = parse_value(name, record)?;
    let comments = match record.get("Comment") {
        Some(comment) => format!("{}\n{}", description, comment),
        None => description.to_string(),
    };
    let comments_from = materializer.materialize(&record.comment_record(name))?;

    debug!("Extracted {} as {} = {}", name, identifier, value);
    Ok(BodyEntry::new(identifier, value)
        .with_comments(comments)
        .with_comments_from(comments_from))
}

/// Convert every record, stopping at the first malformed one.
pub fn extract_entries(
    rows: &[TableRow],
    materializer: &CommentMaterializer,
) -> SpecResult<Vec<BodyEntry>> {
    group_records(rows)
        .iter()
        .map(|record| record_to_entry(record, materializer))
        .collect()
}

/// Replace the `body` of the item document at `path`, writing values as
/// hexadecimal literals. The body is written after the other keys.
pub fn update_spec_body(path: impl AsRef<Path>, entries: &[BodyEntry]) -> SpecResult<()> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)?;
    let mut document: Value = serde_yaml::from_str(&content)?;

    let Some(map) = document.as_mapping_mut() else {
        return Err(SpecError::Extraction(format!(
            "{:?} does not contain a mapping",
            path
        )));
    };
    map.remove("body");

    let mut rendered = if map.is_empty() {
        String::new()
    } else {
        serde_yaml::to_string(&document)?
    };

    // Only the body goes through the hex rewrite, so block scalars elsewhere
    // in the document are never touched.
    let mut body = Mapping::new();
    body.insert(Value::String("body".to_string()), serde_yaml::to_value(entries)?);
    rendered.push_str(&hex_values(&serde_yaml::to_string(&body)?));

    fs::write(path, rendered)?;
    info!("Wrote {} entries to {:?}", entries.len(), path);
    Ok(())
}

fn parse_value(name: &str, record: &ExtractedRecord) -> SpecResult<ConstValue> {
    let invalid = |field: &str, raw: &str| {
        SpecError::Extraction(format!("{}: invalid {} '{}'", name, field, raw))
    };

    if let Some(hex) = record.get("ValueHex").filter(|v| !v.trim().is_empty()) {
        let digits = hex.trim().trim_start_matches("0x").trim_start_matches("0X");
        return u64::from_str_radix(digits, 16)
            .map(ConstValue::Unsigned)
            .map_err(|_| invalid("ValueHex", hex));
    }
    if let Some(decimal) = record.get("ValueDecimal").filter(|v| !v.trim().is_empty()) {
        return decimal
            .trim()
            .parse()
            .map(ConstValue::Unsigned)
            .map_err(|_| invalid("ValueDecimal", decimal));
    }
    Err(SpecError::Extraction(format!("{}: missing value", name)))
}

/// Rewrite entry-level `value` keys of a serialized body as hex. Entries sit
/// at column zero under `body:`, so their keys are `- ` or two-space
/// indented while block scalar lines inside an entry are indented further.
fn hex_values(yaml: &str) -> String {
    static ENTRY_VALUE: OnceLock<Regex> = OnceLock::new();
    let pattern = ENTRY_VALUE
        .get_or_init(|| Regex::new(r"(?m)^(- |  )(value: )(\d+)$").expect("valid value pattern"));
    pattern
        .replace_all(yaml, |caps: &Captures| match caps[3].parse::<u64>() {
            Ok(value) => format!("{}{}0x{:02X}", &caps[1], &caps[2], value),
            Err(_) => caps[0].to_string(),
        })
        .into_owned()
}
