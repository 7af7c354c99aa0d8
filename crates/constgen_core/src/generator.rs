//! Rust code generation for validated specs.
//!
//! Items are rendered in spec order and each rendered declaration is placed
//! ahead of the ones before it, so the emitted file lists declarations in
//! the reverse of the definition. The import block is rendered last and goes on
//! top.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use tracing::{debug, info, warn};

use constgen_spec::{BodyEntry, ItemKind, SpecDocument, SpecItem};
use constgen_templates::{context, TemplateRenderer};

use crate::error::{CoreError, CoreResult};

const ENUM_IMPORTS: [&str; 3] = [
    "num_enum::IntoPrimitive",
    "num_enum::TryFromPrimitive",
    "num_enum::UnsafeFromPrimitive",
];
const DEFAULT_IMPORT: &str = "num_enum::FromPrimitive";
const FLAGS_IMPORT: &str = "bitflags::bitflags";

const ENUM_DERIVES: [&str; 8] = [
    "Debug",
    "Copy",
    "Clone",
    "TryFromPrimitive",
    "UnsafeFromPrimitive",
    "IntoPrimitive",
    "Eq",
    "PartialEq",
];
const DEFMT_ANNOTATION: &str = r#"cfg_attr(feature = "defmt", derive(defmt::Format))"#;
const FLAGS_ANNOTATION: &str = "derive(Debug, Copy, Clone)";

const VARIANT_INDENT: &str = "    ";
const FLAG_INDENT: &str = "        ";

/// Rendered text for one spec item and the imports it needs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fragment {
    pub imports: BTreeSet<String>,
    pub text: String,
}

/// Working state of a single generation run.
#[derive(Debug, Default)]
pub struct GeneratorState {
    imports: BTreeSet<String>,
    blocks: Vec<String>,
}

impl GeneratorState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge a fragment's imports and put its text ahead of everything so far.
    pub fn absorb(&mut self, fragment: Fragment) {
        self.imports.extend(fragment.imports);
        self.blocks.insert(0, fragment.text);
    }

    pub fn imports(&self) -> &BTreeSet<String> {
        &self.imports
    }
}

/// Final generator output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedOutput {
    /// Rendered import block.
    pub imports: String,
    /// Declarations in emission order.
    pub declarations: Vec<String>,
    /// Number of distinct imports in `imports`.
    pub import_count: usize,
}

impl GeneratedOutput {
    /// Full file contents.
    pub fn text(&self) -> String {
        let mut text = self.imports.clone();
        for declaration in &self.declarations {
            text.push_str(declaration);
        }
        text
    }

    /// Overwrite `path` with the output, creating parent directories.
    pub fn write_to(&self, path: &Path) -> CoreResult<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.text())?;
        info!("Wrote {} declarations to {:?}", self.declarations.len(), path);
        Ok(())
    }
}

/// Renders spec items through the template renderer.
pub struct CodeGenerator<'a> {
    renderer: &'a TemplateRenderer,
}

impl<'a> CodeGenerator<'a> {
    pub fn new(renderer: &'a TemplateRenderer) -> Self {
        Self { renderer }
    }

    /// Render every item of the document.
    pub fn generate(&self, document: &SpecDocument) -> CoreResult<GeneratedOutput> {
        let mut state = GeneratorState::new();

        for item in &document.spec {
            let fragment = match &item.kind {
                ItemKind::Enum => self.render_enum(item)?,
                ItemKind::Flags => self.render_flags(item)?,
                ItemKind::Unsupported(kind) => return Err(CoreError::UnsupportedKind(kind.clone())),
            };
            debug!("Rendered {} {}", item.kind, item.identifier);
            state.absorb(fragment);
        }

        let imports = self.render_imports(state.imports())?;
        Ok(GeneratedOutput {
            imports,
            import_count: state.imports.len(),
            declarations: state.blocks,
        })
    }

    /// Render an import block for `imports`, in sorted order.
    pub fn render_imports(&self, imports: &BTreeSet<String>) -> CoreResult<String> {
        let lines = imports
            .iter()
            .map(|path| self.renderer.render("import", &context([("path", path.as_str())])))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(self
            .renderer
            .render("imports", &context([("imports", lines.concat())]))?)
    }

    /// Render an enum backed by `num_enum` conversions.
    pub fn render_enum(&self, item: &SpecItem) -> CoreResult<Fragment> {
        let mut imports: BTreeSet<String> = ENUM_IMPORTS.iter().map(|s| s.to_string()).collect();
        let mut derives: Vec<&str> = ENUM_DERIVES.to_vec();

        let defaults = item.default_count();
        if defaults > 0 {
            imports.insert(DEFAULT_IMPORT.to_string());
            derives.push("FromPrimitive");
        }
        if defaults > 1 {
            warn!(
                "Enum {} marks {} variants as default; num_enum accepts only one",
                item.identifier, defaults
            );
        }

        let annotations = [
            format!("derive({})", derives.join(", ")),
            DEFMT_ANNOTATION.to_string(),
            format!("repr({})", item.data_type.repr()),
        ];

        let variants = item
            .body
            .iter()
            .map(|entry| self.render_variant(entry))
            .collect::<CoreResult<Vec<_>>>()?;

        let text = self.renderer.render(
            "enum",
            &context([
                ("docs", self.render_docs(&item.comment_lines(), item.comments_from.as_deref(), "")?),
                ("attributes", self.render_attributes(&annotations, "")?),
                ("identifier", item.identifier.clone()),
                ("variants", variants.concat()),
            ]),
        )?;

        Ok(Fragment { imports, text })
    }

    /// Render a `bitflags!` set.
    pub fn render_flags(&self, item: &SpecItem) -> CoreResult<Fragment> {
        let size = item
            .data_type
            .size_in_bits()
            .ok_or_else(|| CoreError::MissingBitWidth {
                identifier: item.identifier.clone(),
                data_type: item.data_type.to_string(),
            })?;

        let flags = item
            .body
            .iter()
            .map(|entry| {
                if !entry.value.fits_unsigned(size) {
                    return Err(CoreError::FlagOutOfRange {
                        identifier: item.identifier.clone(),
                        flag: entry.identifier.clone(),
                        value: entry.value.to_string(),
                        data_type: item.data_type.to_string(),
                    });
                }
                self.renderer.render(
                    "flag",
                    &context([
                        (
                            "docs",
                            self.render_docs(
                                &entry.comment_lines(),
                                entry.comments_from.as_deref(),
                                FLAG_INDENT,
                            )?,
                        ),
                        ("identifier", entry.identifier.clone()),
                        ("value", entry.value.binary_literal(size)),
                    ]),
                )
                .map_err(CoreError::from)
            })
            .collect::<CoreResult<Vec<_>>>()?;

        let text = self.renderer.render(
            "flags",
            &context([
                (
                    "docs",
                    self.render_docs(&item.comment_lines(), item.comments_from.as_deref(), VARIANT_INDENT)?,
                ),
                (
                    "attributes",
                    self.render_attributes(&[FLAGS_ANNOTATION.to_string()], VARIANT_INDENT)?,
                ),
                ("identifier", item.identifier.clone()),
                ("data_type", item.data_type.to_string()),
                ("flags", flags.concat()),
            ]),
        )?;

        Ok(Fragment {
            imports: BTreeSet::from([FLAGS_IMPORT.to_string()]),
            text,
        })
    }

    fn render_variant(&self, entry: &BodyEntry) -> CoreResult<String> {
        let attributes = if entry.is_default {
            self.render_attributes(&["num_enum(default)".to_string()], VARIANT_INDENT)?
        } else {
            String::new()
        };

        Ok(self.renderer.render(
            "enum_variant",
            &context([
                (
                    "docs",
                    self.render_docs(
                        &entry.comment_lines(),
                        entry.comments_from.as_deref(),
                        VARIANT_INDENT,
                    )?,
                ),
                ("attributes", attributes),
                ("identifier", entry.identifier.clone()),
                ("value", entry.value.discriminant()),
            ]),
        )?)
    }

    /// Doc comment lines, followed by an include of the comment file.
    fn render_docs(
        &self,
        lines: &[String],
        comments_from: Option<&str>,
        indent: &str,
    ) -> CoreResult<String> {
        let mut docs = String::new();
        for line in lines {
            let text = if line.is_empty() {
                String::new()
            } else {
                format!(" {}", line)
            };
            docs.push_str(
                &self
                    .renderer
                    .render("doc_line", &context([("indent", indent), ("text", text.as_str())]))?,
            );
        }

        if let Some(path) = comments_from {
            let attribute = format!(
                r#"doc = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/{}"))"#,
                path.trim_start_matches("./")
            );
            docs.push_str(&self.render_attributes(&[attribute], indent)?);
        }

        Ok(docs)
    }

    fn render_attributes(&self, attributes: &[String], indent: &str) -> CoreResult<String> {
        let mut rendered = String::new();
        for attribute in attributes {
            rendered.push_str(&self.renderer.render(
                "attribute",
                &context([("indent", indent), ("attribute", attribute.as_str())]),
            )?);
        }
        Ok(rendered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use constgen_spec::{ConstValue, DataType};

    fn generate(document: &SpecDocument) -> CoreResult<GeneratedOutput> {
        let renderer = TemplateRenderer::default();
        CodeGenerator::new(&renderer).generate(document)
    }

    fn document(items: Vec<SpecItem>) -> SpecDocument {
        SpecDocument {
            version: Some("1.0.0".to_string()),
            spec: items,
        }
    }

    #[test]
    fn test_enum_rendering() {
        let item = SpecItem::new(ItemKind::Enum, "ServiceType", DataType::U8)
            .with_comments("VLCB Service Types")
            .with_entry(
                BodyEntry::new("Internal", ConstValue::Unsigned(0))
                    .with_comments("Internal service.\n\nNot listed."),
            )
            .with_entry(BodyEntry::new("MinimumNodeService", ConstValue::Unsigned(1)));

        let output = generate(&document(vec![item])).unwrap();
        let text = output.text();

        assert_eq!(
            output.imports,
            "use num_enum::IntoPrimitive;\nuse num_enum::TryFromPrimitive;\nuse num_enum::UnsafeFromPrimitive;\n"
        );
        assert!(text.contains("/// VLCB Service Types\n#[derive(Debug, Copy, Clone, TryFromPrimitive, UnsafeFromPrimitive, IntoPrimitive, Eq, PartialEq)]\n"));
        assert!(text.contains("#[cfg_attr(feature = \"defmt\", derive(defmt::Format))]\n#[repr(u8)]\npub enum ServiceType {\n"));
        assert!(text.contains("    /// Internal service.\n    ///\n    /// Not listed.\n    Internal = 0,\n"));
        assert!(text.contains("    MinimumNodeService = 1,\n}\n"));
        assert!(!text.contains("FromPrimitive)]"));
    }

    #[test]
    fn test_enum_default_variant() {
        let item = SpecItem::new(ItemKind::Enum, "Mode", DataType::I16)
            .with_entry(BodyEntry::new("Low", ConstValue::Signed(-1)))
            .with_entry(BodyEntry::new("Unknown", ConstValue::Unsigned(0)).as_default());

        let output = generate(&document(vec![item])).unwrap();
        let text = output.text();

        assert!(output.imports.contains("use num_enum::FromPrimitive;\n"));
        assert_eq!(output.import_count, 4);
        assert!(text.contains("Eq, PartialEq, FromPrimitive)]"));
        assert!(text.contains("#[repr(i16)]"));
        assert!(text.contains("    Low = -1,\n"));
        assert!(text.contains("    #[num_enum(default)]\n    Unknown = 0,\n"));
    }

    #[test]
    fn test_char_enum() {
        let item = SpecItem::new(ItemKind::Enum, "Grade", DataType::Char)
            .with_entry(BodyEntry::new("A", ConstValue::Char('a')));

        let text = generate(&document(vec![item])).unwrap().text();
        assert!(text.contains("#[repr(u32)]"));
        assert!(text.contains("    A = 'a' as u32,\n"));
    }

    #[test]
    fn test_flags_rendering() {
        let item = SpecItem::new(ItemKind::Flags, "ParamFlags", DataType::U8)
            .with_comments("Flags in PAR_FLAGS")
            .with_entry(
                BodyEntry::new("EventConsumer", ConstValue::Unsigned(1))
                    .with_comments("Module is a consumer of events"),
            )
            .with_entry(BodyEntry::new("Bootloader", ConstValue::Unsigned(8)));

        let output = generate(&document(vec![item])).unwrap();
        let text = output.text();

        assert_eq!(output.imports, "use bitflags::bitflags;\n");
        assert!(text.contains("bitflags! {\n    /// Flags in PAR_FLAGS\n    #[derive(Debug, Copy, Clone)]\n    pub struct ParamFlags: u8 {\n"));
        assert!(text.contains("        /// Module is a consumer of events\n        const EventConsumer = 0b00000001;\n"));
        assert!(text.contains("        const Bootloader = 0b00001000;\n    }\n}\n"));
    }

    #[test]
    fn test_flags_width_follows_data_type() {
        let item = SpecItem::new(ItemKind::Flags, "Wide", DataType::U16)
            .with_entry(BodyEntry::new("Top", ConstValue::Unsigned(0x8000)));

        let text = generate(&document(vec![item])).unwrap().text();
        assert!(text.contains("const Top = 0b1000000000000000;"));
    }

    #[test]
    fn test_reverse_order_and_shared_imports() {
        let first = SpecItem::new(ItemKind::Enum, "First", DataType::U8)
            .with_entry(BodyEntry::new("A", ConstValue::Unsigned(0)));
        let second = SpecItem::new(ItemKind::Enum, "Second", DataType::U8)
            .with_entry(BodyEntry::new("B", ConstValue::Unsigned(0)));

        let output = generate(&document(vec![first, second])).unwrap();
        let text = output.text();

        assert_eq!(output.import_count, 3);
        assert_eq!(output.declarations.len(), 2);
        assert!(output.declarations[0].contains("pub enum Second"));
        let imports_at = text.find("use num_enum::IntoPrimitive;").unwrap();
        let second_at = text.find("pub enum Second").unwrap();
        let first_at = text.find("pub enum First").unwrap();
        assert!(imports_at < second_at && second_at < first_at);
    }

    #[test]
    fn test_comments_from_include() {
        let mut item = SpecItem::new(ItemKind::Enum, "OpCode", DataType::U8).with_entry(
            BodyEntry::new("Ack", ConstValue::Unsigned(0x5C))
                .with_comments("General acknowledgement")
                .with_comments_from("docs/opcode/ack.md"),
        );
        item.comments_from = Some("./docs/opcodes.md".to_string());

        let text = generate(&document(vec![item])).unwrap().text();
        assert!(text.contains(
            "#[doc = include_str!(concat!(env!(\"CARGO_MANIFEST_DIR\"), \"/docs/opcodes.md\"))]\n#[derive("
        ));
        assert!(text.contains(
            "    /// General acknowledgement\n    #[doc = include_str!(concat!(env!(\"CARGO_MANIFEST_DIR\"), \"/docs/opcode/ack.md\"))]\n    Ack = 92,\n"
        ));
    }

    #[test]
    fn test_unsupported_kind_fails() {
        let item = SpecItem::new(ItemKind::Unsupported("Struct".to_string()), "S", DataType::U8);
        let err = generate(&document(vec![item])).unwrap_err();
        assert!(matches!(err, CoreError::UnsupportedKind(ref kind) if kind == "Struct"));
    }

    #[test]
    fn test_flags_without_width_fails() {
        let item = SpecItem::new(ItemKind::Flags, "Letters", DataType::Char);
        let err = generate(&document(vec![item])).unwrap_err();
        assert!(matches!(err, CoreError::MissingBitWidth { .. }));
    }

    #[test]
    fn test_flag_wider_than_data_type_fails() {
        let item = SpecItem::new(ItemKind::Flags, "ParamFlags", DataType::U8)
            .with_entry(BodyEntry::new("Overflow", ConstValue::Unsigned(256)));
        let err = generate(&document(vec![item])).unwrap_err();
        assert!(matches!(
            err,
            CoreError::FlagOutOfRange { ref flag, ref value, .. } if flag == "Overflow" && value == "256"
        ));
    }

    #[test]
    fn test_negative_flag_fails() {
        let item = SpecItem::new(ItemKind::Flags, "ParamFlags", DataType::U8)
            .with_entry(BodyEntry::new("Consumer", ConstValue::Unsigned(1)))
            .with_entry(BodyEntry::new("AllBits", ConstValue::Signed(-1)));
        let err = generate(&document(vec![item])).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Flag ParamFlags::AllBits = -1 does not fit in u8"
        );
    }

    #[test]
    fn test_empty_document() {
        let output = generate(&document(Vec::new())).unwrap();
        assert!(output.text().is_empty());
        assert_eq!(output.import_count, 0);
    }

    #[test]
    fn test_output_is_deterministic() {
        let build = || {
            document(vec![
                SpecItem::new(ItemKind::Flags, "F", DataType::U8)
                    .with_entry(BodyEntry::new("X", ConstValue::Unsigned(1))),
                SpecItem::new(ItemKind::Enum, "E", DataType::U8)
                    .with_entry(BodyEntry::new("Y", ConstValue::Unsigned(1)).as_default()),
            ])
        };
        assert_eq!(generate(&build()).unwrap(), generate(&build()).unwrap());
    }

    #[test]
    fn test_write_to_overwrites() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("out/generated.rs");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "old contents").unwrap();

        let item = SpecItem::new(ItemKind::Flags, "F", DataType::U8);
        let output = generate(&document(vec![item])).unwrap();
        output.write_to(&path).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), output.text());
    }
}
