//! Integration tests for the generation pipeline.

use std::fs;
use std::path::Path;

use constgen_core::{CoreError, GeneratorConfig, NoopFormatter, Pipeline};
use constgen_spec::{CommentMaterializer, CommentRecord, SpecError, VersionAction};
use tempfile::tempdir;

fn write_project(root: &Path) {
    fs::create_dir_all(root.join("codegen")).unwrap();
    fs::write(
        root.join("Cargo.toml"),
        "[package]\nname = \"vlcb-defs\"\nversion = \"0.4.0\"\nedition = \"2021\"\n\n[dependencies]\nbitflags = \"2\"\n",
    )
    .unwrap();
    fs::write(
        root.join("codegen/opcodes.yaml"),
        r#"type: Enum
identifier: OpCode
data_type: u8
comments: VLCB opcodes list
body:
  - identifier: GeneralAcknowledgement
    value: 0x5C
    commentsFrom: docs/opcode/ack.md
  - identifier: Unknown
    value: 0xFF
    is_default: true
"#,
    )
    .unwrap();
    fs::write(
        root.join("codegen/definition.yaml"),
        r#"version: 0.5.0
spec:
  - type: Flags
    identifier: ParamFlags
    data_type: u8
    comments: Flags in PAR_FLAGS
    body:
      - identifier: Consumer
        value: 1
      - identifier: Producer
        value: 2
  - !include opcodes.yaml
"#,
    )
    .unwrap();
    fs::write(
        root.join("constgen.toml"),
        "spec_path = \"codegen/definition.yaml\"\n\n[formatter]\nenabled = false\n",
    )
    .unwrap();

    CommentMaterializer::new(root)
        .materialize(&CommentRecord {
            name: "ACK".to_string(),
            priority: "2".to_string(),
            ..Default::default()
        })
        .unwrap();
}

/// Test a full run from a config file.
#[test]
fn test_full_run_from_config() {
    let temp = tempdir().unwrap();
    let root = temp.path();
    write_project(root);

    let config = GeneratorConfig::load(root.join(GeneratorConfig::FILE_NAME)).unwrap();
    let report = Pipeline::new(config).run().unwrap();

    assert_eq!(report.items, 2);
    assert_eq!(report.imports, 5);
    assert!(report.formatter_error.is_none());
    assert!(matches!(report.version_action, Some(VersionAction::Bump { .. })));

    let text = fs::read_to_string(root.join("src/generated.rs")).unwrap();
    let imports = [
        "use bitflags::bitflags;",
        "use num_enum::FromPrimitive;",
        "use num_enum::IntoPrimitive;",
        "use num_enum::TryFromPrimitive;",
        "use num_enum::UnsafeFromPrimitive;",
    ];
    assert!(text.starts_with(&imports.join("\n")));

    // Included enum came second in the definition, so it is emitted first.
    let opcode = text.find("pub enum OpCode").unwrap();
    let flags = text.find("pub struct ParamFlags").unwrap();
    assert!(opcode < flags);

    assert!(text.contains("/docs/opcode/ack.md\"))]\n    GeneralAcknowledgement = 92,"));
    assert!(text.contains("    #[num_enum(default)]\n    Unknown = 255,"));
    assert!(text.contains("const Producer = 0b00000010;"));

    let manifest = fs::read_to_string(root.join("Cargo.toml")).unwrap();
    assert!(manifest.contains("version = \"0.5.0\""));
    assert!(manifest.contains("bitflags = \"2\""));
}

/// Test that a second run produces identical output and leaves the manifest alone.
#[test]
fn test_rerun_is_idempotent() {
    let temp = tempdir().unwrap();
    let root = temp.path();
    write_project(root);

    let config = GeneratorConfig::load(root.join(GeneratorConfig::FILE_NAME)).unwrap();
    Pipeline::new(config.clone()).run().unwrap();
    let first = fs::read_to_string(root.join("src/generated.rs")).unwrap();
    let manifest = fs::read_to_string(root.join("Cargo.toml")).unwrap();

    let report = Pipeline::new(config).run_with(&NoopFormatter).unwrap();
    assert!(matches!(report.version_action, Some(VersionAction::Unchanged(_))));
    assert_eq!(fs::read_to_string(root.join("src/generated.rs")).unwrap(), first);
    assert_eq!(fs::read_to_string(root.join("Cargo.toml")).unwrap(), manifest);
}

/// Test that a missing comment file blocks generation.
#[test]
fn test_missing_comment_file_blocks_generation() {
    let temp = tempdir().unwrap();
    let root = temp.path();
    write_project(root);
    fs::remove_file(root.join("docs/opcode/ack.md")).unwrap();

    let config = GeneratorConfig::load(root.join(GeneratorConfig::FILE_NAME)).unwrap();
    let err = Pipeline::new(config).run().unwrap_err();

    match err {
        CoreError::Spec(SpecError::Validation(errors)) => {
            assert_eq!(
                errors.messages_at("spec[1].body[0].commentsFrom"),
                vec!["file does not exist: docs/opcode/ack.md"]
            );
        }
        other => panic!("unexpected error: {}", other),
    }
    assert!(!root.join("src/generated.rs").exists());
}

/// Test template overrides from a directory.
#[test]
fn test_template_override() {
    let temp = tempdir().unwrap();
    let root = temp.path();
    write_project(root);
    fs::create_dir_all(root.join("templates")).unwrap();
    fs::write(root.join("templates/import.tmpl"), "pub use {{path}};\n").unwrap();

    let config = GeneratorConfig::load(root.join(GeneratorConfig::FILE_NAME))
        .unwrap()
        .template_dir(root.join("templates"));
    Pipeline::new(config).run().unwrap();

    let text = fs::read_to_string(root.join("src/generated.rs")).unwrap();
    assert!(text.starts_with("pub use bitflags::bitflags;\n"));
}

/// Test that a missing template directory is reported as a template error.
#[test]
fn test_missing_template_dir() {
    let temp = tempdir().unwrap();
    let root = temp.path();
    write_project(root);

    let config = GeneratorConfig::load(root.join(GeneratorConfig::FILE_NAME))
        .unwrap()
        .template_dir(root.join("no-templates"));
    let err = Pipeline::new(config).run().unwrap_err();
    assert!(matches!(err, CoreError::Template(_)));
}
