//! Sandbox lifecycle tests
//!
//! Uses the mock schema engine to observe the sandbox at compile time and to force
//! compile failures.

use std::path::Path;

use xml_validator::{BundleValidator, ResolverConfig, SchemaLoader, ValidationError};
use xml_validator::libxml2::ValidationResult;

use crate::common::mocks::MockSchemaEngine;
use crate::common::test_helpers::{BundleFixture, INVALID_SUBMISSION, VALID_SUBMISSION, entry_count};
use tempfile::TempDir;

fn sandboxed_config(parent: &TempDir) -> ResolverConfig {
    ResolverConfig {
        sandbox_dir: Some(parent.path().to_path_buf()),
        ..Default::default()
    }
}

#[test]
fn test_sandbox_holds_flat_normalized_copies() {
    let fixture = BundleFixture::fsa029();
    let loader = SchemaLoader::with_engine(MockSchemaEngine::new(), ResolverConfig::default());

    let loaded = loader.load(fixture.folder()).unwrap();

    let calls = loader.engine().compile_calls();
    assert_eq!(calls.len(), 1);
    let call = &calls[0];
    assert_eq!(
        call.siblings,
        vec![
            "CommonTypes-Schema.xsd".to_string(),
            "FSA029-Schema.xsd".to_string(),
            "Monetary.xsd".to_string(),
        ]
    );
    assert!(call.schema_path.ends_with("FSA029-Schema.xsd"));
    assert!(call.content.contains(r#"schemaLocation="CommonTypes-Schema.xsd""#));
    assert!(!call.content.contains("../../CommonTypes/v14/"));
    assert_eq!(loaded.schema.compiled_from, call.schema_path);
}

#[test]
fn test_originals_are_never_modified() {
    let fixture = BundleFixture::fsa029();
    let before = fixture.snapshot();

    SchemaLoader::with_engine(MockSchemaEngine::new(), ResolverConfig::default())
        .load(fixture.folder())
        .unwrap();

    assert_eq!(fixture.snapshot(), before);
}

#[test]
fn test_sandbox_removed_after_success() {
    let fixture = BundleFixture::fsa029();
    let parent = TempDir::new().unwrap();

    let loaded = SchemaLoader::with_engine(MockSchemaEngine::new(), sandboxed_config(&parent))
        .load(fixture.folder())
        .unwrap();

    assert!(loaded.sandbox_path.starts_with(parent.path()));
    assert!(!loaded.sandbox_path.exists());
    assert_eq!(entry_count(parent.path()), 0);
}

#[test]
fn test_sandbox_removed_after_parse_failure() {
    let fixture = BundleFixture::fsa029();
    let parent = TempDir::new().unwrap();
    let engine = MockSchemaEngine::failing_parse(&["line 4: element 'foo' is not allowed"]);

    let result = SchemaLoader::with_engine(engine, sandboxed_config(&parent)).load(fixture.folder());

    match result {
        Err(ValidationError::SchemaParseFailure { schema, details }) => {
            assert_eq!(schema, fixture.folder().join("FSA029-Schema.xsd"));
            assert!(details.contains("element 'foo'"));
        }
        other => panic!("Expected SchemaParseFailure, got {:?}", other.map(|_| ())),
    }
    assert_eq!(entry_count(parent.path()), 0);
}

#[test]
fn test_sandbox_removed_after_load_failure() {
    let fixture = BundleFixture::fsa029();
    let parent = TempDir::new().unwrap();

    let result = SchemaLoader::with_engine(MockSchemaEngine::failing_load(), sandboxed_config(&parent))
        .load(fixture.folder());

    assert!(matches!(result, Err(ValidationError::SchemaLoadFailure { .. })));
    assert_eq!(entry_count(parent.path()), 0);
}

#[test]
fn test_missing_folder_creates_no_sandbox() {
    let parent = TempDir::new().unwrap();
    let engine = MockSchemaEngine::new();

    let result = SchemaLoader::with_engine(engine, sandboxed_config(&parent))
        .load(Path::new("/nonexistent/schema/folder"));

    assert!(matches!(result, Err(ValidationError::FolderNotFound { .. })));
    assert_eq!(entry_count(parent.path()), 0);
}

#[test]
fn test_validator_uses_compiled_schema_for_each_submission() {
    let fixture = BundleFixture::fsa029();
    let valid = fixture.write_submission("valid.xml", VALID_SUBMISSION);
    let invalid = fixture.write_submission("invalid.xml", INVALID_SUBMISSION);
    let engine = MockSchemaEngine::new().with_validation_result(ValidationResult::Invalid {
        error_count: 1,
        errors: vec!["line 4: not a decimal".to_string()],
    });

    let validator =
        BundleValidator::load_with(engine, ResolverConfig::default(), fixture.folder()).unwrap();

    assert!(validator.validate_file(&valid).unwrap().status.is_invalid());
    match validator.ensure_valid(&invalid) {
        Err(ValidationError::ValidationFailed { errors, .. }) => {
            assert_eq!(errors, vec!["line 4: not a decimal".to_string()]);
        }
        other => panic!("Expected ValidationFailed, got {:?}", other),
    }
    assert_eq!(validator.main_schema(), "FSA029-Schema.xsd");
}
