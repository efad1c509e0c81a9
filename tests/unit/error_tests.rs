//! Error type tests
//!
//! Messages and conversions of the error taxonomy.

use std::path::{Path, PathBuf};
use xml_validator::{LibXml2Error, ValidationError};

#[test]
fn test_io_error_conversion() {
    let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
    let validation_error: ValidationError = io_error.into();

    assert!(matches!(validation_error, ValidationError::Io(_)));
    assert!(validation_error.to_string().contains("File not found"));
}

#[test]
fn test_folder_error_messages() {
    let not_found = ValidationError::FolderNotFound {
        path: PathBuf::from("/schemas/fsa029"),
    };
    let not_dir = ValidationError::PathNotADirectory {
        path: PathBuf::from("/schemas/readme.txt"),
    };
    let empty = ValidationError::NoSchemasFound {
        path: PathBuf::from("/schemas/empty"),
    };

    assert_eq!(not_found.to_string(), "Schema folder not found: /schemas/fsa029");
    assert_eq!(not_dir.to_string(), "Path is not a directory: /schemas/readme.txt");
    assert!(empty.to_string().contains(".xsd"));
}

#[test]
fn test_validation_failed_error() {
    let validation_error = ValidationError::ValidationFailed {
        file: PathBuf::from("submission.xml"),
        errors: vec!["Missing required element".to_string()],
    };

    let message = validation_error.to_string();
    assert!(message.contains("submission.xml"));
    assert!(message.contains("Missing required element"));
}

#[test]
fn test_compile_errors_name_the_original_schema() {
    let schema = PathBuf::from("/schemas/FSA029-Schema.xsd");

    let error = ValidationError::from_compile_error(
        LibXml2Error::SchemaLoadFailed {
            errors: vec!["failed to locate a schema at 'Missing.xsd'".to_string()],
        },
        schema.clone(),
        Path::new("/tmp/xml-validator-XXXXXX"),
    );

    match error {
        ValidationError::SchemaLoadFailure { schema: named, details } => {
            assert_eq!(named, schema);
            assert!(details.contains("Missing.xsd"));
        }
        other => panic!("Expected SchemaLoadFailure, got {:?}", other),
    }
}
