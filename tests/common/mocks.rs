use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};

use xml_validator::libxml2::{SchemaEngine, ValidationResult};
use xml_validator::{LibXml2Error, error::LibXml2Result};

/// What a [`MockSchemaEngine`] saw when it was asked to compile a schema
#[derive(Clone, Debug)]
pub struct CompileCall {
    pub schema_path: PathBuf,
    /// Bare file names present next to the schema at compile time
    pub siblings: Vec<String>,
    /// Content of the schema file at compile time
    pub content: String,
}

/// How a [`MockSchemaEngine`] answers compile requests
#[derive(Clone, Debug)]
pub enum CompileBehavior {
    Succeed,
    ParseFailure(Vec<String>),
    LoadFailure(Vec<String>),
}

/// Schema engine that records compile requests and answers with preset results
pub struct MockSchemaEngine {
    compile_behavior: CompileBehavior,
    validation_result: ValidationResult,
    compile_log: RefCell<Vec<CompileCall>>,
    validate_log: RefCell<Vec<PathBuf>>,
}

impl MockSchemaEngine {
    pub fn new() -> Self {
        Self {
            compile_behavior: CompileBehavior::Succeed,
            validation_result: ValidationResult::Valid,
            compile_log: RefCell::new(Vec::new()),
            validate_log: RefCell::new(Vec::new()),
        }
    }

    pub fn failing_parse(errors: &[&str]) -> Self {
        Self {
            compile_behavior: CompileBehavior::ParseFailure(
                errors.iter().map(|e| e.to_string()).collect(),
            ),
            ..Self::new()
        }
    }

    pub fn failing_load() -> Self {
        Self {
            compile_behavior: CompileBehavior::LoadFailure(Vec::new()),
            ..Self::new()
        }
    }

    pub fn with_validation_result(mut self, result: ValidationResult) -> Self {
        self.validation_result = result;
        self
    }

    pub fn compile_calls(&self) -> Vec<CompileCall> {
        self.compile_log.borrow().clone()
    }

    pub fn validated_files(&self) -> Vec<PathBuf> {
        self.validate_log.borrow().clone()
    }
}

impl Default for MockSchemaEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Compiled "schema" handed out by [`MockSchemaEngine`]
#[derive(Debug)]
pub struct MockSchema {
    pub compiled_from: PathBuf,
}

impl SchemaEngine for MockSchemaEngine {
    type Schema = MockSchema;

    fn compile_schema(&self, schema_path: &Path) -> LibXml2Result<MockSchema> {
        let siblings = schema_path
            .parent()
            .and_then(|dir| fs::read_dir(dir).ok())
            .map(|entries| {
                let mut names: Vec<String> = entries
                    .filter_map(|entry| entry.ok())
                    .map(|entry| entry.file_name().to_string_lossy().into_owned())
                    .collect();
                names.sort();
                names
            })
            .unwrap_or_default();

        self.compile_log.borrow_mut().push(CompileCall {
            schema_path: schema_path.to_path_buf(),
            siblings,
            content: fs::read_to_string(schema_path).unwrap_or_default(),
        });

        match &self.compile_behavior {
            CompileBehavior::Succeed => Ok(MockSchema {
                compiled_from: schema_path.to_path_buf(),
            }),
            CompileBehavior::ParseFailure(errors) => Err(LibXml2Error::SchemaParseFailed {
                errors: errors.clone(),
            }),
            CompileBehavior::LoadFailure(errors) => Err(LibXml2Error::SchemaLoadFailed {
                errors: errors.clone(),
            }),
        }
    }

    fn validate_file(
        &self,
        _schema: &MockSchema,
        file_path: &Path,
    ) -> LibXml2Result<ValidationResult> {
        self.validate_log.borrow_mut().push(file_path.to_path_buf());
        Ok(self.validation_result.clone())
    }
}
