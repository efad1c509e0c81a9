use std::path::{Path, PathBuf};

use thiserror::Error;

/// Main application error type that encompasses all possible failure modes
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Schema folder not found: {path}")]
    FolderNotFound { path: PathBuf },

    #[error("Path is not a directory: {path}")]
    PathNotADirectory { path: PathBuf },

    #[error("Cannot access schema folder (permission denied): {path}")]
    FolderAccessDenied {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No .xsd files found in {path}")]
    NoSchemasFound { path: PathBuf },

    #[error("No schemas to analyze: unable to determine the main schema")]
    NoMainSchemaDetermined,

    #[error("Main schema {name} is not one of the schemas in {folder}")]
    MainSchemaNotFound { name: String, folder: PathBuf },

    #[error("Schema parsing error: {schema} - {details}")]
    SchemaParseFailure { schema: PathBuf, details: String },

    #[error("Schema loading error: {schema} - {details}")]
    SchemaLoadFailure { schema: PathBuf, details: String },

    #[error("Submission file not found: {path}")]
    SubmissionNotFound { path: PathBuf },

    #[error("XML validation failed: {file} - {}", .errors.join("; "))]
    ValidationFailed { file: PathBuf, errors: Vec<String> },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("LibXML2 internal error: {details}")]
    LibXml2Internal { details: String },
}

/// LibXML2-specific error types
#[derive(Error, Debug)]
pub enum LibXml2Error {
    #[error("Schema parsing failed: {}", .errors.join("; "))]
    SchemaParseFailed { errors: Vec<String> },

    #[error("Schema could not be loaded: {}", describe(.errors))]
    SchemaLoadFailed { errors: Vec<String> },

    #[error("Path cannot be passed to libxml2: {path}")]
    InvalidPath { path: PathBuf },

    #[error("Validation context creation failed")]
    ValidationContextCreationFailed,

    #[error("File validation failed with code {code}: {file}")]
    ValidationFailed { code: i32, file: PathBuf },

    #[error("Memory allocation failed in libxml2")]
    MemoryAllocation,
}

fn describe(errors: &[String]) -> String {
    if errors.is_empty() {
        "no diagnostics reported".to_string()
    } else {
        errors.join("; ")
    }
}

impl From<LibXml2Error> for ValidationError {
    fn from(err: LibXml2Error) -> Self {
        ValidationError::LibXml2Internal {
            details: err.to_string(),
        }
    }
}

impl ValidationError {
    /// Map a schema compilation failure onto the error taxonomy, naming the
    /// original (not sandboxed) main schema.
    ///
    /// Diagnostics that mention files inside `sandbox` are rewritten to point at the
    /// same files in the main schema's folder, since the sandbox is gone by the time
    /// the error is reported.
    pub fn from_compile_error(err: LibXml2Error, schema: PathBuf, sandbox: &Path) -> Self {
        let folder = schema.parent().unwrap_or(Path::new("")).to_path_buf();
        let relocate = |errors: Vec<String>| -> Vec<String> {
            errors
                .into_iter()
                .map(|message| relocate_paths(&message, sandbox, &folder))
                .collect()
        };

        match err {
            LibXml2Error::SchemaParseFailed { errors } => ValidationError::SchemaParseFailure {
                schema,
                details: relocate(errors).join("; "),
            },
            LibXml2Error::SchemaLoadFailed { errors } => ValidationError::SchemaLoadFailure {
                schema,
                details: describe(&relocate(errors)),
            },
            other => ValidationError::SchemaLoadFailure {
                schema,
                details: other.to_string(),
            },
        }
    }
}

fn relocate_paths(message: &str, from: &Path, to: &Path) -> String {
    let from = from.to_string_lossy();
    if from.is_empty() || to.as_os_str().is_empty() {
        return message.to_string();
    }
    message.replace(from.as_ref(), to.to_string_lossy().as_ref())
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, ValidationError>;

/// LibXML2 result type alias
pub type LibXml2Result<T> = std::result::Result<T, LibXml2Error>;
