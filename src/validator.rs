//! Submission validation against a resolved schema bundle
//!
//! A [`BundleValidator`] owns the compiled main schema of one schema folder. Resolution
//! and compilation happen once, in [`BundleValidator::load`]; the sandbox used for
//! compilation is already gone when it returns, so validating submissions touches
//! nothing but the submission file.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::config::ResolverConfig;
use crate::error::{Result, ValidationError};
use crate::file_discovery::FileDiscovery;
use crate::libxml2::{LibXml2Wrapper, SchemaEngine, ValidationResult};
use crate::schema_loader::{ResolutionPhase, ResolvedBundle, SchemaLoader};

/// Status of a single file validation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationStatus {
    /// File satisfies the schema
    Valid,
    /// File violates the schema
    Invalid { error_count: i32 },
}

impl ValidationStatus {
    /// Check if the validation was successful
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationStatus::Valid)
    }

    /// Check if the validation failed due to schema violations
    pub fn is_invalid(&self) -> bool {
        matches!(self, ValidationStatus::Invalid { .. })
    }

    pub fn verdict(&self) -> &'static str {
        match self {
            ValidationStatus::Valid => "VALID",
            ValidationStatus::Invalid { .. } => "INVALID",
        }
    }
}

/// Result of validating a single file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileValidationResult {
    /// Path to the validated file
    pub path: PathBuf,
    /// Validation status
    pub status: ValidationStatus,
    /// Main schema the file was validated against
    pub main_schema: String,
    /// Duration of validation
    pub duration: Duration,
    /// The engine's error log when validation failed
    pub error_details: Vec<String>,
}

impl FileValidationResult {
    /// Create a new successful validation result
    pub fn valid(path: PathBuf, main_schema: String, duration: Duration) -> Self {
        Self {
            path,
            status: ValidationStatus::Valid,
            main_schema,
            duration,
            error_details: Vec::new(),
        }
    }

    /// Create a new invalid validation result
    pub fn invalid(
        path: PathBuf,
        main_schema: String,
        error_count: i32,
        duration: Duration,
        error_details: Vec<String>,
    ) -> Self {
        Self {
            path,
            status: ValidationStatus::Invalid { error_count },
            main_schema,
            duration,
            error_details,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.status.is_valid()
    }

    /// Convert an invalid result into [`ValidationError::ValidationFailed`]
    pub fn into_result(self) -> Result<Self> {
        match self.status {
            ValidationStatus::Valid => Ok(self),
            ValidationStatus::Invalid { error_count } => {
                let errors = if self.error_details.is_empty() {
                    vec![format!("{} schema violation(s) reported", error_count)]
                } else {
                    self.error_details
                };
                Err(ValidationError::ValidationFailed {
                    file: self.path,
                    errors,
                })
            }
        }
    }
}

impl fmt::Display for FileValidationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Submitted file ({}) is {}",
            self.path.display(),
            self.status.verdict()
        )
    }
}

/// Validates submissions against the main schema of one schema folder
pub struct BundleValidator<E: SchemaEngine = LibXml2Wrapper> {
    engine: E,
    schema: E::Schema,
    bundle: ResolvedBundle,
    sandbox_path: PathBuf,
}

impl BundleValidator<LibXml2Wrapper> {
    /// Resolve and compile the schema folder with libxml2
    pub fn load(config: &ResolverConfig, schema_folder: &Path) -> Result<Self> {
        Self::load_with(LibXml2Wrapper::new(), config.clone(), schema_folder)
    }
}

impl<E: SchemaEngine> BundleValidator<E> {
    /// Resolve and compile the schema folder with a specific engine
    pub fn load_with(engine: E, config: ResolverConfig, schema_folder: &Path) -> Result<Self> {
        let loader = SchemaLoader::with_engine(engine, config);
        let loaded = loader.load(schema_folder)?;

        Ok(Self {
            engine: loader.into_engine(),
            schema: loaded.schema,
            bundle: loaded.bundle,
            sandbox_path: loaded.sandbox_path,
        })
    }

    pub fn bundle(&self) -> &ResolvedBundle {
        &self.bundle
    }

    pub fn main_schema(&self) -> &str {
        self.bundle.main_schema()
    }

    /// Directory the schema was compiled in; removed before `load` returned
    pub fn sandbox_path(&self) -> &Path {
        &self.sandbox_path
    }

    /// Validate one submission, reporting schema violations as an `Invalid` status
    pub fn validate_file(&self, file_path: &Path) -> Result<FileValidationResult> {
        if !file_path.is_file() {
            return Err(ValidationError::SubmissionNotFound {
                path: file_path.to_path_buf(),
            });
        }

        let start = Instant::now();
        let outcome = self
            .engine
            .validate_file(&self.schema, file_path)
            .map_err(ValidationError::from)
            .and_then(|result| self.to_file_result(file_path, result, start.elapsed()));

        match &outcome {
            Ok(result) => {
                ResolutionPhase::Validated.enter(&self.bundle.schema_folder);
                tracing::info!(
                    file = %file_path.display(),
                    verdict = result.status.verdict(),
                    duration_ms = result.duration.as_millis() as u64,
                    "validated submission"
                );
            }
            Err(e) => ResolutionPhase::fail(&self.bundle.schema_folder, e),
        }
        outcome
    }

    /// Validate one submission, turning schema violations into
    /// [`ValidationError::ValidationFailed`]
    pub fn ensure_valid(&self, file_path: &Path) -> Result<FileValidationResult> {
        self.validate_file(file_path)?.into_result()
    }

    fn to_file_result(
        &self,
        file_path: &Path,
        result: ValidationResult,
        duration: Duration,
    ) -> Result<FileValidationResult> {
        let main_schema = self.bundle.main_schema().to_string();
        match result {
            ValidationResult::Valid => Ok(FileValidationResult::valid(
                file_path.to_path_buf(),
                main_schema,
                duration,
            )),
            ValidationResult::Invalid {
                error_count,
                errors,
            } => Ok(FileValidationResult::invalid(
                file_path.to_path_buf(),
                main_schema,
                error_count,
                duration,
                errors,
            )),
            ValidationResult::InternalError { code } => Err(ValidationError::LibXml2Internal {
                details: format!(
                    "validation of {} ended with code {}",
                    file_path.display(),
                    code
                ),
            }),
        }
    }
}

/// Resolve `schema_folder` and validate `submission` against it in one call
///
/// Both paths are checked before any sandbox is created.
pub fn validate_submission(
    config: &ResolverConfig,
    schema_folder: &Path,
    submission: &Path,
) -> Result<FileValidationResult> {
    FileDiscovery::new(schema_folder).validate_folder()?;
    if !submission.is_file() {
        return Err(ValidationError::SubmissionNotFound {
            path: submission.to_path_buf(),
        });
    }

    BundleValidator::load(config, schema_folder)?.validate_file(submission)
}
