use crate::cli::{OutputFormat, VerbosityLevel};
use crate::config::ConfigError;
use crate::error::ValidationError;
use serde_json::json;

/// Error reporter with configurable verbosity
pub struct ErrorReporter {
    verbosity: VerbosityLevel,
    format: OutputFormat,
    show_timestamps: bool,
}

impl ErrorReporter {
    /// Create a new error reporter with specified verbosity
    pub fn new(verbosity: VerbosityLevel) -> Self {
        Self::with_options(verbosity, OutputFormat::Human, false)
    }

    /// Create a new error reporter with additional options
    pub fn with_options(verbosity: VerbosityLevel, format: OutputFormat, show_timestamps: bool) -> Self {
        Self {
            verbosity,
            format,
            show_timestamps,
        }
    }

    /// Report a validation error with appropriate verbosity
    pub fn report_validation_error(&self, error: &ValidationError) {
        eprintln!("{}", self.format_validation_error(error));
    }

    /// Report a configuration error
    pub fn report_config_error(&self, error: &ConfigError) {
        eprintln!("{}", self.format_config_error(error));
    }

    /// Report an error outside the taxonomy (argument parsing, I/O on stdout)
    pub fn report_other(&self, error: &anyhow::Error) {
        let formatted = match self.format {
            OutputFormat::Json => self.json_error("Error", &format!("{:#}", error), None),
            OutputFormat::Human => format!("{}Error: {:#}", self.timestamp(), error),
        };
        eprintln!("{}", formatted);
    }

    pub fn format_validation_error(&self, error: &ValidationError) -> String {
        if self.format == OutputFormat::Json {
            return self.json_error(error_kind(error), &error.to_string(), suggestion(error));
        }

        match self.verbosity {
            VerbosityLevel::Quiet => self.format_error_brief(error),
            VerbosityLevel::Normal => self.format_error_normal(error),
            VerbosityLevel::Verbose => self.format_error_verbose(error),
        }
    }

    pub fn format_config_error(&self, error: &ConfigError) -> String {
        match (self.format, self.verbosity) {
            (OutputFormat::Json, _) => {
                self.json_error("Config", &error.to_string(), Some(config_help(error)))
            }
            (OutputFormat::Human, VerbosityLevel::Quiet) => format!("Config error: {}", error),
            (OutputFormat::Human, _) => format!(
                "{}Configuration Error: {}\n{}",
                self.timestamp(),
                error,
                config_help(error)
            ),
        }
    }

    fn timestamp(&self) -> String {
        if self.show_timestamps {
            format!("[{}] ", chrono::Utc::now().format("%H:%M:%S"))
        } else {
            String::new()
        }
    }

    fn json_error(&self, kind: &str, message: &str, suggestion: Option<&str>) -> String {
        let mut value = json!({
            "status": "ERROR",
            "kind": kind,
            "message": message,
        });
        if let Some(suggestion) = suggestion {
            value["suggestion"] = json!(suggestion);
        }
        if self.show_timestamps {
            value["timestamp"] = json!(chrono::Utc::now().to_rfc3339());
        }
        value.to_string()
    }

    /// Format error for brief output (quiet mode)
    fn format_error_brief(&self, error: &ValidationError) -> String {
        match error {
            ValidationError::ValidationFailed { file, .. } => {
                format!("INVALID: {}", file.display())
            }
            _ => format!("ERROR: {}", error),
        }
    }

    /// Format error for normal output
    fn format_error_normal(&self, error: &ValidationError) -> String {
        format!("{}{}", self.timestamp(), error)
    }

    /// Format error for verbose output
    fn format_error_verbose(&self, error: &ValidationError) -> String {
        let mut output = self.format_error_normal(error);

        if let ValidationError::ValidationFailed { file, errors } = error {
            output.push_str(&format!("\nFile: {}", file.display()));
            for detail in errors {
                output.push_str(&format!("\n  {}", detail));
            }
        }

        if let Some(suggestion) = suggestion(error) {
            output.push_str(&format!("\nSuggestion: {}", suggestion));
        }

        let mut current_error: &dyn std::error::Error = error;
        let mut level = 0;
        while let Some(source) = current_error.source() {
            if level == 0 {
                output.push_str("\nError Chain:");
            }
            output.push_str(&format!("\n  {}: {}", level + 1, source));
            current_error = source;
            level += 1;
        }

        output
    }
}

/// Short name of an error's taxonomy entry
pub fn error_kind(error: &ValidationError) -> &'static str {
    match error {
        ValidationError::Io(_) => "Io",
        ValidationError::FolderNotFound { .. } => "FolderNotFound",
        ValidationError::PathNotADirectory { .. } => "PathNotADirectory",
        ValidationError::FolderAccessDenied { .. } => "FolderAccessDenied",
        ValidationError::NoSchemasFound { .. } => "NoSchemasFound",
        ValidationError::NoMainSchemaDetermined => "NoMainSchemaDetermined",
        ValidationError::MainSchemaNotFound { .. } => "MainSchemaNotFound",
        ValidationError::SchemaParseFailure { .. } => "SchemaParseFailure",
        ValidationError::SchemaLoadFailure { .. } => "SchemaLoadFailure",
        ValidationError::SubmissionNotFound { .. } => "SubmissionNotFound",
        ValidationError::ValidationFailed { .. } => "ValidationFailed",
        ValidationError::Config(_) => "Config",
        ValidationError::LibXml2Internal { .. } => "LibXml2Internal",
    }
}

/// Helpful next step for an error, when there is one
pub fn suggestion(error: &ValidationError) -> Option<&'static str> {
    match error {
        ValidationError::FolderNotFound { .. } | ValidationError::PathNotADirectory { .. } => {
            Some("Pass the folder that contains the schema (.xsd) files")
        }
        ValidationError::FolderAccessDenied { .. } => {
            Some("Check the permissions of the schema folder")
        }
        ValidationError::NoSchemasFound { .. } => {
            Some("Schema files must end in .xsd and sit directly inside the folder")
        }
        ValidationError::MainSchemaNotFound { .. } => {
            Some("Set --main-schema to the file name of one of the folder's schemas")
        }
        ValidationError::SchemaParseFailure { .. } => {
            Some("Fix the schema file; the messages above point at the offending lines")
        }
        ValidationError::SchemaLoadFailure { .. } => Some(
            "Check that every imported or included schema is present in the schema folder",
        ),
        ValidationError::SubmissionNotFound { .. } => {
            Some("Check the path of the submission file")
        }
        ValidationError::ValidationFailed { .. } => {
            Some("Correct the submission so that it conforms to the schema")
        }
        _ => None,
    }
}

fn config_help(error: &ConfigError) -> &'static str {
    match error {
        ConfigError::Io(_) => "Check that the configuration file exists and is readable",
        ConfigError::TomlParsing(_) | ConfigError::JsonParsing(_) => {
            "Check the configuration file syntax (TOML/JSON format expected)"
        }
        ConfigError::UnsupportedFormat(_) => "Use a .toml or .json configuration file",
        ConfigError::Environment(_) => {
            "Fix or unset the XML_VALIDATOR_* environment variable named above"
        }
        ConfigError::Validation(_) => {
            "Resolve conflicting configuration values between file, environment, and CLI"
        }
    }
}
