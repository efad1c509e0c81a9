use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Verbosity levels for output
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum VerbosityLevel {
    /// Only show the verdict and critical errors
    Quiet,
    /// Show standard information
    #[default]
    Normal,
    /// Show resolution details and the full validation error log
    Verbose,
}

impl VerbosityLevel {
    pub fn from_flags(verbose: bool, quiet: bool) -> Self {
        if quiet {
            VerbosityLevel::Quiet
        } else if verbose {
            VerbosityLevel::Verbose
        } else {
            VerbosityLevel::Normal
        }
    }

    /// Default log filter directive when `RUST_LOG` is not set
    pub fn log_directive(&self) -> &'static str {
        match self {
            VerbosityLevel::Quiet => "error",
            VerbosityLevel::Normal => "warn",
            VerbosityLevel::Verbose => "debug",
        }
    }
}

/// Output format for verdicts and reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    Human,
    /// Machine-readable JSON
    Json,
}

/// Validate an XML submission against a folder of interdependent XML Schemas
#[derive(Parser, Debug, Clone)]
#[command(name = "xml-validator")]
#[command(about = "Validate XML submissions against a multi-file XML Schema bundle")]
#[command(version)]
#[command(after_help = "Examples:\n    xml-validator ./schemas/fsa029/ ./samples/submission.xml\n    xml-validator --schema-info ./schemas/fsa029/ ./samples/submission.xml")]
pub struct Cli {
    /// Folder containing the schema (.xsd) files
    #[arg(value_name = "SCHEMA_FOLDER")]
    pub schema_folder: PathBuf,

    /// XML submission file to validate
    #[arg(value_name = "SUBMISSION_FILE")]
    pub submission_file: PathBuf,

    /// Enable verbose output
    #[arg(short = 'v', long = "verbose", help = "Enable verbose output with detailed processing information")]
    pub verbose: bool,

    /// Enable quiet mode (verdict and errors only)
    #[arg(
        short = 'q',
        long = "quiet",
        help = "Quiet mode",
        conflicts_with = "verbose"
    )]
    pub quiet: bool,

    /// Check paths and schema structure without validating
    #[arg(long = "dry-run")]
    pub dry_run: bool,

    /// Display information about the resolved schema files instead of validating
    #[arg(long = "schema-info")]
    pub schema_info: bool,

    /// Use this schema file as the entry point instead of detecting it
    #[arg(long = "main-schema", value_name = "FILE")]
    pub main_schema: Option<String>,

    /// Directory under which temporary schema sandboxes are created
    #[arg(long = "sandbox-dir", value_name = "DIR")]
    pub sandbox_dir: Option<PathBuf>,

    /// Output format
    #[arg(long = "format", value_enum)]
    pub format: Option<OutputFormat>,

    /// Configuration file (TOML or JSON)
    #[arg(long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    pub fn verbosity(&self) -> VerbosityLevel {
        VerbosityLevel::from_flags(self.verbose, self.quiet)
    }
}
