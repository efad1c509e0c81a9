//! # xml-validator Library
//!
//! Resolves a folder of interdependent XML Schema files into a single compiled schema and
//! validates XML submissions against it. Schema import paths written for another
//! directory layout are normalized in a temporary sandbox copy; the original schema
//! files are never modified.

pub mod cli;
pub mod config;
pub mod dependency;
pub mod error;
pub mod error_reporter;
pub mod file_discovery;
pub mod libxml2;
pub mod normalizer;
pub mod output;
pub mod sandbox;
pub mod schema_loader;
pub mod selector;
pub mod validator;

pub use cli::{Cli, OutputFormat, VerbosityLevel};
pub use config::{Config, ConfigError, ConfigManager, OutputConfig, ResolverConfig};
pub use dependency::{AnalysisState, DependencyAnalyzer, DependencyExtractor, DependencyTree};
pub use error::{LibXml2Error, ValidationError};
pub use error_reporter::ErrorReporter;
pub use file_discovery::FileDiscovery;
pub use libxml2::{LibXml2Wrapper, SchemaEngine, ValidationResult, XmlSchemaPtr};
pub use normalizer::ImportNormalizer;
pub use output::Output;
pub use sandbox::Sandbox;
pub use schema_loader::{LoadedSchema, ResolutionPhase, ResolvedBundle, SchemaInfo, SchemaLoader};
pub use selector::{MainSchemaSelection, SelectionMethod, select_main_schema};
pub use validator::{BundleValidator, FileValidationResult, ValidationStatus, validate_submission};
