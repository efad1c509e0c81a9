//! Schema bundle resolution
//!
//! Drives one resolution pass over a schema folder:
//! `FolderValidated -> SchemasDiscovered -> DependenciesAnalyzed -> MainSchemaChosen`
//! for [`SchemaLoader::analyze`], continuing with
//! `SandboxMaterialized -> SchemaCompiled` for [`SchemaLoader::load`]. The sandbox is
//! removed as soon as compilation finishes, whether it succeeded or not.

use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use crate::config::ResolverConfig;
use crate::dependency::{DependencyAnalyzer, DependencyTree};
use crate::error::{Result, ValidationError};
use crate::file_discovery::{FileDiscovery, file_name_of};
use crate::libxml2::{LibXml2Wrapper, SchemaEngine};
use crate::sandbox::Sandbox;
use crate::selector::{MainSchemaSelection, select_main_schema, select_override};

/// Cached regex for the schema element's targetNamespace
static TARGET_NAMESPACE_REGEX: OnceLock<Regex> = OnceLock::new();

/// Cached regex for schema-namespace tags
static SCHEMA_TAG_REGEX: OnceLock<Regex> = OnceLock::new();

/// Cached regex for a name attribute
static NAME_ATTRIBUTE_REGEX: OnceLock<Regex> = OnceLock::new();

fn get_target_namespace_regex() -> &'static Regex {
    TARGET_NAMESPACE_REGEX.get_or_init(|| {
        Regex::new(
            r#"<(?:xs|xsd):schema\b[^>]*?\btargetNamespace\s*=\s*(?:"([^"]*)"|'([^']*)')"#,
        )
        .expect("Failed to compile targetNamespace regex")
    })
}

fn get_schema_tag_regex() -> &'static Regex {
    SCHEMA_TAG_REGEX.get_or_init(|| {
        Regex::new(r#"<(/)?(?:xs|xsd):([A-Za-z]+)\b([^>]*?)(/)?>"#)
            .expect("Failed to compile schema tag regex")
    })
}

fn get_name_attribute_regex() -> &'static Regex {
    NAME_ATTRIBUTE_REGEX.get_or_init(|| {
        Regex::new(r#"\bname\s*=\s*(?:"([^"]*)"|'([^']*)')"#)
            .expect("Failed to compile name attribute regex")
    })
}

/// Stage of a resolution pass, as reported in logs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionPhase {
    FolderValidated,
    SchemasDiscovered,
    DependenciesAnalyzed,
    MainSchemaChosen,
    SandboxMaterialized,
    SchemaCompiled,
    Validated,
    Failed,
}

impl ResolutionPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResolutionPhase::FolderValidated => "folder-validated",
            ResolutionPhase::SchemasDiscovered => "schemas-discovered",
            ResolutionPhase::DependenciesAnalyzed => "dependencies-analyzed",
            ResolutionPhase::MainSchemaChosen => "main-schema-chosen",
            ResolutionPhase::SandboxMaterialized => "sandbox-materialized",
            ResolutionPhase::SchemaCompiled => "schema-compiled",
            ResolutionPhase::Validated => "validated",
            ResolutionPhase::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ResolutionPhase::Validated | ResolutionPhase::Failed)
    }

    pub(crate) fn enter(self, folder: &Path) {
        tracing::debug!(phase = %self, folder = %folder.display(), "resolution phase");
    }

    pub(crate) fn fail(folder: &Path, error: &ValidationError) {
        tracing::debug!(
            phase = %ResolutionPhase::Failed,
            folder = %folder.display(),
            error = %error,
            "resolution phase"
        );
    }
}

impl fmt::Display for ResolutionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structure of a schema folder: what was found and which schema is the entry point
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedBundle {
    pub schema_folder: PathBuf,
    /// Discovered schema file names, in discovery order
    pub discovered: Vec<String>,
    pub trees: BTreeMap<String, DependencyTree>,
    pub selection: MainSchemaSelection,
}

impl ResolvedBundle {
    pub fn main_schema(&self) -> &str {
        &self.selection.main_schema
    }

    /// Path of the original (not sandboxed) main schema
    pub fn main_schema_path(&self) -> PathBuf {
        self.schema_folder.join(&self.selection.main_schema)
    }

    pub fn main_tree(&self) -> Option<&DependencyTree> {
        self.trees.get(&self.selection.main_schema)
    }

    /// Read the main schema's target namespace and top-level element names
    pub fn schema_info(&self) -> Result<SchemaInfo> {
        let path = self.main_schema_path();
        let content = fs::read_to_string(&path).map_err(|e| ValidationError::SchemaLoadFailure {
            schema: path.clone(),
            details: format!("cannot read schema: {}", e),
        })?;
        Ok(SchemaInfo::from_text(&self.selection.main_schema, &content))
    }
}

/// Descriptive details of a main schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaInfo {
    pub main_schema: String,
    pub target_namespace: Option<String>,
    pub root_elements: Vec<String>,
}

impl SchemaInfo {
    pub fn from_text(main_schema: &str, content: &str) -> Self {
        let target_namespace = get_target_namespace_regex()
            .captures(content)
            .and_then(|caps| caps.get(1).or_else(|| caps.get(2)))
            .map(|m| m.as_str().to_string());

        // Elements declared directly under xs:schema; nesting is tracked by tag depth
        let mut root_elements = Vec::new();
        let mut depth = 0usize;
        for caps in get_schema_tag_regex().captures_iter(content) {
            if caps.get(1).is_some() {
                depth = depth.saturating_sub(1);
                continue;
            }

            if &caps[2] == "element" && depth == 1 {
                if let Some(name) = get_name_attribute_regex()
                    .captures(&caps[3])
                    .and_then(|attr| attr.get(1).or_else(|| attr.get(2)))
                {
                    root_elements.push(name.as_str().to_string());
                }
            }

            if caps.get(4).is_none() {
                depth += 1;
            }
        }

        Self {
            main_schema: main_schema.to_string(),
            target_namespace,
            root_elements,
        }
    }
}

/// A compiled main schema together with the bundle it was resolved from
#[derive(Debug)]
pub struct LoadedSchema<S> {
    pub schema: S,
    pub bundle: ResolvedBundle,
    /// Where the sandbox was; it no longer exists once loading returns
    pub sandbox_path: PathBuf,
}

/// Resolves schema folders and compiles their main schema with a [`SchemaEngine`]
#[derive(Debug, Clone)]
pub struct SchemaLoader<E = LibXml2Wrapper> {
    engine: E,
    config: ResolverConfig,
}

impl SchemaLoader<LibXml2Wrapper> {
    pub fn new(config: ResolverConfig) -> Self {
        Self::with_engine(LibXml2Wrapper::new(), config)
    }
}

impl<E: SchemaEngine> SchemaLoader<E> {
    pub fn with_engine(engine: E, config: ResolverConfig) -> Self {
        Self { engine, config }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    pub fn into_engine(self) -> E {
        self.engine
    }

    /// Resolve the folder's structure without creating a sandbox
    pub fn analyze(&self, schema_folder: &Path) -> Result<ResolvedBundle> {
        self.resolve(schema_folder)
            .inspect_err(|e| ResolutionPhase::fail(schema_folder, e))
    }

    /// Resolve the folder, compile its main schema from a normalized sandbox copy and
    /// remove the sandbox
    pub fn load(&self, schema_folder: &Path) -> Result<LoadedSchema<E::Schema>> {
        let bundle = self.analyze(schema_folder)?;
        self.compile(bundle)
            .inspect_err(|e| ResolutionPhase::fail(schema_folder, e))
    }

    fn resolve(&self, schema_folder: &Path) -> Result<ResolvedBundle> {
        let discovery = FileDiscovery::new(schema_folder);
        discovery.validate_folder()?;
        self.check_sandbox_dir(schema_folder)?;
        ResolutionPhase::FolderValidated.enter(schema_folder);

        let paths = discovery.discover_schemas()?;
        let discovered: Vec<String> = paths.iter().map(|path| file_name_of(path)).collect();
        ResolutionPhase::SchemasDiscovered.enter(schema_folder);

        let trees = DependencyAnalyzer::new(schema_folder).analyze(&paths);
        ResolutionPhase::DependenciesAnalyzed.enter(schema_folder);

        let selection = match self.config.main_schema.as_deref() {
            Some(name) => select_override(&discovered, &trees, name).ok_or_else(|| {
                ValidationError::MainSchemaNotFound {
                    name: name.to_string(),
                    folder: schema_folder.to_path_buf(),
                }
            })?,
            None => select_main_schema(&discovered, &trees)?,
        };
        tracing::info!(
            main_schema = %selection.main_schema,
            reachable = selection.reachable,
            dependencies = selection.dependencies.len(),
            method = ?selection.method,
            "selected main schema"
        );
        ResolutionPhase::MainSchemaChosen.enter(schema_folder);

        Ok(ResolvedBundle {
            schema_folder: schema_folder.to_path_buf(),
            discovered,
            trees,
            selection,
        })
    }

    fn compile(&self, bundle: ResolvedBundle) -> Result<LoadedSchema<E::Schema>> {
        let sandbox = Sandbox::materialize(
            &bundle.schema_folder,
            &bundle.selection,
            self.config.sandbox_dir.as_deref(),
        )?;
        let sandbox_path = sandbox.path().to_path_buf();
        ResolutionPhase::SandboxMaterialized.enter(&bundle.schema_folder);

        let compiled = self.engine.compile_schema(sandbox.main_schema_path());

        if let Err(e) = sandbox.cleanup() {
            tracing::warn!(sandbox = %sandbox_path.display(), error = %e, "failed to remove sandbox");
        }

        let schema = compiled
            .map_err(|e| {
                ValidationError::from_compile_error(e, bundle.main_schema_path(), &sandbox_path)
            })?;
        ResolutionPhase::SchemaCompiled.enter(&bundle.schema_folder);

        Ok(LoadedSchema {
            schema,
            bundle,
            sandbox_path,
        })
    }

    /// Sandboxes must never be created inside the folder being resolved
    fn check_sandbox_dir(&self, schema_folder: &Path) -> Result<()> {
        let Some(sandbox_dir) = self.config.sandbox_dir.as_deref() else {
            return Ok(());
        };

        let folder = fs::canonicalize(schema_folder)?;
        let sandbox_dir = fs::canonicalize(sandbox_dir).unwrap_or_else(|_| sandbox_dir.to_path_buf());
        if sandbox_dir.starts_with(&folder) {
            return Err(ValidationError::Config(format!(
                "sandbox directory {} is inside the schema folder {}",
                sandbox_dir.display(),
                folder.display()
            )));
        }
        Ok(())
    }
}
