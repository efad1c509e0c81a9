//! Sandbox materialization
//!
//! A sandbox is a uniquely named temporary directory holding import-normalized copies of
//! every schema in a bundle. Originals are only ever read. The directory is owned by a
//! [`Sandbox`] value: [`Sandbox::cleanup`] removes it and reports failures, and dropping
//! the value removes it on every other exit path.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::{Builder, TempDir};

use crate::error::{Result, ValidationError};
use crate::normalizer::ImportNormalizer;
use crate::selector::MainSchemaSelection;

const SANDBOX_PREFIX: &str = "xml-validator-";

/// Ephemeral directory of normalized schema copies for one resolution pass
#[derive(Debug)]
pub struct Sandbox {
    dir: TempDir,
    main_schema: PathBuf,
}

impl Sandbox {
    /// Copy the main schema and its dependencies into a fresh directory, normalizing
    /// their import paths
    ///
    /// The directory is created under `parent`, or the system temporary directory when
    /// `parent` is `None`.
    pub fn materialize(
        schema_folder: &Path,
        selection: &MainSchemaSelection,
        parent: Option<&Path>,
    ) -> Result<Self> {
        let mut builder = Builder::new();
        builder.prefix(SANDBOX_PREFIX);
        let dir = match parent {
            Some(parent) => builder.tempdir_in(parent)?,
            None => builder.tempdir()?,
        };

        let normalizer = ImportNormalizer::new(selection.all_schemas());

        for name in selection.all_schemas() {
            let source = schema_folder.join(name);
            let content =
                fs::read_to_string(&source).map_err(|e| ValidationError::SchemaLoadFailure {
                    schema: source.clone(),
                    details: format!("cannot read schema: {}", e),
                })?;

            fs::write(dir.path().join(name), normalizer.normalize(&content).as_bytes())?;
        }

        let main_schema = dir.path().join(&selection.main_schema);
        tracing::debug!(
            sandbox = %dir.path().display(),
            schemas = selection.dependencies.len() + 1,
            "materialized sandbox"
        );

        Ok(Self { dir, main_schema })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Path of the main schema's normalized copy
    pub fn main_schema_path(&self) -> &Path {
        &self.main_schema
    }

    /// Remove the sandbox directory and everything in it
    pub fn cleanup(self) -> Result<()> {
        let path = self.dir.path().to_path_buf();
        self.dir.close()?;
        tracing::debug!(sandbox = %path.display(), "removed sandbox");
        Ok(())
    }
}
