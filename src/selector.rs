//! Main-schema selection
//!
//! The entry point of a schema bundle is the schema whose dependency tree reaches the
//! most distinct files. Ties keep the first candidate in discovery order, which is
//! filesystem-listing order; a tie is logged so that callers needing a deterministic
//! choice can pin the main schema explicitly instead.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::dependency::DependencyTree;
use crate::error::{Result, ValidationError};

/// How the main schema was chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionMethod {
    /// Largest reachable dependency count
    Heuristic,
    /// Named explicitly by configuration
    Override,
}

/// The chosen entry-point schema and every other discovered schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MainSchemaSelection {
    pub main_schema: String,
    /// Every discovered schema except the main one, in discovery order
    pub dependencies: Vec<String>,
    /// Distinct schemas reachable from the main schema's dependency tree
    pub reachable: usize,
    pub method: SelectionMethod,
}

impl MainSchemaSelection {
    /// Main schema followed by its dependencies
    pub fn all_schemas(&self) -> impl Iterator<Item = &String> {
        std::iter::once(&self.main_schema).chain(self.dependencies.iter())
    }
}

/// Choose the main schema by the largest-dependency-tree heuristic
///
/// `schemas` is the discovered file names in discovery order.
pub fn select_main_schema(
    schemas: &[String],
    trees: &BTreeMap<String, DependencyTree>,
) -> Result<MainSchemaSelection> {
    let mut best: Option<(&String, usize)> = None;
    let mut tied = false;

    for name in schemas {
        let count = trees.get(name).map_or(0, DependencyTree::reachable_count);
        match best {
            Some((_, best_count)) if count > best_count => {
                best = Some((name, count));
                tied = false;
            }
            Some((_, best_count)) if count == best_count => tied = true,
            Some(_) => {}
            None => best = Some((name, count)),
        }
    }

    let (main_schema, reachable) = best.ok_or(ValidationError::NoMainSchemaDetermined)?;

    if tied {
        tracing::warn!(
            main_schema = %main_schema,
            reachable,
            "several schemas tie for main schema; keeping the first in directory order (set main_schema to choose explicitly)"
        );
    }

    Ok(selection(
        schemas,
        trees,
        main_schema,
        SelectionMethod::Heuristic,
    ))
}

/// Use `main_schema` as the entry point, bypassing the heuristic
pub fn select_override(
    schemas: &[String],
    trees: &BTreeMap<String, DependencyTree>,
    main_schema: &str,
) -> Option<MainSchemaSelection> {
    let main_schema = schemas.iter().find(|name| name.as_str() == main_schema)?;
    Some(selection(
        schemas,
        trees,
        main_schema,
        SelectionMethod::Override,
    ))
}

fn selection(
    schemas: &[String],
    trees: &BTreeMap<String, DependencyTree>,
    main_schema: &String,
    method: SelectionMethod,
) -> MainSchemaSelection {
    MainSchemaSelection {
        main_schema: main_schema.clone(),
        dependencies: schemas
            .iter()
            .filter(|name| *name != main_schema)
            .cloned()
            .collect(),
        reachable: trees
            .get(main_schema)
            .map_or(0, DependencyTree::reachable_count),
        method,
    }
}
