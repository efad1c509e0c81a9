//! Schema dependency extraction and dependency-tree construction
//!
//! Schemas are treated as opaque text: references are pulled out of `xs:import` and
//! `xs:include` statements with a regex, and only references naming a `.xsd` file that
//! exists in the schema folder are followed.
//!
//! Trees are built by an explicit depth-first traversal over a work stack instead of
//! call-stack recursion, so deep reference chains cannot overflow the stack. Completed
//! subtrees are memoized by file name and reused verbatim wherever the same schema is
//! referenced again. A schema that is still being analyzed when it is referenced again
//! (a cycle) is left out of the tree under construction.

use regex::Regex;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use crate::file_discovery::{FileDiscovery, file_name_of};

/// Cached regex for `schemaLocation` on namespaced import/include elements
static REFERENCE_REGEX: OnceLock<Regex> = OnceLock::new();

fn get_reference_regex() -> &'static Regex {
    REFERENCE_REGEX.get_or_init(|| {
        Regex::new(
            r#"<(?:xs|xsd):(?i:import|include)\b[^>]*?\bschemaLocation\s*=\s*(?:"([^"]*)"|'([^']*)')"#,
        )
        .expect("Failed to compile import/include regex")
    })
}

/// Recursive record of the schemas a schema transitively imports or includes
///
/// Each key is a dependency file name mapped to that dependency's own tree; a leaf has
/// no children.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct DependencyTree(BTreeMap<String, DependencyTree>);

impl DependencyTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: String, subtree: DependencyTree) {
        self.0.insert(name, subtree);
    }

    pub fn get(&self, name: &str) -> Option<&DependencyTree> {
        self.0.get(name)
    }

    pub fn children(&self) -> impl Iterator<Item = (&String, &DependencyTree)> {
        self.0.iter()
    }

    pub fn is_leaf(&self) -> bool {
        self.0.is_empty()
    }

    /// Every distinct file name reachable anywhere in the tree
    pub fn flatten(&self) -> BTreeSet<String> {
        let mut names = BTreeSet::new();
        let mut pending: Vec<&DependencyTree> = vec![self];

        while let Some(tree) = pending.pop() {
            for (name, subtree) in &tree.0 {
                names.insert(name.clone());
                pending.push(subtree);
            }
        }

        names
    }

    /// Number of distinct file names reachable anywhere in the tree
    pub fn reachable_count(&self) -> usize {
        self.flatten().len()
    }
}

/// Extracts direct dependency file names from one schema file
#[derive(Debug, Clone)]
pub struct DependencyExtractor {
    schema_folder: PathBuf,
}

impl DependencyExtractor {
    pub fn new(schema_folder: impl Into<PathBuf>) -> Self {
        Self {
            schema_folder: schema_folder.into(),
        }
    }

    /// Direct dependencies of `schema_path` that exist as `.xsd` files in the folder
    ///
    /// An unreadable file yields an empty set: a broken dependency surfaces later, with
    /// a precise message, when the schema set is compiled.
    pub fn extract_dependencies(&self, schema_path: &Path) -> BTreeSet<String> {
        match fs::read_to_string(schema_path) {
            Ok(content) => self.extract_from_text(&content),
            Err(e) => {
                tracing::warn!(
                    schema = %schema_path.display(),
                    error = %e,
                    "could not read schema; treating it as having no dependencies"
                );
                BTreeSet::new()
            }
        }
    }

    /// Dependencies named by the import/include statements in `content`
    pub fn extract_from_text(&self, content: &str) -> BTreeSet<String> {
        get_reference_regex()
            .captures_iter(content)
            .filter_map(|caps| caps.get(1).or_else(|| caps.get(2)))
            .map(|location| base_file_name(location.as_str()))
            .filter(|name| self.is_local_schema(name))
            .map(str::to_string)
            .collect()
    }

    fn is_local_schema(&self, name: &str) -> bool {
        FileDiscovery::should_process(Path::new(name)) && self.schema_folder.join(name).is_file()
    }
}

/// Last path segment of a schema location, accepting either separator
pub fn base_file_name(location: &str) -> &str {
    location
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(location)
        .trim()
}

/// Per-pass analysis state: memoized trees plus the in-progress/analyzed marks
///
/// Lives for exactly one resolution pass.
#[derive(Debug, Default)]
pub struct AnalysisState {
    existing_trees: HashMap<String, DependencyTree>,
    ids: HashMap<String, usize>,
    analyzed: Vec<bool>,
}

impl AnalysisState {
    pub fn new() -> Self {
        Self::default()
    }

    fn id_of(&mut self, name: &str) -> usize {
        if let Some(&id) = self.ids.get(name) {
            return id;
        }
        let id = self.analyzed.len();
        self.ids.insert(name.to_string(), id);
        self.analyzed.push(false);
        id
    }

    fn mark_analyzed(&mut self, name: &str) {
        let id = self.id_of(name);
        self.analyzed[id] = true;
    }

    pub fn is_analyzed(&self, name: &str) -> bool {
        self.ids.get(name).is_some_and(|&id| self.analyzed[id])
    }

    pub fn existing_tree(&self, name: &str) -> Option<&DependencyTree> {
        self.existing_trees.get(name)
    }
}

/// One schema whose direct dependencies are still being walked
struct Frame {
    name: String,
    dependencies: Vec<String>,
    next: usize,
    tree: DependencyTree,
}

/// Builds one dependency tree per discovered schema
pub struct DependencyAnalyzer {
    schema_folder: PathBuf,
    extractor: DependencyExtractor,
}

impl DependencyAnalyzer {
    pub fn new(schema_folder: impl Into<PathBuf>) -> Self {
        let schema_folder = schema_folder.into();
        Self {
            extractor: DependencyExtractor::new(schema_folder.clone()),
            schema_folder,
        }
    }

    /// Build the dependency tree of every schema, keyed by file name
    pub fn analyze(&self, schemas: &[PathBuf]) -> BTreeMap<String, DependencyTree> {
        let mut state = AnalysisState::new();
        let mut trees = BTreeMap::new();

        for schema in schemas {
            let name = file_name_of(schema);
            if !state.is_analyzed(&name) {
                self.build_tree(&name, &mut state);
            }
        }

        for schema in schemas {
            let name = file_name_of(schema);
            let tree = state.existing_tree(&name).cloned().unwrap_or_default();
            trees.insert(name, tree);
        }

        trees
    }

    /// Build the tree for `root`, reusing and extending the memoized trees in `state`
    pub fn build_tree(&self, root: &str, state: &mut AnalysisState) -> DependencyTree {
        let mut stack = vec![self.open_frame(root, state)];

        loop {
            let Some(top) = stack.last_mut() else {
                return DependencyTree::new();
            };

            if top.next < top.dependencies.len() {
                let dependency = top.dependencies[top.next].clone();
                top.next += 1;

                if let Some(existing) = state.existing_trees.get(&dependency) {
                    top.tree.insert(dependency, existing.clone());
                } else if !state.is_analyzed(&dependency)
                    && self.schema_folder.join(&dependency).is_file()
                {
                    let frame = self.open_frame(&dependency, state);
                    stack.push(frame);
                } else {
                    tracing::debug!(schema = %top.name, dependency = %dependency, "circular reference omitted");
                }
                continue;
            }

            let Some(done) = stack.pop() else {
                return DependencyTree::new();
            };
            state
                .existing_trees
                .insert(done.name.clone(), done.tree.clone());

            match stack.last_mut() {
                Some(parent) => parent.tree.insert(done.name, done.tree),
                None => return done.tree,
            }
        }
    }

    fn open_frame(&self, name: &str, state: &mut AnalysisState) -> Frame {
        state.mark_analyzed(name);
        let dependencies = self
            .extractor
            .extract_dependencies(&self.schema_folder.join(name))
            .into_iter()
            .collect();

        Frame {
            name: name.to_string(),
            dependencies,
            next: 0,
            tree: DependencyTree::new(),
        }
    }
}
