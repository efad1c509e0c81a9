//! Output and reporting
//!
//! Formats verdicts, dry-run reports and schema information for stdout, either as
//! human-readable text or as JSON.

use serde_json::json;
use std::path::Path;
use std::time::Duration;

use crate::cli::{OutputFormat, VerbosityLevel};
use crate::dependency::DependencyTree;
use crate::schema_loader::{ResolvedBundle, SchemaInfo};
use crate::selector::SelectionMethod;
use crate::validator::{FileValidationResult, ValidationStatus};

/// Output formatter for results
pub struct Output {
    verbosity: VerbosityLevel,
    format: OutputFormat,
    show_colors: bool,
}

impl Output {
    pub fn new(verbosity: VerbosityLevel, format: OutputFormat) -> Self {
        Self {
            verbosity,
            format,
            show_colors: format == OutputFormat::Human && atty::is(atty::Stream::Stdout),
        }
    }

    /// Formatter that never emits color codes
    pub fn plain(verbosity: VerbosityLevel, format: OutputFormat) -> Self {
        Self {
            verbosity,
            format,
            show_colors: false,
        }
    }

    fn colorize(&self, text: &str, color: &str) -> String {
        if self.show_colors {
            format!("\x1b[{}m{}\x1b[0m", color, text)
        } else {
            text.to_string()
        }
    }

    /// Verdict for one submission
    pub fn format_result(&self, result: &FileValidationResult) -> String {
        if self.format == OutputFormat::Json {
            let error_count = match result.status {
                ValidationStatus::Valid => 0,
                ValidationStatus::Invalid { error_count } => error_count,
            };
            return format!(
                "{:#}",
                json!({
                    "file": result.path.display().to_string(),
                    "status": result.status.verdict(),
                    "main_schema": result.main_schema,
                    "error_count": error_count,
                    "errors": result.error_details,
                    "duration_ms": result.duration.as_millis() as u64,
                })
            );
        }

        let verdict = match result.status {
            ValidationStatus::Valid => self.colorize("VALID", "32"),
            ValidationStatus::Invalid { .. } => self.colorize("INVALID", "31"),
        };
        let mut output = format!("Submitted file ({}) is {}", result.path.display(), verdict);

        if let ValidationStatus::Invalid { error_count } = result.status
            && self.verbosity >= VerbosityLevel::Normal
        {
            output.push_str(&format!(
                "\n  {} error{}",
                error_count,
                if error_count == 1 { "" } else { "s" }
            ));
            if self.verbosity >= VerbosityLevel::Verbose {
                for error_detail in &result.error_details {
                    output.push_str(&format!("\n    {}", error_detail));
                }
            }
        }

        if self.verbosity >= VerbosityLevel::Verbose {
            output.push_str(&format!(
                "\n  Main schema: {}\n  Duration: {}",
                result.main_schema,
                format_duration(result.duration)
            ));
        }

        output
    }

    /// Report for `--dry-run`: the resolved structure, nothing validated
    pub fn format_dry_run(&self, bundle: &ResolvedBundle, submission: &Path) -> String {
        if self.format == OutputFormat::Json {
            return format!(
                "{:#}",
                json!({
                    "dry_run": true,
                    "schema_folder": bundle.schema_folder.display().to_string(),
                    "submission": submission.display().to_string(),
                    "main_schema": bundle.main_schema(),
                    "selection": method_name(bundle.selection.method),
                    "dependencies": bundle.selection.dependencies,
                })
            );
        }

        let mut output = String::new();
        output.push_str("Dry run: no validation performed\n");
        output.push_str(&format!(
            "  Schema folder: {}\n",
            bundle.schema_folder.display()
        ));
        output.push_str(&format!("  Submission: {}\n", submission.display()));
        output.push_str(&format!(
            "  Main schema: {} ({})\n",
            bundle.main_schema(),
            method_name(bundle.selection.method)
        ));
        output.push_str(&format!(
            "  Dependencies: {}",
            bundle.selection.dependencies.len()
        ));
        if self.verbosity >= VerbosityLevel::Verbose {
            for dependency in &bundle.selection.dependencies {
                output.push_str(&format!("\n    {}", dependency));
            }
        }
        output
    }

    /// Report for `--schema-info`
    pub fn format_schema_info(&self, bundle: &ResolvedBundle, info: &SchemaInfo) -> String {
        if self.format == OutputFormat::Json {
            return format!(
                "{:#}",
                json!({
                    "schema_folder": bundle.schema_folder.display().to_string(),
                    "main_schema": info.main_schema,
                    "selection": method_name(bundle.selection.method),
                    "reachable": bundle.selection.reachable,
                    "target_namespace": info.target_namespace,
                    "root_elements": info.root_elements,
                    "schemas": bundle.discovered,
                    "dependency_trees": bundle.trees,
                })
            );
        }

        let mut output = String::new();
        output.push_str("Schema Information:\n");
        output.push_str(&format!(
            "  Schema folder: {}\n",
            bundle.schema_folder.display()
        ));
        output.push_str(&format!(
            "  Main schema: {}\n",
            self.colorize(&info.main_schema, "1")
        ));
        output.push_str(&format!(
            "  Selected by: {}\n",
            method_name(bundle.selection.method)
        ));
        output.push_str(&format!(
            "  Target namespace: {}\n",
            info.target_namespace.as_deref().unwrap_or("(none)")
        ));
        if info.root_elements.is_empty() {
            output.push_str("  Root elements: (none)\n");
        } else {
            output.push_str(&format!(
                "  Root elements: {}\n",
                info.root_elements.join(", ")
            ));
        }
        output.push_str(&format!("  Schema files: {}\n", bundle.discovered.len()));

        output.push_str("\nDependency tree:\n");
        let empty = DependencyTree::new();
        output.push_str(&render_tree(
            bundle.main_schema(),
            bundle.main_tree().unwrap_or(&empty),
        ));

        if self.verbosity >= VerbosityLevel::Verbose {
            for name in &bundle.selection.dependencies {
                if let Some(tree) = bundle.trees.get(name) {
                    output.push('\n');
                    output.push_str(&render_tree(name, tree));
                }
            }
        }

        output
    }
}

fn method_name(method: SelectionMethod) -> &'static str {
    match method {
        SelectionMethod::Heuristic => "largest dependency tree",
        SelectionMethod::Override => "configured main schema",
    }
}

/// Indented rendering of a dependency tree, one schema per line
fn render_tree(root: &str, tree: &DependencyTree) -> String {
    let mut output = format!("  {}\n", root);
    let mut stack: Vec<(usize, &String, &DependencyTree)> = tree
        .children()
        .map(|(name, subtree)| (1, name, subtree))
        .collect();
    stack.reverse();

    while let Some((depth, name, subtree)) = stack.pop() {
        output.push_str(&format!("  {}└─ {}\n", "   ".repeat(depth - 1), name));
        let first_child = stack.len();
        stack.extend(
            subtree
                .children()
                .map(|(child, grandchildren)| (depth + 1, child, grandchildren)),
        );
        stack[first_child..].reverse();
    }

    output
}

fn format_duration(duration: Duration) -> String {
    let total_secs = duration.as_secs_f64();
    if total_secs < 1.0 {
        format!("{:.0}ms", duration.as_millis())
    } else if total_secs < 60.0 {
        format!("{:.2}s", total_secs)
    } else {
        let mins = (total_secs / 60.0) as u64;
        let secs = total_secs % 60.0;
        format!("{}m{:.1}s", mins, secs)
    }
}
