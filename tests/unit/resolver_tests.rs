//! Resolver tests
//!
//! Dependency analysis, main-schema selection and import normalization driven through
//! the public API over real schema folders.

use std::collections::BTreeSet;
use std::fs;
use std::path::PathBuf;

use xml_validator::{
    AnalysisState, DependencyAnalyzer, FileDiscovery, ImportNormalizer, ResolverConfig,
    SchemaLoader, SelectionMethod, ValidationError,
};

use crate::common::mocks::MockSchemaEngine;
use crate::common::test_helpers::{BundleFixture, schema_referencing};

fn loader(config: ResolverConfig) -> SchemaLoader<MockSchemaEngine> {
    SchemaLoader::with_engine(MockSchemaEngine::new(), config)
}

fn discovered(fixture: &BundleFixture) -> Vec<PathBuf> {
    FileDiscovery::new(fixture.folder())
        .discover_schemas()
        .unwrap()
}

#[test]
fn test_mutual_imports_terminate() {
    let fixture = BundleFixture::empty();
    fixture.write_schema("A.xsd", &schema_referencing(&["B.xsd"]));
    fixture.write_schema("B.xsd", &schema_referencing(&["A.xsd"]));

    let trees = DependencyAnalyzer::new(fixture.folder()).analyze(&discovered(&fixture));

    assert_eq!(trees.len(), 2);
    for tree in trees.values() {
        assert!(tree.reachable_count() <= 2);
    }
    // Whichever schema is analyzed first records the other as its dependency
    assert!(trees["A.xsd"].get("B.xsd").is_some() || trees["B.xsd"].get("A.xsd").is_some());
}

#[test]
fn test_shared_dependency_is_identical_via_both_parents() {
    let fixture = BundleFixture::empty();
    fixture.write_schema("A.xsd", &schema_referencing(&["C.xsd"]));
    fixture.write_schema("B.xsd", &schema_referencing(&["../lib/C.xsd"]));
    fixture.write_schema("C.xsd", &schema_referencing(&["D.xsd"]));
    fixture.write_schema("D.xsd", &schema_referencing(&[]));

    let analyzer = DependencyAnalyzer::new(fixture.folder());
    let mut state = AnalysisState::new();
    let a = analyzer.build_tree("A.xsd", &mut state);
    let b = analyzer.build_tree("B.xsd", &mut state);

    assert_eq!(a.get("C.xsd"), b.get("C.xsd"));
    assert!(a.get("C.xsd").unwrap().get("D.xsd").is_some());
    assert!(state.existing_tree("C.xsd").is_some());
}

#[test]
fn test_references_to_missing_files_are_dropped() {
    let fixture = BundleFixture::empty();
    fixture.write_schema(
        "Main.xsd",
        &schema_referencing(&["Common.xsd", "Missing.xsd", "http://example.com/remote.xsd"]),
    );
    fixture.write_schema("Common.xsd", &schema_referencing(&[]));

    let trees = DependencyAnalyzer::new(fixture.folder()).analyze(&discovered(&fixture));

    let children: BTreeSet<&String> = trees["Main.xsd"].children().map(|(name, _)| name).collect();
    assert_eq!(children.len(), 1);
    assert!(children.contains(&"Common.xsd".to_string()));
}

#[test]
fn test_malformed_dependency_does_not_abort_analysis() {
    let fixture = BundleFixture::empty();
    fixture.write_schema("Main.xsd", &schema_referencing(&["Broken.xsd"]));
    fixture.write_schema("Broken.xsd", "<xs:schema <<< not xml");

    let bundle = loader(ResolverConfig::default())
        .analyze(fixture.folder())
        .unwrap();

    assert_eq!(bundle.main_schema(), "Main.xsd");
    assert!(bundle.trees["Broken.xsd"].is_leaf());
}

#[test]
fn test_selection_is_independent_of_file_names() {
    // The entry point sorts last alphabetically and still wins
    let fixture = BundleFixture::empty();
    fixture.write_schema("Alpha.xsd", &schema_referencing(&[]));
    fixture.write_schema("Beta.xsd", &schema_referencing(&["Alpha.xsd"]));
    fixture.write_schema("Zulu-Schema.xsd", &schema_referencing(&["Beta.xsd"]));

    let bundle = loader(ResolverConfig::default())
        .analyze(fixture.folder())
        .unwrap();

    assert_eq!(bundle.main_schema(), "Zulu-Schema.xsd");
    assert_eq!(bundle.selection.reachable, 2);
    let mut deps = bundle.selection.dependencies.clone();
    deps.sort();
    assert_eq!(deps, vec!["Alpha.xsd".to_string(), "Beta.xsd".to_string()]);
}

#[test]
fn test_override_wins_over_heuristic() {
    let fixture = BundleFixture::fsa029();
    let config = ResolverConfig {
        main_schema: Some("CommonTypes-Schema.xsd".to_string()),
        ..Default::default()
    };

    let bundle = loader(config).analyze(fixture.folder()).unwrap();

    assert_eq!(bundle.main_schema(), "CommonTypes-Schema.xsd");
    assert_eq!(bundle.selection.method, SelectionMethod::Override);
    assert_eq!(bundle.selection.dependencies.len(), 2);
}

#[test]
fn test_no_schemas_found() {
    let fixture = BundleFixture::empty();
    fs::write(fixture.folder().join("readme.txt"), "no schemas").unwrap();

    assert!(matches!(
        loader(ResolverConfig::default()).analyze(fixture.folder()),
        Err(ValidationError::NoSchemasFound { .. })
    ));
}

#[test]
fn test_normalizing_normalized_output_is_a_no_op() {
    let normalizer = ImportNormalizer::new(["FSA029-Schema.xsd", "CommonTypes-Schema.xsd", "Monetary.xsd"]);
    let once = normalizer
        .normalize(crate::common::test_helpers::FSA029_SCHEMA)
        .into_owned();

    let twice = normalizer.normalize(&once);

    assert_eq!(twice, once.as_str());
    assert!(once.contains(r#"schemaLocation="CommonTypes-Schema.xsd""#));
}
