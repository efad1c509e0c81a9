use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

use xml_validator::config::ConfigManager;
use xml_validator::{Config, OutputFormat, ResolverConfig, VerbosityLevel};

#[test]
fn test_default_config() {
    let config = Config::default();

    assert_eq!(config.resolver, ResolverConfig::default());
    assert_eq!(config.output.format, OutputFormat::Human);
    assert_eq!(config.output.verbosity(), VerbosityLevel::Normal);
}

#[test]
fn test_partial_toml_keeps_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("xml-validator.toml");
    fs::write(&path, "[output]\nquiet = true\n").unwrap();

    let config = ConfigManager::load_from_file(&path).unwrap();

    assert_eq!(config.resolver.main_schema, None);
    assert_eq!(config.resolver.sandbox_dir, None);
    assert_eq!(config.output.verbosity(), VerbosityLevel::Quiet);
    assert_eq!(config.output.format, OutputFormat::Human);
}

#[test]
fn test_config_round_trips_through_json() {
    let mut config = Config::default();
    config.resolver.main_schema = Some("FSA029-Schema.xsd".to_string());
    config.resolver.sandbox_dir = Some(PathBuf::from("/var/tmp"));
    config.output.format = OutputFormat::Json;

    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("xml-validator.json");
    fs::write(&path, serde_json::to_string(&config).unwrap()).unwrap();

    assert_eq!(ConfigManager::load_from_file(&path).unwrap(), config);
}

#[test]
fn test_extensionless_file_falls_back_to_json() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("xml-validator");
    fs::write(&path, r#"{ "output": { "timestamps": true } }"#).unwrap();

    let config = ConfigManager::load_from_file(&path).unwrap();

    assert!(config.output.timestamps);
}
