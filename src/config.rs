use crate::cli::{Cli, OutputFormat, VerbosityLevel};
use crate::file_discovery::FileDiscovery;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Trait for abstracting environment variable access
pub trait EnvProvider {
    fn get(&self, key: &str) -> Option<String>;
}

/// System environment variable provider for production use
pub struct SystemEnvProvider;

impl EnvProvider for SystemEnvProvider {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlParsing(#[from] toml::de::Error),

    #[error("JSON parsing error: {0}")]
    JsonParsing(#[from] serde_json::Error),

    #[error("Configuration validation error: {0}")]
    Validation(String),

    #[error("Environment variable error: {0}")]
    Environment(String),

    #[error("Unsupported configuration file format: {0}")]
    UnsupportedFormat(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

const CONFIG_NAMES: [&str; 4] = [
    "xml-validator.toml",
    "xml-validator.json",
    ".xml-validator.toml",
    ".xml-validator.json",
];

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub resolver: ResolverConfig,
    pub output: OutputConfig,
}

/// Schema resolution configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct ResolverConfig {
    /// Entry-point schema file name; bypasses main-schema detection when set
    pub main_schema: Option<String>,
    /// Parent directory for sandboxes (system temp directory when unset)
    pub sandbox_dir: Option<PathBuf>,
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct OutputConfig {
    /// Output format
    pub format: OutputFormat,
    /// Verbose output
    pub verbose: bool,
    /// Quiet mode (verdict and errors only)
    pub quiet: bool,
    /// Prefix error reports with a timestamp
    pub timestamps: bool,
}

impl OutputConfig {
    pub fn verbosity(&self) -> VerbosityLevel {
        VerbosityLevel::from_flags(self.verbose, self.quiet)
    }
}

/// Configuration manager for loading and merging configurations
pub struct ConfigManager;

impl ConfigManager {
    /// Load configuration with precedence: file -> environment -> CLI
    pub fn load_config(cli: &Cli) -> Result<Config> {
        Self::load_config_with(cli, &SystemEnvProvider)
    }

    /// Load configuration reading environment overrides from `env`
    pub fn load_config_with(cli: &Cli, env: &impl EnvProvider) -> Result<Config> {
        let mut config = Config::default();

        if let Some(config_path) = &cli.config {
            let file_config = Self::load_from_file(config_path)?;
            config = Self::merge_configs(config, file_config);
        } else if let Some(found_config) = Self::find_config_file()? {
            config = Self::merge_configs(config, found_config);
        }

        config = Self::apply_environment_overrides_with(env, config)?;

        // CLI arguments take the highest precedence
        config = Self::merge_with_cli(config, cli);

        Self::validate_config(&config)?;

        Ok(config)
    }

    /// Load configuration from a file (TOML or JSON)
    pub fn load_from_file(path: &Path) -> Result<Config> {
        let content = std::fs::read_to_string(path)?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Ok(toml::from_str(&content)?),
            Some("json") => Ok(serde_json::from_str(&content)?),
            Some(ext) => Err(ConfigError::UnsupportedFormat(ext.to_string())),
            None => {
                // Try to parse as TOML first, then JSON
                if let Ok(config) = toml::from_str::<Config>(&content) {
                    Ok(config)
                } else {
                    Ok(serde_json::from_str(&content)?)
                }
            }
        }
    }

    /// Find configuration file in standard locations
    pub fn find_config_file() -> Result<Option<Config>> {
        if let Some(path) = Self::find_config_in(Path::new(".")) {
            return Ok(Some(Self::load_from_file(&path)?));
        }

        if let Some(config_dir) = dirs::config_dir()
            && let Some(path) = Self::find_config_in(&config_dir.join("xml-validator"))
        {
            return Ok(Some(Self::load_from_file(&path)?));
        }

        Ok(None)
    }

    fn find_config_in(dir: &Path) -> Option<PathBuf> {
        CONFIG_NAMES
            .iter()
            .map(|name| dir.join(name))
            .find(|path| path.is_file())
    }

    /// Apply environment variable overrides using the system environment
    pub fn apply_environment_overrides(config: Config) -> Result<Config> {
        Self::apply_environment_overrides_with(&SystemEnvProvider, config)
    }

    /// Apply environment variable overrides with a custom environment provider
    pub fn apply_environment_overrides_with(
        env: &impl EnvProvider,
        mut config: Config,
    ) -> Result<Config> {
        // Resolver settings
        if let Some(main_schema) = env.get("XML_VALIDATOR_MAIN_SCHEMA") {
            config.resolver.main_schema = Some(main_schema);
        }

        if let Some(sandbox_dir) = env.get("XML_VALIDATOR_SANDBOX_DIR") {
            config.resolver.sandbox_dir = Some(PathBuf::from(sandbox_dir));
        }

        // Output settings
        if let Some(format) = env.get("XML_VALIDATOR_FORMAT") {
            config.output.format = match format.to_lowercase().as_str() {
                "human" => OutputFormat::Human,
                "json" => OutputFormat::Json,
                _ => {
                    return Err(ConfigError::Environment(format!(
                        "Invalid XML_VALIDATOR_FORMAT value: {}",
                        format
                    )));
                }
            };
        }

        if let Some(verbose) = env.get("XML_VALIDATOR_VERBOSE") {
            config.output.verbose = parse_flag("XML_VALIDATOR_VERBOSE", &verbose)?;
        }

        if let Some(quiet) = env.get("XML_VALIDATOR_QUIET") {
            config.output.quiet = parse_flag("XML_VALIDATOR_QUIET", &quiet)?;
        }

        if let Some(timestamps) = env.get("XML_VALIDATOR_TIMESTAMPS") {
            config.output.timestamps = parse_flag("XML_VALIDATOR_TIMESTAMPS", &timestamps)?;
        }

        Ok(config)
    }

    /// Merge CLI arguments with configuration (CLI takes precedence)
    pub fn merge_with_cli(mut config: Config, cli: &Cli) -> Config {
        if let Some(main_schema) = &cli.main_schema {
            config.resolver.main_schema = Some(main_schema.clone());
        }
        if let Some(sandbox_dir) = &cli.sandbox_dir {
            config.resolver.sandbox_dir = Some(sandbox_dir.clone());
        }

        if let Some(format) = cli.format {
            config.output.format = format;
        }
        // A verbosity flag on the command line replaces the configured verbosity
        if cli.verbose || cli.quiet {
            config.output.verbose = cli.verbose;
            config.output.quiet = cli.quiet;
        }

        config
    }

    /// Merge two configurations (second takes precedence for set values)
    pub fn merge_configs(mut base: Config, override_config: Config) -> Config {
        if override_config.resolver.main_schema.is_some() {
            base.resolver.main_schema = override_config.resolver.main_schema;
        }
        if override_config.resolver.sandbox_dir.is_some() {
            base.resolver.sandbox_dir = override_config.resolver.sandbox_dir;
        }

        base.output.format = override_config.output.format;
        base.output.verbose = override_config.output.verbose;
        base.output.quiet = override_config.output.quiet;
        base.output.timestamps = override_config.output.timestamps;

        base
    }

    /// Validate configuration values
    pub fn validate_config(config: &Config) -> Result<()> {
        if let Some(main_schema) = &config.resolver.main_schema {
            let bare = !main_schema.contains(['/', '\\']);
            if !bare || !FileDiscovery::should_process(Path::new(main_schema)) {
                return Err(ConfigError::Validation(format!(
                    "Main schema must be a schema file name such as FSA029-Schema.xsd, got: {}",
                    main_schema
                )));
            }
        }

        if let Some(sandbox_dir) = &config.resolver.sandbox_dir
            && sandbox_dir.as_os_str().is_empty()
        {
            return Err(ConfigError::Validation(
                "Sandbox directory cannot be empty".to_string(),
            ));
        }

        if config.output.verbose && config.output.quiet {
            return Err(ConfigError::Validation(
                "Cannot enable both verbose and quiet modes".to_string(),
            ));
        }

        Ok(())
    }
}

fn parse_flag(key: &str, value: &str) -> Result<bool> {
    value
        .parse()
        .map_err(|_| ConfigError::Environment(format!("Invalid {} value: {}", key, value)))
}
