use std::process::ExitCode;

use xml_validator::cli::{Cli, VerbosityLevel};
use xml_validator::config::{Config, ConfigManager};
use xml_validator::error::ValidationError;
use xml_validator::error_reporter::ErrorReporter;
use xml_validator::output::Output;
use xml_validator::schema_loader::SchemaLoader;
use xml_validator::validator::validate_submission;

const EXIT_INVALID: u8 = 1;
const EXIT_ERROR: u8 = 2;

/// Initialize logging; `RUST_LOG` overrides the verbosity-derived default
fn init_logging(verbosity: VerbosityLevel) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| verbosity.log_directive().into());

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse_args();

    let config = match ConfigManager::load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            ErrorReporter::with_options(cli.verbosity(), cli.format.unwrap_or_default(), false)
                .report_config_error(&e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let verbosity = config.output.verbosity();
    init_logging(verbosity);
    tracing::debug!(?config, "loaded configuration");

    let reporter =
        ErrorReporter::with_options(verbosity, config.output.format, config.output.timestamps);

    match run(&cli, &config) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(EXIT_INVALID),
        Err(e) => {
            match e.downcast_ref::<ValidationError>() {
                Some(error) => reporter.report_validation_error(error),
                None => reporter.report_other(&e),
            }
            ExitCode::from(EXIT_ERROR)
        }
    }
}

/// Returns whether the run succeeded; `false` means the submission is invalid
fn run(cli: &Cli, config: &Config) -> anyhow::Result<bool> {
    let output = Output::new(config.output.verbosity(), config.output.format);

    if cli.schema_info || cli.dry_run {
        let bundle = SchemaLoader::new(config.resolver.clone()).analyze(&cli.schema_folder)?;

        if cli.schema_info {
            let info = bundle.schema_info()?;
            println!("{}", output.format_schema_info(&bundle, &info));
            return Ok(true);
        }

        if !cli.submission_file.is_file() {
            return Err(ValidationError::SubmissionNotFound {
                path: cli.submission_file.clone(),
            }
            .into());
        }
        println!("{}", output.format_dry_run(&bundle, &cli.submission_file));
        return Ok(true);
    }

    let result = validate_submission(&config.resolver, &cli.schema_folder, &cli.submission_file)?;
    println!("{}", output.format_result(&result));

    Ok(result.is_valid())
}
