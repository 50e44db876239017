//! Bunny provider CLI entrypoint.
//!
//! This is the main entrypoint for the bunny-provider command-line tool.

use std::io::Write;
use std::path::Path;
use std::process::ExitCode;

use bunny_storage_provider::cli::{Cli, Commands, OutputFormat, OutputFormatter};
use bunny_storage_provider::config::{ConfigParser, ProviderConfig};
use bunny_storage_provider::error::{ProviderError, Result};
use bunny_storage_provider::provider::Provider;
use bunny_storage_provider::resource::ResourceData;

use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Main entrypoint.
fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.verbose);

    // Run async runtime
    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Initializes the logging system.
fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Main async entry point.
async fn run(cli: Cli) -> Result<()> {
    let formatter = OutputFormatter::new(cli.output);
    let parser = ConfigParser::new();

    match cli.command {
        Commands::Schema { resource_type } => cmd_schema(resource_type.as_deref(), &formatter),
        Commands::Check { resource_type, config, state } => {
            cmd_check(&parser, &resource_type, &config, state.as_deref(), &formatter)
        }
        Commands::Create { resource_type, config } => {
            let provider = online_provider(&parser)?;
            let config = parser.load_snapshot(&config)?;
            let data = provider.create(&resource_type, &config).await?;
            emit_resource(&provider, &resource_type, &data, &formatter, cli.output)
        }
        Commands::Read { resource_type, state } => {
            let provider = online_provider(&parser)?;
            let state = parser.load_resource_data(&state)?;
            let data = provider.read(&resource_type, state).await?;
            emit_resource(&provider, &resource_type, &data, &formatter, cli.output)
        }
        Commands::Update { resource_type, config, state } => {
            let provider = online_provider(&parser)?;
            let config = parser.load_snapshot(&config)?;
            let state = parser.load_resource_data(&state)?;

            let plan = provider.plan(&resource_type, &config, Some(&state))?;
            eprintln!("{}", formatter.format_plan(&plan));
            plan.accepted()?;

            let data = provider.update(&resource_type, &config, state).await?;
            emit_resource(&provider, &resource_type, &data, &formatter, cli.output)
        }
        Commands::Delete { resource_type, state } => {
            let provider = online_provider(&parser)?;
            let state = parser.load_resource_data(&state)?;
            let data = provider.delete(&resource_type, state).await?;
            info!("{resource_type} deleted");
            emit_resource(&provider, &resource_type, &data, &formatter, cli.output)
        }
    }
}

/// Builds a provider from the environment.
fn online_provider(parser: &ConfigParser) -> Result<Provider> {
    parser.load_dotenv()?;
    let config = ProviderConfig::from_env()?;
    debug!("Using {config:?}");
    Provider::new(&config)
}

/// Show resource schemas.
fn cmd_schema(resource_type: Option<&str>, formatter: &OutputFormatter) -> Result<()> {
    let provider = Provider::offline()?;

    let types = match resource_type {
        Some(name) => vec![provider.resource(name)?.type_name()],
        None => provider.resource_types(),
    };

    let schemas = types
        .into_iter()
        .map(|name| provider.resource(name).map(|r| r.schema()))
        .collect::<Result<Vec<_>>>()?;

    write_stdout(&formatter.format_schemas(&schemas))
}

/// Check a proposed change.
fn cmd_check(
    parser: &ConfigParser,
    resource_type: &str,
    config: &Path,
    state: Option<&Path>,
    formatter: &OutputFormatter,
) -> Result<()> {
    let provider = Provider::offline()?;
    let config = parser.load_snapshot(config)?;
    let state: Option<ResourceData> = state
        .map(|path| parser.load_resource_data(path))
        .transpose()?;

    let plan = provider.plan(resource_type, &config, state.as_ref())?;
    write_stdout(&formatter.format_plan(&plan))?;

    match plan.rejections {
        Some(errors) => Err(ProviderError::Diff(errors)),
        None => Ok(()),
    }
}

/// Prints the state document to stdout and, for text output, a summary to stderr.
fn emit_resource(
    provider: &Provider,
    resource_type: &str,
    data: &ResourceData,
    formatter: &OutputFormatter,
    output: OutputFormat,
) -> Result<()> {
    if output == OutputFormat::Text {
        let schema = provider.resource(resource_type)?.schema();
        eprintln!("{}", formatter.format_resource(data, schema));
    }

    write_stdout(&OutputFormatter::format_state(data))
}

fn write_stdout(content: &str) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{content}")?;
    stdout.flush()?;
    Ok(())
}
