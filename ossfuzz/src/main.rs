mod config;
mod telemetry;

use catalog::{Catalog, CatalogError, ProjectQuery, Source};
use clap::{Args, Parser, Subcommand};
use config::{Config, ConfigError};
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

/// Query metadata of the projects fuzzed by OSS-Fuzz.
#[derive(Parser)]
#[command(name = "ossfuzz", version)]
struct Cli {
    /// YAML configuration file. Built-in defaults are used when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand)]
enum CliCommand {
    /// List project names.
    List {
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Show a single project.
    Get { name: String },
    /// Show all projects.
    Projects {
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Show projects matching every given keyword.
    Match(MatchArgs),
}

#[derive(Args)]
struct MatchArgs {
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    language: Option<String>,
    #[arg(long)]
    homepage: Option<String>,
    #[arg(long)]
    main_repo: Option<String>,
    #[arg(long)]
    primary_contact: Option<String>,
    #[arg(long)]
    vendor_cc: Option<String>,
    #[arg(long)]
    fuzzing_engine: Option<String>,
    #[arg(long)]
    build_system: Option<String>,
    #[arg(long)]
    limit: Option<usize>,
}

impl From<MatchArgs> for ProjectQuery {
    fn from(args: MatchArgs) -> Self {
        ProjectQuery {
            name: args.name,
            language: args.language,
            homepage: args.homepage,
            main_repo: args.main_repo,
            primary_contact: args.primary_contact,
            vendor_cc: args.vendor_cc,
            fuzzing_engine: args.fuzzing_engine,
            build_system: args.build_system,
        }
    }
}

#[derive(thiserror::Error, Debug)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Telemetry(#[from] telemetry::TelemetryError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error("could not start runtime: {0}")]
    Runtime(std::io::Error),
    #[error("could not write output: {0}")]
    Output(#[from] serde_json::Error),
    #[error("could not write output: {0}")]
    Io(#[from] std::io::Error),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::from_file(path),
        None => Ok(Config::default()),
    };
    let config = match config {
        Ok(config) => config,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::FAILURE;
        }
    };

    let _sentry = match telemetry::init_logging(config.common.logging.as_ref()) {
        Ok(guard) => guard,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::FAILURE;
        }
    };

    match run(cli.command, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "Command failed");
            ExitCode::FAILURE
        }
    }
}

fn run(command: CliCommand, config: &Config) -> Result<(), CliError> {
    telemetry::init_metrics(config.common.metrics.as_ref())?;
    let catalog = Catalog::from_config(&config.catalog)?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(CliError::Runtime)?;

    runtime.block_on(async {
        match command {
            CliCommand::List { limit } => {
                let names = catalog.list_projects(limit).await?;
                output(&names.data, names.source)
            }
            CliCommand::Get { name } => {
                let project = catalog.get_project(&name).await?;
                output(&project.data, project.source)
            }
            CliCommand::Projects { limit } => {
                let projects = catalog.get_projects(limit).await?;
                output(&*projects.data, projects.source)
            }
            CliCommand::Match(args) => {
                let limit = args.limit;
                let matched = catalog.match_projects(&args.into(), limit).await?;
                output(&matched.data, matched.source)
            }
        }
    })
}

fn output<T: Serialize>(value: &T, source: Source) -> Result<(), CliError> {
    if source == Source::Fallback {
        eprintln!("note: GitHub was unreachable, results come from the local fallback dataset");
    }

    let mut stdout = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value)?;
    writeln!(stdout)?;
    Ok(())
}
