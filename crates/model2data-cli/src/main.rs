mod logging;
mod project;

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use chrono::Utc;
use clap::Parser;
use model2data_core::{Error as CoreError, normalize_identifier};
use model2data_generate::{GenerateOptions, GenerationError, generate_from_file};
use project::{ProjectPaths, ProjectReport, write_report, write_seeds};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
enum CliError {
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),
    #[error("No tables found in schema")]
    NoTables,
    #[error("Project directory {} already exists (use --force to overwrite)", .0.display())]
    ProjectExists(PathBuf),
    #[error("invalid arguments: {0}")]
    InvalidArgs(String),
    #[error("generation error: {0}")]
    Generation(#[from] GenerationError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("logging error: {0}")]
    Logging(String),
}

impl CliError {
    /// Surface missing and empty schemas as their own user-facing errors.
    fn from_generation(err: GenerationError) -> Self {
        match err {
            GenerationError::Schema(CoreError::NotFound(path)) => Self::FileNotFound(path),
            GenerationError::Schema(CoreError::EmptySchema) => Self::NoTables,
            other => Self::Generation(other),
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "model2data",
    version,
    about = "Generate seeded synthetic seed data from a DBML schema"
)]
struct Cli {
    /// DBML schema file.
    #[arg(long, value_name = "PATH")]
    file: PathBuf,
    /// Rows generated for every table.
    #[arg(long, default_value_t = 100, value_parser = clap::value_parser!(u64).range(10..))]
    rows: u64,
    /// Seed for the random source.
    #[arg(long, default_value_t = 42)]
    seed: u64,
    /// Project name; defaults to the schema file name.
    #[arg(long)]
    name: Option<String>,
    /// Directory the `dbt_<name>` project is created in.
    #[arg(long, default_value = ".")]
    out: PathBuf,
    /// Replace an existing project directory.
    #[arg(long, default_value_t = false)]
    force: bool,
    /// Emit logs as JSON lines.
    #[arg(long, default_value_t = false)]
    log_json: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            println!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    logging::init_logging(cli.log_json)?;

    let name = project_name(&cli)?;
    let paths = ProjectPaths::new(&cli.out, &name);
    let options = GenerateOptions::default()
        .with_rows(cli.rows)
        .with_seed(cli.seed);

    info!(event = "run_started", file = %cli.file.display(), project = %name, rows = cli.rows, seed = cli.seed);
    let timer = Instant::now();

    let output = generate_from_file(&cli.file, &options).map_err(CliError::from_generation)?;
    let dataset = &output.result.dataset;

    paths.prepare(cli.force)?;
    let bytes = write_seeds(&paths, dataset)?;
    let report = ProjectReport::new(&name, &cli.file, Utc::now(), dataset, &output.result.report);
    write_report(&paths, &report)?;

    info!(
        event = "run_finished",
        tables = dataset.len(),
        bytes,
        warnings = output.result.report.warnings.len(),
        duration_ms = timer.elapsed().as_millis() as u64
    );
    println!(
        "Generated {} tables with {} rows each in {}",
        dataset.len(),
        cli.rows,
        paths.root.display()
    );
    Ok(())
}

fn project_name(cli: &Cli) -> Result<String, CliError> {
    let raw = match &cli.name {
        Some(name) => name.clone(),
        None => cli
            .file
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .ok_or_else(|| {
                CliError::InvalidArgs(format!(
                    "cannot derive a project name from {}",
                    cli.file.display()
                ))
            })?,
    };
    Ok(normalize_identifier(&raw))
}
