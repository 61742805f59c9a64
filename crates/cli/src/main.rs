// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(clippy::multiple_crate_versions)]

use branch_import::{
    DEFAULT_SMALL_AREA_THRESHOLD, GenerationChoice, ImportOptions, ImportSource,
};
use branch_import_domain::{Generation, ImportResult, ProgressRecord};
use branch_import_persistence::{Persistence, ProgressStore};
use clap::{Parser, Subcommand};
use clap_verbosity_flag::{InfoLevel, Verbosity};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;
use tracing::info;
use tracing::level_filters::LevelFilter;
use tracing_log::AsTrace;
use tracing_subscriber::EnvFilter;

mod queue;

#[cfg(test)]
mod tests;

use queue::{ImportJob, ImportQueue, QueueConfig};

/// Branch Import - reconciles branch and region CSV files with the area catalogue
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the catalogue `SQLite` database file
    #[arg(short, long)]
    database: PathBuf,

    /// Path to the progress `SQLite` database file. Defaults to `<database>.progress`
    #[arg(long)]
    progress_database: Option<PathBuf>,

    #[command(flatten)]
    verbosity: Verbosity<InfoLevel>,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    fn log_level(&self) -> LevelFilter {
        self.verbosity.log_level_filter().as_trace()
    }

    fn progress_database(&self) -> PathBuf {
        self.progress_database
            .clone()
            .unwrap_or_else(|| default_progress_database(&self.database))
    }
}

#[derive(Clone, Debug, Subcommand)]
enum Command {
    /// Import a branch/region CSV file
    #[command(visible_alias = "i")]
    Import(ImportArgs),

    /// Show the latest progress message of an import task
    #[command(visible_alias = "p")]
    Progress {
        task_id: String,

        /// Print the progress record as JSON
        #[arg(long)]
        json: bool,
    },

    /// List dataset generations
    #[command(visible_alias = "g")]
    Generations,

    /// Create a new, inactive generation
    NewGeneration { description: String },

    /// Mark a generation active
    ActivateGeneration { id: i64 },
}

#[derive(Clone, Debug, clap::Args)]
struct ImportArgs {
    /// The CSV file to import
    csv: PathBuf,

    /// Keep the changes. Without this flag the import is a dry run
    #[arg(long)]
    commit: bool,

    /// Delete every region, branch and branch variant before importing
    #[arg(long)]
    purge: bool,

    /// Generation id to stamp, or `new`. Defaults to the current generation
    #[arg(long)]
    generation: Option<String>,

    /// Description of the generation created by `--generation new`
    #[arg(long)]
    generation_description: Option<String>,

    /// Task id progress messages are recorded under
    #[arg(long)]
    task_id: Option<String>,

    /// Footprints below this many square metres produce a warning
    #[arg(long, default_value_t = DEFAULT_SMALL_AREA_THRESHOLD)]
    small_area_threshold: f64,

    /// Upper bound on one import attempt, in seconds
    #[arg(long, default_value_t = 3600)]
    timeout_secs: u64,

    /// Attempts made after a failed one
    #[arg(long, default_value_t = 2)]
    retries: u32,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,
}

impl ImportArgs {
    fn options(&self) -> Result<ImportOptions, branch_import::ImportError> {
        Ok(ImportOptions {
            purge: self.purge,
            commit: self.commit,
            generation: GenerationChoice::parse(
                self.generation.as_deref(),
                self.generation_description.as_deref(),
            )?,
            task_id: self.task_id.clone(),
            small_area_threshold: self.small_area_threshold,
            ..ImportOptions::default()
        })
    }

    const fn queue_config(&self) -> QueueConfig {
        QueueConfig {
            capacity: 1,
            timeout: Duration::from_secs(self.timeout_secs),
            retries: self.retries,
        }
    }
}

fn default_progress_database(database: &Path) -> PathBuf {
    let mut path = database.as_os_str().to_owned();
    path.push(".progress");
    PathBuf::from(path)
}

/// Renders an import result the way the command prints it.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
fn render_result(result: &ImportResult, json: bool) -> Result<String, serde_json::Error> {
    if json {
        return serde_json::to_string_pretty(result);
    }

    if let Some(error) = &result.error {
        return Ok(format!("Error: {error}"));
    }

    let mut lines: Vec<String> = vec![
        format!("Created: {}", result.created),
        format!("Updated: {}", result.updated),
    ];
    lines.extend(
        result
            .warnings
            .iter()
            .map(|warning| format!("Warning: {warning}")),
    );
    Ok(lines.join("\n"))
}

fn render_generation(generation: &Generation) -> String {
    let state: &str = if generation.is_active() {
        "active"
    } else {
        "inactive"
    };
    format!(
        "{}\t{state}\t{}",
        generation.id(),
        generation.description()
    )
}

fn render_progress(record: &ProgressRecord, json: bool) -> Result<String, serde_json::Error> {
    if json {
        return serde_json::to_string_pretty(record);
    }
    Ok(format!("{} {}", record.updated_at, record.message))
}

async fn import(
    database: PathBuf,
    progress_database: PathBuf,
    args: &ImportArgs,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let options: ImportOptions = match args.options() {
        Ok(options) => options,
        Err(e) => return report_failure(&e.to_string(), args.json),
    };
    info!(
        csv = %args.csv.display(),
        database = %database.display(),
        commit = options.commit,
        "Queueing import"
    );

    let queue: ImportQueue = ImportQueue::start(args.queue_config());
    let job: ImportJob = ImportJob::catalogue(
        database,
        progress_database,
        ImportSource::from(args.csv.clone()),
        options,
    );
    let outcome = queue.run(job).await;
    queue.shutdown().await;

    match outcome {
        Ok(result) => {
            println!("{}", render_result(&result, args.json)?);
            Ok(if result.is_error() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            })
        }
        Err(e) => report_failure(&e.to_string(), args.json),
    }
}

/// Prints a failure that produced no result of its own.
fn report_failure(message: &str, json: bool) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let result: ImportResult = ImportResult {
        error: Some(message.to_string()),
        ..ImportResult::default()
    };
    println!("{}", render_result(&result, json)?);
    Ok(ExitCode::FAILURE)
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let args: Args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(args.log_level().to_string())),
        )
        .with_writer(std::io::stderr)
        .init();

    let progress_database: PathBuf = args.progress_database();

    match &args.command {
        Command::Import(import_args) => {
            import(args.database.clone(), progress_database, import_args).await
        }
        Command::Progress { task_id, json } => {
            let mut progress: ProgressStore = ProgressStore::new_with_file(&progress_database)?;
            if let Some(record) = progress.get(task_id)? {
                println!("{}", render_progress(&record, *json)?);
                Ok(ExitCode::SUCCESS)
            } else {
                println!("No progress recorded for task '{task_id}'");
                Ok(ExitCode::FAILURE)
            }
        }
        Command::Generations => {
            let mut persistence: Persistence = Persistence::new_with_file(&args.database)?;
            for generation in persistence.list_generations()? {
                println!("{}", render_generation(&generation));
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::NewGeneration { description } => {
            let mut persistence: Persistence = Persistence::new_with_file(&args.database)?;
            let generation: Generation = persistence.new_generation(description)?;
            info!(generation_id = generation.id(), "Created generation");
            println!("{}", render_generation(&generation));
            Ok(ExitCode::SUCCESS)
        }
        Command::ActivateGeneration { id } => {
            let mut persistence: Persistence = Persistence::new_with_file(&args.database)?;
            persistence.activate_generation(*id)?;
            info!(generation_id = id, "Activated generation");
            Ok(ExitCode::SUCCESS)
        }
    }
}
