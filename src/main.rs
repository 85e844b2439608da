//! Bulk-Extract main entry point
//!
//! This is the command-line interface for batch page extraction.

use anyhow::Context;
use bulk_extract::config::{load_config_with_hash, Config, LoggingConfig};
use bulk_extract::extract::{build_extractor, extract_single};
use bulk_extract::input::load_url_csv;
use bulk_extract::job::{BulkJob, JobStatus};
use bulk_extract::logging::file_appender;
use bulk_extract::output::{print_statistics, ArtifactStore};
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Bulk-Extract: structured field extraction from lists of web pages
///
/// Bulk-Extract renders each page in an isolated browser session (or fetches
/// it over plain HTTP), extracts a configured set of fields, and writes the
/// results to a CSV artifact that is refreshed after every batch.
#[derive(Parser, Debug)]
#[command(name = "bulk-extract")]
#[command(version = "1.0.0")]
#[command(about = "Batch extraction of structured fields from web pages", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (defaults are used when omitted)
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose", global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract fields from a single URL and print them as JSON
    Scrape {
        #[arg(value_name = "URL")]
        url: String,
    },

    /// Extract fields from every URL in a CSV file with a `url` column
    ScrapeAll {
        #[arg(value_name = "CSV")]
        input: PathBuf,

        /// Validate config and input and show what would run without extracting
        #[arg(long)]
        dry_run: bool,
    },

    /// Write a finished artifact to a file or stdout
    Download {
        #[arg(value_name = "ARTIFACT_ID")]
        artifact_id: String,

        /// Destination file (stdout when omitted)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // The guard flushes the log file writer when main returns
    let (config, _log_guard) = match &cli.config {
        Some(path) => {
            let (config, hash) = load_config_with_hash(path)?;
            let guard = setup_logging(cli.verbose, cli.quiet, &config.logging)?;
            tracing::info!("Loaded configuration from: {}", path.display());
            tracing::info!("Configuration hash: {}", hash);
            (config, guard)
        }
        None => {
            let config = Config::default();
            let guard = setup_logging(cli.verbose, cli.quiet, &config.logging)?;
            tracing::info!("No configuration file given, using defaults");
            (config, guard)
        }
    };

    let outcome = match cli.command {
        Command::Scrape { url } => handle_scrape(&config, &url).await,
        Command::ScrapeAll { input, dry_run } if dry_run => handle_dry_run(&config, &input),
        Command::ScrapeAll { input, .. } => handle_scrape_all(&config, &input).await,
        Command::Download {
            artifact_id,
            output,
        } => handle_download(&config, &artifact_id, output.as_deref()),
    };

    if let Err(e) = &outcome {
        tracing::error!("{:#}", e);
    }
    Ok(outcome?)
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// When a log file is configured, events are also written to it without
/// ANSI colors through a non-blocking rolling appender. The returned guard
/// must be kept alive for the writer to flush.
fn setup_logging(
    verbose: u8,
    quiet: bool,
    logging: &LoggingConfig,
) -> anyhow::Result<Option<WorkerGuard>> {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("bulk_extract=info,warn"),
            1 => EnvFilter::new("bulk_extract=debug,info"),
            2 => EnvFilter::new("bulk_extract=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    let console = fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false);

    let (file_layer, guard) = match file_appender(logging)? {
        Some(appender) => {
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_ansi(false)
                .with_target(false)
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file_layer)
        .init();

    Ok(guard)
}

/// Handles `scrape`: extracts one URL and prints the fields
async fn handle_scrape(config: &Config, url: &str) -> anyhow::Result<()> {
    let extractor = build_extractor(config)?;
    let fields = extract_single(extractor.as_ref(), url)
        .await
        .with_context(|| format!("Failed to extract {}", url))?;

    println!("{}", serde_json::to_string_pretty(&fields)?);
    Ok(())
}

/// Handles `scrape-all --dry-run`: validates input and shows what would run
fn handle_dry_run(config: &Config, input: &Path) -> anyhow::Result<()> {
    let records = load_url_csv(input)?;
    let batch_size = config.batch.batch_size;

    println!("=== Bulk-Extract Dry Run ===\n");

    println!("Input:");
    println!("  File: {}", input.display());
    println!("  URLs: {}", records.len());
    println!("  Batches: {}", records.len().div_ceil(batch_size));

    println!("\nBatch Configuration:");
    println!("  Batch size: {}", batch_size);
    println!(
        "  Max concurrent extractions: {}",
        config.batch.max_concurrent_extractions
    );
    println!(
        "  Extraction timeout: {}s",
        config.batch.extraction_timeout_secs
    );

    println!("\nExtractor:");
    println!("  Backend: {:?}", config.extractor.backend);
    println!("  Headless: {}", config.extractor.headless);
    if let Some(chrome) = &config.extractor.chrome_executable {
        println!("  Chrome executable: {}", chrome.display());
    }

    println!("\nFields ({}):", config.fields.len());
    for field in &config.fields {
        let source = field.attribute.as_deref().unwrap_or("text");
        let required = if field.required { "required" } else { "optional" };
        println!(
            "  - {} <- '{}' [{}, {}]",
            field.name, field.selector, source, required
        );
    }

    println!("\nOutput:");
    println!(
        "  {}/{}_<YYYYMMDDHHMMSS>.csv",
        config.output.directory.display(),
        config.output.file_prefix
    );

    println!("\n✓ Configuration and input are valid");
    Ok(())
}

/// Exit status after a forced interrupt (128 + SIGINT)
const EXIT_INTERRUPTED: i32 = 130;

#[derive(Debug, PartialEq, Eq)]
enum InterruptAction {
    StopAfterBatch,
    Exit,
}

/// The first Ctrl-C drains the running batch, any further one exits
fn interrupt_action(interrupts: u32) -> InterruptAction {
    if interrupts <= 1 {
        InterruptAction::StopAfterBatch
    } else {
        InterruptAction::Exit
    }
}

/// Handles `scrape-all`: runs the bulk job until done or interrupted
async fn handle_scrape_all(config: &Config, input: &Path) -> anyhow::Result<()> {
    let job = BulkJob::build(config)?;

    let cancel = job.cancellation_token();
    tokio::spawn(async move {
        let mut interrupts = 0;
        while tokio::signal::ctrl_c().await.is_ok() {
            interrupts += 1;
            match interrupt_action(interrupts) {
                InterruptAction::StopAfterBatch => {
                    tracing::warn!(
                        "Interrupt received, stopping after the current batch (Ctrl-C again exits now)"
                    );
                    cancel.cancel();
                }
                InterruptAction::Exit => {
                    tracing::error!("Second interrupt received, exiting without waiting");
                    std::process::exit(EXIT_INTERRUPTED);
                }
            }
        }
    });

    let result = job.submit_csv(input).await?;

    match result.status {
        JobStatus::Completed => println!("Job completed."),
        JobStatus::Cancelled { batches_completed } => println!(
            "Job cancelled after {} batches; partial results were kept.",
            batches_completed
        ),
    }
    println!("Artifact: {}", result.artifact_id);
    println!("Path: {}\n", result.artifact_path.display());

    print_statistics(&result.statistics());
    Ok(())
}

/// Handles `download`: copies an artifact to a file or stdout
fn handle_download(config: &Config, artifact_id: &str, output: Option<&Path>) -> anyhow::Result<()> {
    let store = ArtifactStore::from_config(&config.output);
    let bytes = store.read(artifact_id)?;

    match output {
        Some(path) => {
            std::fs::write(path, &bytes)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            tracing::info!("Wrote {} bytes to {}", bytes.len(), path.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(&bytes)?;
            stdout.flush()?;
        }
    }

    Ok(())
}
