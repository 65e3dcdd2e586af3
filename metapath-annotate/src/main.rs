//! metapath-annotate - Main entry point
//!
//! Annotates a batch of protein sequences, scores pathway coverage and writes:
//! - `enzymes.csv` - one row per annotated protein
//! - `pathways.csv` - one row per catalog pathway
//! - `annotated.faa` - input records that received an annotation

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use metapath_annotate::annotation::output_tables::{write_annotated_fasta, write_table};
use metapath_annotate::annotation::tier1::sequence_batch::validate_input_file;
use metapath_annotate::config::{AnnotateConfig, ConfigOverrides};
use metapath_annotate::{AnnotationContext, CommandCollaborator, JobRequest, JobScheduler};
use metapath_common::config::{resolve_config_path, CONFIG_ENV_VAR};
use metapath_common::events::{EventBus, JobEvent};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Most input files accepted for one job
const MAX_INPUT_FILES: usize = 3;

/// Command-line arguments for metapath-annotate
#[derive(Parser, Debug)]
#[command(name = "metapath-annotate")]
#[command(about = "Protein functional annotation and pathway coverage scoring")]
#[command(version)]
struct Args {
    /// Input FASTA files (up to 3, combined into one batch)
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Configuration file
    #[arg(short, long, env = "METAPATH_CONFIG")]
    config: Option<PathBuf>,

    /// Directory for the result tables
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// Thread count passed to the search tools
    #[arg(short, long, env = "METAPATH_THREADS")]
    threads: Option<usize>,

    /// Parent directory for per-job working directories
    #[arg(long, env = "METAPATH_WORK_DIR")]
    work_dir: Option<PathBuf>,

    /// Pathway catalog CSV
    #[arg(long, env = "METAPATH_PATHWAYS")]
    pathways: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = resolve_config_path(args.config.as_deref(), CONFIG_ENV_VAR);
    let mut config = AnnotateConfig::load(config_path.as_deref()).context("Failed to load configuration")?;
    config
        .apply_overrides(ConfigOverrides {
            threads: args.threads,
            work_dir: args.work_dir.clone(),
            pathway_catalog: args.pathways.clone(),
        })
        .context("Invalid command-line override")?;

    init_tracing(&config)?;

    info!("Starting metapath-annotate");
    match &config_path {
        Some(path) => info!("Configuration: {}", path.display()),
        None => info!("Configuration: built-in defaults"),
    }

    if args.inputs.len() > MAX_INPUT_FILES {
        bail!("At most {} input files per job, got {}", MAX_INPUT_FILES, args.inputs.len());
    }
    let mut sequences = Vec::new();
    for input in &args.inputs {
        validate_input_file(input, config.max_input_bytes)
            .with_context(|| format!("Rejected input {}", input.display()))?;
        let bytes = std::fs::read(input).with_context(|| format!("Failed to read {}", input.display()))?;
        sequences.extend_from_slice(&bytes);
        if !sequences.ends_with(b"\n") {
            sequences.push(b'\n');
        }
    }

    std::fs::create_dir_all(&args.output_dir)
        .with_context(|| format!("Failed to create output directory {}", args.output_dir.display()))?;

    let collaborator = Arc::new(CommandCollaborator::new(config.tools.clone()));
    let context = AnnotationContext::load(config).context("Failed to load reference data")?;

    let bus = EventBus::new(100);
    let progress_log = tokio::spawn(log_progress(bus.subscribe()));

    let scheduler = JobScheduler::new(context, collaborator, bus);
    let request = JobRequest::new(sequences);
    info!("Job {} submitted", request.job_id);

    let result = scheduler.submit(request).await;
    // scheduler owns the last sender; dropping it ends the progress stream
    drop(scheduler);
    let _ = progress_log.await;

    let output = result.map_err(|failure| anyhow::anyhow!("Job failed at {}: {}", failure.stage, failure.reason))?;

    let enzymes_path = args.output_dir.join("enzymes.csv");
    let pathways_path = args.output_dir.join("pathways.csv");
    let fasta_path = args.output_dir.join("annotated.faa");

    write_table(&enzymes_path, &output.enzyme_table).context("Failed to write enzyme table")?;
    write_table(&pathways_path, &output.pathway_table).context("Failed to write pathway table")?;
    let annotated = write_annotated_fasta(&fasta_path, &output.batch, &output.annotations)
        .context("Failed to write annotated FASTA")?;

    info!(
        "Annotated {} of {} proteins; {} pathways scored",
        annotated,
        output.batch.len(),
        output.pathway_table.len()
    );
    Ok(())
}

/// Initialize tracing: RUST_LOG, else the configured level; optional log file
fn init_tracing(config: &AnnotateConfig) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("metapath_annotate={0},metapath_common={0}", config.logging.level).into());

    let file_layer = match &config.logging.file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(std::sync::Mutex::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(file_layer)
        .init();
    Ok(())
}

/// Log job events until the bus closes or the job ends
async fn log_progress(mut rx: tokio::sync::broadcast::Receiver<JobEvent>) {
    use tokio::sync::broadcast::error::RecvError;

    loop {
        match rx.recv().await {
            Ok(JobEvent::StageProgress { stage, percent, .. }) => info!("[{:>3}%] {}", percent, stage),
            Ok(JobEvent::StageSkipped { stage, reason, .. }) => info!("Skipped {}: {}", stage, reason),
            Ok(JobEvent::StageFailed { stage, reason, .. }) => {
                tracing::warn!("Stage {} failed, continuing: {}", stage, reason)
            }
            Ok(event) if event.is_terminal() => break,
            Ok(_) => {}
            Err(RecvError::Lagged(missed)) => tracing::debug!("Progress log lagged by {} events", missed),
            Err(RecvError::Closed) => break,
        }
    }
}
