// Annotation Job Runner
//
// Concept: Run one annotation job end to end, one job at a time
// Synchronization: Accepts JobRequest (raw FASTA), outputs JobOutput or JobFailure
//
// Job workflow:
// 1. Validate the batch (EmptyBatch is fatal before any stage runs)
// 2. Wipe and recreate <work_dir>/<job_id>/ so a restarted job regenerates everything
// 3. Tiered search (SearchOrchestrator)
// 4. Merge (AnnotationMerger)
// 5. Pathway scoring (PathwayScorer)
// 6. Build enzyme and pathway tables; discard the job directory
//
// Scheduling:
// - RunSlot admits at most one running job (explicit acquire/release)
// - JobScheduler wraps each job in a wall-clock ceiling; exceeding it fails the
//   job at the stage it had reached
// - A failed job never reports partial results

use crate::annotation::collaborator::SearchCollaborator;
use crate::annotation::output_tables::{enzyme_rows, pathway_rows, EnzymeRow, PathwayRow};
use crate::annotation::progress_reporter::ProgressReporter;
use crate::annotation::search_orchestrator::{SearchOrchestrator, StageStatus};
use crate::annotation::tier1::sequence_batch::parse_fasta;
use crate::annotation::tier1::GeneKoMap;
use crate::annotation::tier2::AnnotationMerger;
use crate::annotation::tier3::{PathwayCatalog, PathwayScorer};
use crate::annotation::types::{
    AnnotationError, AnnotationResult, JobFailure, JobStage, JobState, MergedAnnotation,
    PathwayScore, SearchStage, SequenceRecord,
};
use crate::config::AnnotateConfig;
use metapath_common::events::EventBus;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use uuid::Uuid;

/// Process-wide read-only inputs, loaded once and shared by every job
#[derive(Debug, Clone)]
pub struct AnnotationContext {
    pub config: Arc<AnnotateConfig>,
    pub catalog: Arc<PathwayCatalog>,
    pub gene_map: Arc<GeneKoMap>,
}

impl AnnotationContext {
    pub fn new(config: AnnotateConfig, catalog: PathwayCatalog, gene_map: GeneKoMap) -> Self {
        Self {
            config: Arc::new(config),
            catalog: Arc::new(catalog),
            gene_map: Arc::new(gene_map),
        }
    }

    /// Load the pathway catalog and optional gene map named by the configuration
    pub fn load(config: AnnotateConfig) -> AnnotationResult<Self> {
        let catalog_path = config.databases.pathway_catalog.as_deref().ok_or_else(|| {
            AnnotationError::Config("databases.pathway_catalog is not set".to_string())
        })?;
        let catalog = PathwayCatalog::load(catalog_path)?;

        let gene_map = match config.databases.gene_ko_map.as_deref() {
            Some(path) => GeneKoMap::load(path)?,
            None => GeneKoMap::default(),
        };

        Ok(Self::new(config, catalog, gene_map))
    }
}

/// One job submission
#[derive(Debug, Clone)]
pub struct JobRequest {
    pub job_id: Uuid,
    /// Raw FASTA bytes of the input batch
    pub sequences: Vec<u8>,
}

impl JobRequest {
    pub fn new(sequences: impl Into<Vec<u8>>) -> Self {
        Self {
            job_id: Uuid::new_v4(),
            sequences: sequences.into(),
        }
    }
}

/// Completed job results
#[derive(Debug, Clone)]
pub struct JobOutput {
    pub job_id: Uuid,
    pub batch: Vec<SequenceRecord>,
    pub annotations: Vec<MergedAnnotation>,
    pub pathway_scores: Vec<PathwayScore>,
    pub enzyme_table: Vec<EnzymeRow>,
    pub pathway_table: Vec<PathwayRow>,
    pub stages: Vec<(SearchStage, StageStatus)>,
    pub final_state: JobState,
}

/// Run one annotation job
///
/// # Arguments
/// * `request` - Job id and raw input FASTA
/// * `context` - Shared configuration, pathway catalog and gene map
/// * `collaborator` - Search tool abstraction
/// * `reporter` - Progress reporter for this job
///
/// # Returns
/// Both result tables, or a JobFailure naming the stage and reason
pub async fn run_annotation_job(
    request: &JobRequest,
    context: &AnnotationContext,
    collaborator: &dyn SearchCollaborator,
    reporter: &ProgressReporter,
) -> Result<JobOutput, JobFailure> {
    tracing::info!(job_id = %request.job_id, bytes = request.sequences.len(), "Annotation job started");

    match execute(request, context, collaborator, reporter).await {
        Ok(output) => {
            reporter.completed(output.annotations.len(), output.pathway_scores.len());
            tracing::info!(
                job_id = %request.job_id,
                annotated = output.annotations.len(),
                pathways = output.pathway_scores.len(),
                "Annotation job complete"
            );
            Ok(JobOutput {
                final_state: reporter.state(),
                ..output
            })
        }
        Err(e) => {
            let failure = JobFailure::new(reporter.state().stage, &e);
            tracing::error!(
                job_id = %request.job_id,
                stage = %failure.stage,
                reason = %failure.reason,
                "Annotation job failed"
            );
            reporter.failed(&failure);
            Err(failure)
        }
    }
}

async fn execute(
    request: &JobRequest,
    context: &AnnotationContext,
    collaborator: &dyn SearchCollaborator,
    reporter: &ProgressReporter,
) -> AnnotationResult<JobOutput> {
    reporter.enter(JobStage::Validating);
    let batch = parse_fasta(&request.sequences)?;
    let job_dir = prepare_job_dir(&context.config.work_dir, request.job_id)?;
    reporter.checkpoint(JobStage::Validating);

    let orchestrator = SearchOrchestrator::new(
        &job_dir,
        &context.config,
        Arc::clone(&context.gene_map),
        collaborator,
        reporter,
    );
    let search = orchestrator.run(&batch).await?;

    reporter.enter(JobStage::Merge);
    let annotations = AnnotationMerger::new().merge(&search.hits, &batch);
    reporter.checkpoint(JobStage::Merge);

    reporter.enter(JobStage::PathwayScoring);
    let pathway_scores = PathwayScorer::new().score(&annotations, &context.catalog);
    reporter.checkpoint(JobStage::PathwayScoring);

    let enzyme_table = enzyme_rows(&annotations);
    let pathway_table = pathway_rows(&pathway_scores);

    if let Err(e) = std::fs::remove_dir_all(&job_dir) {
        tracing::warn!(job_dir = %job_dir.display(), error = %e, "Could not remove job directory");
    }

    Ok(JobOutput {
        job_id: request.job_id,
        batch,
        annotations,
        pathway_scores,
        enzyme_table,
        pathway_table,
        stages: search.stages,
        final_state: reporter.state(),
    })
}

/// Fresh per-job working directory (any earlier attempt's files are removed)
fn prepare_job_dir(work_dir: &Path, job_id: Uuid) -> AnnotationResult<PathBuf> {
    let job_dir = work_dir.join(job_id.to_string());
    if job_dir.exists() {
        tracing::info!(job_dir = %job_dir.display(), "Removing state from earlier attempt");
        std::fs::remove_dir_all(&job_dir)?;
    }
    std::fs::create_dir_all(&job_dir)?;
    Ok(job_dir)
}

// ============================================================================
// Run slot and scheduler
// ============================================================================

/// At-most-one-running-job slot
#[derive(Debug, Clone)]
pub struct RunSlot {
    semaphore: Arc<Semaphore>,
}

/// Held while a job runs; dropping it releases the slot
#[derive(Debug)]
pub struct RunSlotGuard {
    _permit: OwnedSemaphorePermit,
}

impl Default for RunSlot {
    fn default() -> Self {
        Self::new()
    }
}

impl RunSlot {
    pub fn new() -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(1)),
        }
    }

    /// Wait for the slot
    pub async fn acquire(&self) -> AnnotationResult<RunSlotGuard> {
        let permit = Arc::clone(&self.semaphore)
            .acquire_owned()
            .await
            .map_err(|e| AnnotationError::Config(format!("run slot closed: {}", e)))?;
        Ok(RunSlotGuard { _permit: permit })
    }

    pub fn is_busy(&self) -> bool {
        self.semaphore.available_permits() == 0
    }
}

/// Runs submitted jobs one at a time under a wall-clock ceiling
pub struct JobScheduler {
    context: AnnotationContext,
    collaborator: Arc<dyn SearchCollaborator>,
    bus: EventBus,
    slot: RunSlot,
}

impl JobScheduler {
    pub fn new(context: AnnotationContext, collaborator: Arc<dyn SearchCollaborator>, bus: EventBus) -> Self {
        Self {
            context,
            collaborator,
            bus,
            slot: RunSlot::new(),
        }
    }

    pub fn run_slot(&self) -> &RunSlot {
        &self.slot
    }

    /// Run a job once the slot is free
    pub async fn submit(&self, request: JobRequest) -> Result<JobOutput, JobFailure> {
        let reporter = ProgressReporter::new(request.job_id, self.bus.clone());

        if self.slot.is_busy() {
            tracing::info!(job_id = %request.job_id, "Another job is running, waiting for the run slot");
        }
        let _guard = self.slot.acquire().await.map_err(|e| {
            let failure = JobFailure::new(JobStage::Validating, &e);
            reporter.failed(&failure);
            failure
        })?;

        let ceiling = self.context.config.job_ceiling();
        let job = run_annotation_job(&request, &self.context, self.collaborator.as_ref(), &reporter);

        match tokio::time::timeout(ceiling, job).await {
            Ok(result) => result,
            Err(_) => {
                let failure = JobFailure::new(reporter.state().stage, &AnnotationError::Watchdog(ceiling));
                tracing::error!(
                    job_id = %request.job_id,
                    stage = %failure.stage,
                    ceiling_secs = ceiling.as_secs(),
                    "Job exceeded wall-clock ceiling, forcibly failed"
                );
                reporter.failed(&failure);
                Err(failure)
            }
        }
    }
}
