// Tiered Search Orchestrator
//
// Concept: Decide per job which search stages run, invoke them in order and
// route their raw output to the matching parser
// Synchronization: Accepts validated batch, outputs SearchOutcome (all hits + stage record)
//
// Algorithm:
// 1. Profile search over the full batch (always runs)
// 2. Small reference search over the full batch (always runs, independent of step 1)
// 3. remaining = batch proteins with no SMALL_REF hit
//    - empty     -> skip full reference search (skip flag recorded)
//    - otherwise -> full reference search over `remaining` only
// 4. Fixed progress checkpoint after each stage
//
// Failure handling:
// - A stage whose invocation fails contributes zero hits; logged, job continues
// - If every stage that was scheduled failed -> AllSearchStagesFailed

use crate::annotation::collaborator::{SearchCollaborator, StageRequest};
use crate::annotation::progress_reporter::ProgressReporter;
use crate::annotation::tier1::sequence_batch::write_fasta;
use crate::annotation::tier1::{
    FullReferenceParser, GeneKoMap, ProfileReportParser, SmallReferenceParser,
};
use crate::annotation::types::{
    AnnotationError, AnnotationHit, AnnotationResult, HitSource, SearchStage, SequenceRecord,
    StageInvocationError,
};
use crate::config::AnnotateConfig;
use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// What happened to one search stage
#[derive(Debug, Clone, PartialEq)]
pub enum StageStatus {
    Completed { hits: usize },
    Skipped,
    Failed { reason: String },
}

/// Result of the search phase of a job
#[derive(Debug, Clone, Default)]
pub struct SearchOutcome {
    /// Hits from every stage that ran, in stage order
    pub hits: Vec<AnnotationHit>,
    /// Per-stage status in execution order
    pub stages: Vec<(SearchStage, StageStatus)>,
}

impl SearchOutcome {
    /// Hits produced by one stage
    pub fn hits_from(&self, stage: SearchStage) -> impl Iterator<Item = &AnnotationHit> {
        let source = stage.hit_source();
        self.hits.iter().filter(move |h| h.source == source)
    }
}

/// Tiered search orchestrator for one job
///
/// **Legible Software Principle:**
/// - Independent module: Owns only the stage decision logic
/// - Explicit synchronization: Tool access only through SearchCollaborator
/// - Transparent behavior: Skip rule is per protein, never a batch-level threshold
/// - Integrity: Full reference search never sees a protein with a SMALL_REF hit
pub struct SearchOrchestrator<'a> {
    job_id: Uuid,
    job_dir: PathBuf,
    config: &'a AnnotateConfig,
    collaborator: &'a dyn SearchCollaborator,
    reporter: &'a ProgressReporter,
    profile_parser: ProfileReportParser,
    small_ref_parser: SmallReferenceParser,
    full_ref_parser: FullReferenceParser,
}

impl<'a> SearchOrchestrator<'a> {
    /// Create orchestrator for one job
    ///
    /// # Arguments
    /// * `job_dir` - Per-job working directory (must exist)
    /// * `config` - Reference paths, threads, timeouts
    /// * `gene_map` - Shared subject id -> KO map for reference hits
    /// * `collaborator` - Tool invocation abstraction
    /// * `reporter` - Progress reporter for this job
    pub fn new(
        job_dir: &Path,
        config: &'a AnnotateConfig,
        gene_map: Arc<GeneKoMap>,
        collaborator: &'a dyn SearchCollaborator,
        reporter: &'a ProgressReporter,
    ) -> Self {
        Self {
            job_id: reporter.job_id(),
            job_dir: job_dir.to_path_buf(),
            config,
            collaborator,
            reporter,
            profile_parser: ProfileReportParser::new(),
            small_ref_parser: SmallReferenceParser::new(Arc::clone(&gene_map)),
            full_ref_parser: FullReferenceParser::new(gene_map),
        }
    }

    /// Run the search phase
    ///
    /// # Returns
    /// All hits plus per-stage status, or AllSearchStagesFailed
    pub async fn run(&self, batch: &[SequenceRecord]) -> AnnotationResult<SearchOutcome> {
        let mut outcome = SearchOutcome::default();

        let full_query = self.job_dir.join("query_all.faa");
        write_fasta(&full_query, batch)?;

        // Stages 1 and 2: always over the full batch
        for stage in [SearchStage::ProfileSearch, SearchStage::SmallReferenceSearch] {
            self.reporter.enter(stage.job_stage());
            self.run_and_record(stage, &full_query, &mut outcome).await;
            self.reporter.checkpoint(stage.job_stage());
        }

        // Stage 3: only proteins the small reference search did not match
        let matched: HashSet<&str> = outcome
            .hits_from(SearchStage::SmallReferenceSearch)
            .map(|h| h.protein_id.as_str())
            .collect();
        let remaining: Vec<&SequenceRecord> = batch
            .iter()
            .filter(|r| !matched.contains(r.protein_id.as_str()))
            .collect();

        let full_stage = SearchStage::FullReferenceSearch;
        self.reporter.enter(full_stage.job_stage());
        if remaining.is_empty() {
            info!(
                job_id = %self.job_id,
                matched = matched.len(),
                "Every protein matched the small reference, skipping full reference search"
            );
            self.reporter
                .stage_skipped(full_stage, "every protein matched the small reference");
            outcome.stages.push((full_stage, StageStatus::Skipped));
        } else {
            info!(
                job_id = %self.job_id,
                remaining = remaining.len(),
                total = batch.len(),
                "Running full reference search on unmatched proteins"
            );
            let remaining_query = self.job_dir.join("query_remaining.faa");
            write_fasta(&remaining_query, remaining.iter().copied())?;

            let remaining_ids: HashSet<&str> = remaining.iter().map(|r| r.protein_id.as_str()).collect();
            self.run_and_record(full_stage, &remaining_query, &mut outcome).await;

            // keep only hits for proteins that were in the query set
            let before = outcome.hits.len();
            outcome
                .hits
                .retain(|h| h.source != HitSource::FullRef || remaining_ids.contains(h.protein_id.as_str()));
            let foreign = before - outcome.hits.len();
            if foreign > 0 {
                warn!(job_id = %self.job_id, foreign, "Dropped full reference hits outside the query set");
            }
        }
        self.reporter.checkpoint(full_stage.job_stage());

        let failures: Vec<String> = outcome
            .stages
            .iter()
            .filter_map(|(stage, status)| match status {
                StageStatus::Failed { reason } => Some(format!("{}: {}", stage, reason)),
                _ => None,
            })
            .collect();
        let scheduled = outcome
            .stages
            .iter()
            .filter(|(_, status)| *status != StageStatus::Skipped)
            .count();

        if scheduled > 0 && failures.len() == scheduled {
            return Err(AnnotationError::AllSearchStagesFailed(failures.join("; ")));
        }

        let sources: BTreeSet<_> = outcome.hits.iter().map(|h| h.source).collect();
        info!(
            job_id = %self.job_id,
            hits = outcome.hits.len(),
            sources = ?sources,
            failed_stages = failures.len(),
            "Search phase complete"
        );
        Ok(outcome)
    }

    /// Run one stage; failures are absorbed into the outcome
    async fn run_and_record(&self, stage: SearchStage, query_path: &Path, outcome: &mut SearchOutcome) {
        match self.run_stage(stage, query_path).await {
            Ok(hits) => {
                info!(job_id = %self.job_id, stage = %stage, hits = hits.len(), "Search stage complete");
                outcome.stages.push((stage, StageStatus::Completed { hits: hits.len() }));
                outcome.hits.extend(hits);
            }
            Err(e) => {
                warn!(job_id = %self.job_id, stage = %stage, error = %e, "Search stage failed, continuing without its hits");
                let reason = e.to_string();
                self.reporter.stage_failed(stage, &reason);
                outcome.stages.push((stage, StageStatus::Failed { reason }));
            }
        }
    }

    async fn run_stage(
        &self,
        stage: SearchStage,
        query_path: &Path,
    ) -> Result<Vec<AnnotationHit>, StageInvocationError> {
        let reference_path = self
            .config
            .reference_for(stage)
            .ok_or_else(|| StageInvocationError::MissingReference(format!("no {} reference configured", stage)))?
            .to_path_buf();

        let query_bytes = std::fs::metadata(query_path)
            .map(|m| m.len())
            .map_err(|e| StageInvocationError::UnreadableOutput(format!("query file: {}", e)))?;

        let request = StageRequest {
            job_id: self.job_id,
            stage,
            query_path: query_path.to_path_buf(),
            reference_path,
            output_path: self.job_dir.join(format!("{}.out", stage.name())),
            threads: self.config.threads,
            timeout: self.config.stage_timeout(stage, query_bytes),
        };

        let raw = self.collaborator.run_search(&request).await?;
        let hits = match stage {
            SearchStage::ProfileSearch => self.profile_parser.parse(&raw.bytes),
            SearchStage::SmallReferenceSearch => self.small_ref_parser.parse(&raw.bytes),
            SearchStage::FullReferenceSearch => self.full_ref_parser.parse(&raw.bytes),
        };
        Ok(hits)
    }
}
