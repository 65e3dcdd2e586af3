// Job Progress Reporter
//
// Concept: Emit coarse stage/percentage updates for the external job queue
// Synchronization: Integrates with the orchestrator and job runner, emits
// JobEvent on the shared EventBus and publishes JobState on a watch channel
//
// **Reporting Rules:**
// - Percentages are fixed per stage (JobStage::checkpoint_percent), never interpolated
// - JobState.stage is the stage in flight; progress_percent is the last
//   checkpoint reached
// - Progress never moves backwards: a checkpoint lower than the current
//   percent is ignored with a warning
// - Skip flags are recorded in JobState before the skip event is emitted
// - Emission with no subscribers is not an error

use crate::annotation::types::{JobFailure, JobStage, JobState, SearchStage};
use chrono::Utc;
use metapath_common::events::{EventBus, JobEvent};
use tokio::sync::watch;
use tracing::{debug, warn};
use uuid::Uuid;

/// Progress reporter for a single job
///
/// **Legible Software Principle:**
/// - Independent module: Pure event emission, no pipeline logic
/// - Explicit synchronization: EventBus for listeners, watch channel for current state
/// - Integrity: progress_percent is monotonically non-decreasing
pub struct ProgressReporter {
    job_id: Uuid,
    bus: EventBus,
    state: watch::Sender<JobState>,
}

impl ProgressReporter {
    /// Create reporter for a job
    ///
    /// # Arguments
    /// * `job_id` - Job the events belong to
    /// * `bus` - Shared event bus
    pub fn new(job_id: Uuid, bus: EventBus) -> Self {
        let (state, _) = watch::channel(JobState::default());
        Self { job_id, bus, state }
    }

    pub fn job_id(&self) -> Uuid {
        self.job_id
    }

    /// Snapshot of the current job state
    pub fn state(&self) -> JobState {
        self.state.borrow().clone()
    }

    /// Receiver that always sees the latest job state
    pub fn watch_state(&self) -> watch::Receiver<JobState> {
        self.state.subscribe()
    }

    /// Mark the stage the job is now working on (progress unchanged)
    pub fn enter(&self, stage: JobStage) {
        self.state.send_modify(|state| state.stage = stage);
        debug!(job_id = %self.job_id, stage = %stage, "Entering stage");
    }

    /// Advance to a stage checkpoint
    ///
    /// # Returns
    /// true if progress advanced, false if the checkpoint was below current progress
    pub fn checkpoint(&self, stage: JobStage) -> bool {
        let percent = stage.checkpoint_percent();
        let advanced = self.state.send_if_modified(|state| {
            if percent < state.progress_percent {
                return false;
            }
            state.stage = stage;
            state.progress_percent = percent;
            true
        });

        if !advanced {
            warn!(
                job_id = %self.job_id,
                stage = %stage,
                percent,
                current = self.state.borrow().progress_percent,
                "Ignoring progress checkpoint below current progress"
            );
            return false;
        }

        debug!(job_id = %self.job_id, stage = %stage, percent, "Progress checkpoint");
        self.emit(JobEvent::StageProgress {
            job_id: self.job_id,
            stage: stage.name().to_string(),
            percent,
            timestamp: Utc::now(),
        });
        true
    }

    /// Record that a search stage was skipped
    pub fn stage_skipped(&self, stage: SearchStage, reason: &str) {
        self.state.send_modify(|state| {
            state.skip_flags.insert(stage);
        });
        self.emit(JobEvent::StageSkipped {
            job_id: self.job_id,
            stage: stage.name().to_string(),
            reason: reason.to_string(),
        });
    }

    /// Record a recovered stage failure (the job continues)
    pub fn stage_failed(&self, stage: SearchStage, reason: &str) {
        self.emit(JobEvent::StageFailed {
            job_id: self.job_id,
            stage: stage.name().to_string(),
            reason: reason.to_string(),
        });
    }

    /// Final success event
    pub fn completed(&self, annotated_proteins: usize, pathways_scored: usize) {
        self.checkpoint(JobStage::Complete);
        self.emit(JobEvent::JobCompleted {
            job_id: self.job_id,
            annotated_proteins,
            pathways_scored,
            timestamp: Utc::now(),
        });
    }

    /// Final failure event
    pub fn failed(&self, failure: &JobFailure) {
        self.emit(JobEvent::JobFailed {
            job_id: self.job_id,
            stage: failure.stage.name().to_string(),
            reason: failure.reason.clone(),
            timestamp: Utc::now(),
        });
    }

    fn emit(&self, event: JobEvent) {
        match self.bus.emit(event) {
            Ok(receivers) => debug!(job_id = %self.job_id, receivers, "Job event broadcast"),
            Err(_) => debug!(job_id = %self.job_id, "No receivers for job event"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checkpoints_are_monotonic() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();
        let reporter = ProgressReporter::new(Uuid::new_v4(), bus);

        assert!(reporter.checkpoint(JobStage::SmallReferenceSearch));
        assert!(!reporter.checkpoint(JobStage::ProfileSearch));
        assert_eq!(reporter.state().progress_percent, 40);
        assert_eq!(reporter.state().stage, JobStage::SmallReferenceSearch);

        // only the accepted checkpoint was broadcast
        assert!(matches!(rx.try_recv(), Ok(JobEvent::StageProgress { percent: 40, .. })));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_enter_changes_stage_not_percent() {
        let reporter = ProgressReporter::new(Uuid::new_v4(), EventBus::new(4));
        reporter.checkpoint(JobStage::ProfileSearch);
        reporter.enter(JobStage::SmallReferenceSearch);

        let state = reporter.state();
        assert_eq!(state.stage, JobStage::SmallReferenceSearch);
        assert_eq!(state.progress_percent, 25);
    }

    #[test]
    fn test_skip_sets_flag() {
        let reporter = ProgressReporter::new(Uuid::new_v4(), EventBus::new(4));
        reporter.stage_skipped(SearchStage::FullReferenceSearch, "all proteins matched");
        assert!(reporter
            .state()
            .skip_flags
            .contains(&SearchStage::FullReferenceSearch));
    }

    #[test]
    fn test_watch_sees_latest_state() {
        let reporter = ProgressReporter::new(Uuid::new_v4(), EventBus::new(4));
        let watcher = reporter.watch_state();
        reporter.checkpoint(JobStage::Merge);
        assert_eq!(watcher.borrow().stage, JobStage::Merge);
    }

    #[test]
    fn test_completion_reaches_hundred() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();
        let reporter = ProgressReporter::new(Uuid::new_v4(), bus);

        reporter.completed(3, 2);
        assert_eq!(reporter.state().progress_percent, 100);
        assert!(matches!(rx.try_recv(), Ok(JobEvent::StageProgress { percent: 100, .. })));
        assert!(matches!(
            rx.try_recv(),
            Ok(JobEvent::JobCompleted { annotated_proteins: 3, pathways_scored: 2, .. })
        ));
    }
}
