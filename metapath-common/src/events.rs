//! Job progress events and the in-process event bus
//!
//! Events are coarse-grained: one per stage checkpoint, plus terminal
//! completion/failure. The external job queue subscribes to the bus and
//! persists whatever it needs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Progress events emitted while an annotation job runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JobEvent {
    /// Job reached a fixed progress checkpoint
    StageProgress {
        job_id: Uuid,
        stage: String,
        percent: u8,
        timestamp: DateTime<Utc>,
    },
    /// A search stage was not run (nothing left to search)
    StageSkipped {
        job_id: Uuid,
        stage: String,
        reason: String,
    },
    /// A search stage failed and contributed no hits; the job continues
    StageFailed {
        job_id: Uuid,
        stage: String,
        reason: String,
    },
    /// Both result tables were produced
    JobCompleted {
        job_id: Uuid,
        annotated_proteins: usize,
        pathways_scored: usize,
        timestamp: DateTime<Utc>,
    },
    /// Job failed; no partial results are reported
    JobFailed {
        job_id: Uuid,
        stage: String,
        reason: String,
        timestamp: DateTime<Utc>,
    },
}

impl JobEvent {
    /// Job this event belongs to
    pub fn job_id(&self) -> Uuid {
        match self {
            JobEvent::StageProgress { job_id, .. }
            | JobEvent::StageSkipped { job_id, .. }
            | JobEvent::StageFailed { job_id, .. }
            | JobEvent::JobCompleted { job_id, .. }
            | JobEvent::JobFailed { job_id, .. } => *job_id,
        }
    }

    /// Terminal events end the job's event stream
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobEvent::JobCompleted { .. } | JobEvent::JobFailed { .. })
    }
}

/// Broadcast bus for job events
///
/// Cloning the bus shares the underlying channel.
///
/// # Examples
///
/// ```
/// use metapath_common::events::{EventBus, JobEvent};
///
/// let bus = EventBus::new(100);
/// let mut rx = bus.subscribe();
///
/// let receivers = bus.emit(JobEvent::StageSkipped {
///     job_id: uuid::Uuid::new_v4(),
///     stage: "full_reference_search".to_string(),
///     reason: "all proteins matched".to_string(),
/// });
///
/// assert_eq!(receivers.ok(), Some(1));
/// assert!(rx.try_recv().is_ok());
/// ```
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<JobEvent>,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// # Arguments
    ///
    /// * `capacity` - Number of events to buffer before slow receivers lag
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<JobEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists,
    /// `Err` if nobody is listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(&self, event: JobEvent) -> Result<usize, broadcast::error::SendError<JobEvent>> {
        self.tx.send(event)
    }

    /// Get the current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}
