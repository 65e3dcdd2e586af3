// Shared Types and Data Contracts
//
// This module defines the explicit data contracts between the three tiers of
// the annotation pipeline:
//   Tier 1 (sequence batch + hit parsers) -> AnnotationHit
//   Tier 2 (annotation merger)            -> MergedAnnotation
//   Tier 3 (pathway scorer)               -> PathwayScore
//
// Every record is produced once per job and never revised. A retried stage
// regenerates its records from scratch.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

// ============================================================================
// Input: Sequence Batch
// ============================================================================

/// One protein sequence from the input batch
///
/// Contract: `protein_id` is unique within a batch and never a placeholder token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceRecord {
    pub protein_id: String,
    pub sequence: String,
}

// ============================================================================
// Tier 1 Outputs: Parsed Hits
// ============================================================================

/// Search stage that produced a hit
///
/// Declaration order is merge priority: Profile > FullRef > SmallRef.
/// `Ord` follows declaration order, so iterating a `BTreeSet<HitSource>`
/// visits sources highest priority first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HitSource {
    Profile,   // profile search against the reduced profile catalog
    FullRef,   // full reference search over unmatched proteins
    SmallRef,  // small reference search over the whole batch
}

impl HitSource {
    /// Merge priority rank (lower wins)
    pub fn priority_rank(self) -> u8 {
        match self {
            Self::Profile => 0,
            Self::FullRef => 1,
            Self::SmallRef => 2,
        }
    }

    /// High-priority sources can alone justify MEDIUM confidence
    pub fn is_high_priority(self) -> bool {
        matches!(self, Self::Profile | Self::FullRef)
    }

    /// Label used in the enzyme table's annotation_source column
    pub fn label(self) -> &'static str {
        match self {
            Self::Profile => "profile",
            Self::FullRef => "full_ref",
            Self::SmallRef => "small_ref",
        }
    }
}

/// Uniform hit record produced by every parser
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationHit {
    pub protein_id: String,
    pub ko_id: Option<String>,
    pub ec_number: Option<String>,
    pub score: f64,  // f64::NEG_INFINITY when the tool's score was unparseable
    pub source: HitSource,
}

// ============================================================================
// Tier 2 Outputs: Merged Annotations
// ============================================================================

/// Confidence of a merged annotation
///
/// Declaration order is the enzyme table's sort order (HIGH first).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Confidence {
    High,    // ≥2 sources agree on the chosen KO
    Medium,  // exactly one high-priority source contributed
    Low,     // everything else
}

impl Confidence {
    pub fn label(self) -> &'static str {
        match self {
            Self::High => "HIGH",
            Self::Medium => "MEDIUM",
            Self::Low => "LOW",
        }
    }
}

/// One annotation per protein (output of AnnotationMerger)
#[derive(Debug, Clone, PartialEq)]
pub struct MergedAnnotation {
    pub protein_id: String,
    pub ko_id: Option<String>,
    pub ec_number: Option<String>,
    pub confidence: Confidence,
    pub contributing_sources: BTreeSet<HitSource>,
}

// ============================================================================
// Tier 3 Inputs/Outputs: Pathway Catalog and Scores
// ============================================================================

/// Static pathway definition (loaded once, read-only)
#[derive(Debug, Clone, PartialEq)]
pub struct PathwayDefinition {
    pub name: String,
    pub expected_ko_set: BTreeSet<String>,
    pub weight: f64,
}

/// Pathway health category derived from the weighted score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HealthStatus {
    Critical,  // score < 0.1
    Low,       // 0.1 <= score < 0.5
    Normal,    // 0.5 <= score <= 2.0
    Optimal,   // score > 2.0
}

impl HealthStatus {
    pub fn label(self) -> &'static str {
        match self {
            Self::Critical => "CRITICAL",
            Self::Low => "LOW",
            Self::Normal => "NORMAL",
            Self::Optimal => "OPTIMAL",
        }
    }
}

/// Per-pathway result (created once, never mutated)
#[derive(Debug, Clone, PartialEq)]
pub struct PathwayScore {
    pub pathway_name: String,
    pub coverage: f64,  // [0.0, 1.0]
    pub score: f64,     // coverage × weight
    pub detected_ko_set: BTreeSet<String>,
    pub expected_count: usize,
    pub weight: f64,
    pub health_status: HealthStatus,
}

// ============================================================================
// Job Stages and State
// ============================================================================

/// The three search stages, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchStage {
    ProfileSearch,
    SmallReferenceSearch,
    FullReferenceSearch,
}

impl SearchStage {
    pub const ALL: [SearchStage; 3] = [
        SearchStage::ProfileSearch,
        SearchStage::SmallReferenceSearch,
        SearchStage::FullReferenceSearch,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::ProfileSearch => "profile_search",
            Self::SmallReferenceSearch => "small_reference_search",
            Self::FullReferenceSearch => "full_reference_search",
        }
    }

    /// Source tag attached to hits parsed from this stage's output
    pub fn hit_source(self) -> HitSource {
        match self {
            Self::ProfileSearch => HitSource::Profile,
            Self::SmallReferenceSearch => HitSource::SmallRef,
            Self::FullReferenceSearch => HitSource::FullRef,
        }
    }

    pub fn job_stage(self) -> JobStage {
        match self {
            Self::ProfileSearch => JobStage::ProfileSearch,
            Self::SmallReferenceSearch => JobStage::SmallReferenceSearch,
            Self::FullReferenceSearch => JobStage::FullReferenceSearch,
        }
    }
}

impl fmt::Display for SearchStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Coarse job stage reported to the job queue
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStage {
    Validating,
    ProfileSearch,
    SmallReferenceSearch,
    FullReferenceSearch,
    Merge,
    PathwayScoring,
    Complete,
}

impl JobStage {
    pub fn name(self) -> &'static str {
        match self {
            Self::Validating => "validating",
            Self::ProfileSearch => "profile_search",
            Self::SmallReferenceSearch => "small_reference_search",
            Self::FullReferenceSearch => "full_reference_search",
            Self::Merge => "merge",
            Self::PathwayScoring => "pathway_scoring",
            Self::Complete => "complete",
        }
    }

    /// Fixed progress checkpoint reached when this stage finishes
    pub fn checkpoint_percent(self) -> u8 {
        match self {
            Self::Validating => 0,
            Self::ProfileSearch => 25,
            Self::SmallReferenceSearch => 40,
            Self::FullReferenceSearch => 60,
            Self::Merge => 75,
            Self::PathwayScoring => 90,
            Self::Complete => 100,
        }
    }
}

impl fmt::Display for JobStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Job state as seen by the external queue
///
/// The orchestrator writes `progress_percent` and `skip_flags`; persistence
/// belongs to the queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobState {
    pub stage: JobStage,
    pub progress_percent: u8,
    pub skip_flags: BTreeSet<SearchStage>,
}

impl Default for JobState {
    fn default() -> Self {
        Self {
            stage: JobStage::Validating,
            progress_percent: 0,
            skip_flags: BTreeSet::new(),
        }
    }
}

// ============================================================================
// Error Types
// ============================================================================

/// One search stage's tool invocation failed (recovered: stage yields no hits)
#[derive(Debug, Error)]
pub enum StageInvocationError {
    #[error("Reference dataset unavailable: {0}")]
    MissingReference(String),

    #[error("Failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with status {code:?}: {stderr}")]
    NonZeroExit {
        program: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("{program} timed out after {after:?}")]
    Timeout { program: String, after: Duration },

    #[error("Unreadable tool output: {0}")]
    UnreadableOutput(String),
}

/// Why a single line of tool output was rejected (recovered: line skipped)
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LineParseError {
    #[error("expected {expected} columns, found {found}")]
    ColumnCount { expected: &'static str, found: usize },

    #[error("column {column} is not numeric: {value:?}")]
    ColumnType { column: usize, value: String },

    #[error("placeholder protein id {0:?}")]
    PlaceholderId(String),
}

/// Job-level annotation errors
#[derive(Debug, Error)]
pub enum AnnotationError {
    #[error("No valid sequences in batch: {0}")]
    EmptyBatch(String),

    #[error("All search stages failed: {0}")]
    AllSearchStagesFailed(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Pathway catalog error: {0}")]
    Catalog(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Job exceeded wall-clock ceiling of {0:?}")]
    Watchdog(Duration),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

pub type AnnotationResult<T> = Result<T, AnnotationError>;

/// User-visible failure record: short reason plus the stage where it happened
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[error("{stage} failed: {reason}")]
pub struct JobFailure {
    pub stage: JobStage,
    pub reason: String,
}

impl JobFailure {
    pub fn new(stage: JobStage, error: &AnnotationError) -> Self {
        Self {
            stage,
            reason: error.to_string(),
        }
    }
}
