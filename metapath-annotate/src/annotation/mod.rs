// Annotation Orchestration and Scoring Engine
//
// Tiered architecture:
// - Each tier consists of independent "concepts" (modules with a single purpose)
// - Explicit "synchronizations" (data contracts in `types`) between tiers
// - Each module maintains its own invariants

//! # Annotation Pipeline
//!
//! ## Tier 1: Batch Validation and Hit Parsers
//! - `sequence_batch` - FASTA validation, query subset writing
//! - `profile_parser` - Profile search text report
//! - `small_ref_parser` - Reduced reference alignment table
//! - `full_ref_parser` - Full reference output (annotation or alignment rows)
//!
//! ## Tier 2: Cross-Source Merge
//! - `annotation_merger` - One annotation per protein, fixed source priority
//!
//! ## Tier 3: Pathway Scoring
//! - `pathway_catalog` - Static pathway definitions (CSV)
//! - `pathway_scorer` - Coverage, weighted score, health category
//!
//! ## Job Workflow
//! - `search_orchestrator` - Which search stages run, over which proteins
//! - `collaborator` - External search tool abstraction
//! - `progress_reporter` - Fixed stage checkpoints on the event bus
//! - `job_runner` - End-to-end job, run slot, wall-clock ceiling
//! - `output_tables` - Enzyme and pathway tables, annotated FASTA

pub mod tier1;
pub mod tier2;
pub mod tier3;
pub mod collaborator;
pub mod job_runner;
pub mod output_tables;
pub mod progress_reporter;
pub mod search_orchestrator;

// Shared types and data contracts between tiers
pub mod types;
