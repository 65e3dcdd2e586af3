//! # metapath-annotate
//!
//! Protein functional annotation and pathway scoring:
//! - Tiered search orchestration over profile, small reference and full reference searches
//! - Cross-source annotation merge with fixed source priority
//! - Pathway coverage scoring against a static catalog
//! - Coarse job progress reporting

pub mod annotation;
pub mod config;

pub use annotation::collaborator::{CommandCollaborator, RawOutput, SearchCollaborator, StageRequest};
pub use annotation::job_runner::{
    run_annotation_job, AnnotationContext, JobOutput, JobRequest, JobScheduler, RunSlot,
};
pub use annotation::progress_reporter::ProgressReporter;
pub use annotation::types::{AnnotationError, AnnotationResult, JobFailure};
pub use config::AnnotateConfig;
