//! Test Helper Utilities
//!
//! Shared utilities for testing metapath-annotate

#![allow(dead_code)]

pub mod fixtures;
pub mod log_capture;
pub mod mock_collaborator;

// Re-export commonly used items
pub use fixtures::{batch_fasta, gaba_catalog, test_config, test_context, ProfileReport};
pub use log_capture::LogCapture;
pub use mock_collaborator::MockCollaborator;
