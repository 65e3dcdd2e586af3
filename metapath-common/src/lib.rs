//! # metapath Common Library
//!
//! Shared code for the metapath annotation tools:
//! - Error types (`Error`, `Result`)
//! - Configuration file resolution and logging settings
//! - Job progress events and the broadcast event bus

pub mod config;
pub mod error;
pub mod events;

pub use error::{Error, Result};
pub use events::{EventBus, JobEvent};
