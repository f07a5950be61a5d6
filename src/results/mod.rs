//! Results storage module
//!
//! Provides persistent storage for run summaries.

mod storage;

pub use storage::{ResultsStorage, StoredAggregate, StoredRun};
