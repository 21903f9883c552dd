//! Batch commit engine.
//!
//! Writes linked entities to the relational store in three ordered phases
//! (skills, jobs, edges), each chunked to the configured batch size.

mod committer;
mod resolve;

use std::fmt;

pub use committer::{BatchCommitter, CommitReport, EdgeCounts, IdMaps};
pub use resolve::{commit_then_resolve, CommitResolve, CommitStop, JobCommit, PhaseCounts, Resolved, SkillCommit};

use crate::errors::PipelineError;

/// Default number of records per store round-trip.
pub const DEFAULT_BATCH_SIZE: usize = 500;

/// The commit phases, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitPhase {
    Skills,
    Jobs,
    Edges,
}

impl CommitPhase {
    /// Number of phases that finish before this one starts.
    pub fn completed_before(self) -> usize {
        match self {
            CommitPhase::Skills => 0,
            CommitPhase::Jobs => 1,
            CommitPhase::Edges => 2,
        }
    }
}

impl fmt::Display for CommitPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommitPhase::Skills => f.write_str("skills"),
            CommitPhase::Jobs => f.write_str("jobs"),
            CommitPhase::Edges => f.write_str("edges"),
        }
    }
}

/// Configuration for the commit engine.
#[derive(Debug, Clone)]
pub struct CommitConfig {
    /// Records per insert statement. Must be greater than zero.
    pub batch_size: usize,
}

impl Default for CommitConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

impl CommitConfig {
    pub fn with_batch_size(batch_size: usize) -> Self {
        Self { batch_size }
    }

    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.batch_size == 0 {
            return Err(PipelineError::config("Batch size must be greater than zero"));
        }
        Ok(())
    }
}
