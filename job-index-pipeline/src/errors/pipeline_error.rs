//! Pipeline error types.

use thiserror::Error;

use crate::commit::CommitPhase;
use job_index_repository::SearchError;
use job_index_shared::ParseIndustryError;
use job_index_store::StoreError;

/// A CSV row that could not be normalized into a job.
///
/// Row numbers count data rows from 1, excluding the header.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RowParseError {
    /// A required column is absent or blank.
    #[error("Row {row}: missing required column {column:?}")]
    MissingField { row: u64, column: &'static str },

    /// The industry column does not name a known industry.
    #[error("Row {row}: {error}")]
    UnknownIndustry { row: u64, error: ParseIndustryError },

    /// The CSV record itself could not be read.
    #[error("Row {row}: unreadable record: {message}")]
    Malformed { row: u64, message: String },
}

impl RowParseError {
    /// Create a missing field error.
    pub fn missing_field(row: u64, column: &'static str) -> Self {
        Self::MissingField { row, column }
    }

    /// Create a malformed record error.
    pub fn malformed(row: u64, message: impl Into<String>) -> Self {
        Self::Malformed {
            row,
            message: message.into(),
        }
    }

    /// The data row the error refers to.
    pub fn row(&self) -> u64 {
        match self {
            Self::MissingField { row, .. }
            | Self::UnknownIndustry { row, .. }
            | Self::Malformed { row, .. } => *row,
        }
    }
}

/// Errors that can occur in the job index pipeline.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// A malformed row under the abort policy.
    #[error("Row parse error: {0}")]
    RowParse(#[from] RowParseError),

    /// The CSV source could not be opened or its header read.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A commit batch failed. Phases before `phase` stay committed.
    #[error("Store write failed in {phase} phase ({phases_completed} phases completed): {source}")]
    StoreWrite {
        phase: CommitPhase,
        phases_completed: usize,
        #[source]
        source: StoreError,
    },

    /// A search index write failed or reported item failures.
    #[error("Index write error: {0}")]
    IndexWrite(String),

    /// An index rebuild stopped part way. Chunks sent before the failure
    /// stay indexed.
    #[error("Index rebuild failed after {chunks_sent} chunks ({documents_indexed} documents indexed): {source}")]
    RebuildFailed {
        chunks_sent: usize,
        documents_indexed: usize,
        #[source]
        source: Box<PipelineError>,
    },

    /// Cancellation was requested. Work stops at a batch boundary, so every
    /// batch counted in `batches_completed` was fully written.
    #[error("Interrupted during {stage} after {batches_completed} batches")]
    Interrupted {
        stage: String,
        batches_completed: usize,
    },

    /// Error from the relational store outside of a commit phase.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Error from the search engine.
    #[error("Search error: {0}")]
    Search(#[from] SearchError),

    /// Invalid pipeline configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl PipelineError {
    /// Create an index write error.
    pub fn index_write(msg: impl Into<String>) -> Self {
        Self::IndexWrite(msg.into())
    }

    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an interruption error for a stage of the run.
    pub fn interrupted(stage: impl Into<String>, batches_completed: usize) -> Self {
        Self::Interrupted {
            stage: stage.into(),
            batches_completed,
        }
    }

    /// Wrap a failure from inside an index rebuild with its progress.
    pub fn rebuild_failed(chunks_sent: usize, documents_indexed: usize, source: PipelineError) -> Self {
        Self::RebuildFailed {
            chunks_sent,
            documents_indexed,
            source: Box::new(source),
        }
    }

    /// Create a store write error for a commit phase.
    pub fn store_write(phase: CommitPhase, source: StoreError) -> Self {
        Self::StoreWrite {
            phase,
            phases_completed: phase.completed_before(),
            source,
        }
    }
}
