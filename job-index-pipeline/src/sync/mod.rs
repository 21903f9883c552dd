//! Write-through synchronization between the relational store and the index.
//!
//! Every single-job mutation is mirrored into the search index before the
//! caller gets control back. The relational write always happens first and
//! is never rolled back when the index write fails.

use std::sync::Arc;
use tracing::{error, info, instrument};

use crate::errors::PipelineError;
use job_index_repository::JobIndexClient;
use job_index_shared::{JobDocument, JobWithSkills};
use job_index_store::JobStore;

/// Keeps the search index consistent with single-job mutations.
pub struct WriteThroughSync {
    store: Arc<dyn JobStore>,
    index: Arc<JobIndexClient>,
}

impl WriteThroughSync {
    pub fn new(store: Arc<dyn JobStore>, index: Arc<JobIndexClient>) -> Self {
        Self { store, index }
    }

    /// Index a freshly created job.
    #[instrument(skip(self, record), fields(id = record.job.id))]
    pub async fn sync_on_create(&self, record: &JobWithSkills) -> Result<(), PipelineError> {
        self.upsert(record).await
    }

    /// Replace the document of an updated job, skills included.
    #[instrument(skip(self, record), fields(id = record.job.id))]
    pub async fn sync_on_update(&self, record: &JobWithSkills) -> Result<(), PipelineError> {
        self.upsert(record).await
    }

    /// Delete a job from the store, then its document from the index.
    ///
    /// Returns whether a relational row was removed. The index delete runs
    /// either way, so a stray document left by an earlier failure is cleaned up.
    #[instrument(skip(self))]
    pub async fn sync_on_delete(&self, id: i64) -> Result<bool, PipelineError> {
        let deleted = self.store.delete_job(id).await?;

        self.index.delete(id).await.map_err(|e| {
            error!(error = %e, "Job deleted from store but not from index");
            PipelineError::index_write(e.to_string())
        })?;

        info!(deleted = deleted, "Delete synchronized");
        Ok(deleted)
    }

    async fn upsert(&self, record: &JobWithSkills) -> Result<(), PipelineError> {
        let document = JobDocument::from(record);

        self.index.put(&document).await.map_err(|e| {
            error!(error = %e, "Job committed to store but not indexed");
            PipelineError::index_write(e.to_string())
        })
    }
}
