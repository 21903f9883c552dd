//! CRUD façade over the relational store and the search index.
//!
//! Writes go to the store first and are then mirrored through
//! [`WriteThroughSync`]; reads of a single job come from the store and
//! listings come from the index.

use std::sync::Arc;
use tracing::{info, instrument};

use crate::errors::PipelineError;
use crate::sync::WriteThroughSync;
use job_index_repository::JobIndexClient;
use job_index_shared::{JobPage, JobSearchRequest, JobWithSkills, NewJob};
use job_index_store::{JobStore, JobUpdate};

/// Entry point for single-job operations.
pub struct JobService {
    store: Arc<dyn JobStore>,
    index: Arc<JobIndexClient>,
    sync: WriteThroughSync,
}

impl JobService {
    pub fn new(store: Arc<dyn JobStore>, index: Arc<JobIndexClient>) -> Self {
        let sync = WriteThroughSync::new(store.clone(), index.clone());
        Self { store, index, sync }
    }

    /// Create a job linked to existing skills and index it.
    #[instrument(skip(self, job, skill_ids), fields(title = %job.title, company = %job.company))]
    pub async fn create_job(
        &self,
        job: NewJob,
        skill_ids: &[i64],
    ) -> Result<JobWithSkills, PipelineError> {
        let record = self.store.create_job(&job, skill_ids).await?;
        self.sync.sync_on_create(&record).await?;

        info!(id = record.job.id, "Job created");
        Ok(record)
    }

    /// Apply a partial update and re-index the job.
    #[instrument(skip(self, update), fields(id = update.id))]
    pub async fn update_job(&self, update: JobUpdate) -> Result<JobWithSkills, PipelineError> {
        let record = self.store.update_job(&update).await?;
        self.sync.sync_on_update(&record).await?;
        Ok(record)
    }

    /// Delete a job and its document. Returns whether the job existed.
    pub async fn delete_job(&self, id: i64) -> Result<bool, PipelineError> {
        self.sync.sync_on_delete(id).await
    }

    pub async fn get_job(&self, id: i64) -> Result<Option<JobWithSkills>, PipelineError> {
        Ok(self.store.find_job(id).await?)
    }

    /// Search the index. Never fails; engine errors yield an empty page.
    pub async fn list_jobs(&self, request: &JobSearchRequest) -> JobPage {
        self.index.search(request).await
    }
}
