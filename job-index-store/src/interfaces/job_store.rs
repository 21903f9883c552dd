//! Relational store trait definition.
//!
//! This module defines the abstract interface the pipeline and the
//! write-through path use to read and write the relational model.

use async_trait::async_trait;

use crate::errors::StoreError;
use crate::types::{JobUpdate, StoreCounts};
use job_index_shared::{Job, JobSkillEdge, JobWithSkills, NewJob, Skill};

/// Abstract interface for the relational system of record.
///
/// Bulk inserts follow a skip-if-exists policy: rows colliding with an
/// existing unique key are ignored, and the bulk path does not return
/// generated ids. Callers re-read with the `find_*` methods to learn them.
///
/// # Thread Safety
///
/// All implementations must be `Send + Sync` to allow use across async tasks.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Insert skills by name, ignoring names that already exist.
    ///
    /// # Returns
    ///
    /// * `Ok(u64)` - The number of rows actually inserted
    async fn insert_skills(&self, names: &[String]) -> Result<u64, StoreError>;

    /// Read every committed skill.
    async fn find_skills(&self) -> Result<Vec<Skill>, StoreError>;

    /// Insert jobs, ignoring jobs whose `(title, company)` already exists.
    ///
    /// Existing rows are never overwritten.
    async fn insert_jobs(&self, jobs: &[NewJob]) -> Result<u64, StoreError>;

    /// Read every committed job.
    async fn find_jobs(&self) -> Result<Vec<Job>, StoreError>;

    /// Insert job-skill edges, ignoring edges that already exist.
    async fn insert_job_skills(&self, edges: &[JobSkillEdge]) -> Result<u64, StoreError>;

    /// Read up to `limit` jobs with an id greater than `after_id`, in id
    /// order, each with its current skills.
    ///
    /// Used for keyset pagination: pass the last id of the previous page.
    async fn find_jobs_with_skills(
        &self,
        after_id: i64,
        limit: usize,
    ) -> Result<Vec<JobWithSkills>, StoreError>;

    /// Read a single job with its skills.
    ///
    /// # Returns
    ///
    /// * `Ok(None)` - If no job has the id
    async fn find_job(&self, id: i64) -> Result<Option<JobWithSkills>, StoreError>;

    /// Create a job and link it to the given skills.
    ///
    /// # Returns
    ///
    /// * `Ok(JobWithSkills)` - The committed record, with its surrogate id
    /// * `Err(StoreError::Conflict)` - If `(title, company)` already exists
    /// * `Err(StoreError::InvalidInput)` - If a skill id does not exist
    async fn create_job(&self, job: &NewJob, skill_ids: &[i64]) -> Result<JobWithSkills, StoreError>;

    /// Apply a partial update and, when skill ids are given, replace the
    /// job's edge set.
    ///
    /// # Returns
    ///
    /// * `Ok(JobWithSkills)` - The record after the update
    /// * `Err(StoreError::NotFound)` - If no job has the id
    async fn update_job(&self, update: &JobUpdate) -> Result<JobWithSkills, StoreError>;

    /// Delete a job and its edges.
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - If a job row was removed
    /// * `Ok(false)` - If no job had the id
    async fn delete_job(&self, id: i64) -> Result<bool, StoreError>;

    /// Count the rows of each table.
    async fn counts(&self) -> Result<StoreCounts, StoreError>;
}
