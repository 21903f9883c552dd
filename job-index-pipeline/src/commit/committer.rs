//! Three-phase batch committer.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use super::resolve::{commit_then_resolve, CommitStop, JobCommit, PhaseCounts, SkillCommit};
use super::{CommitConfig, CommitPhase};
use crate::errors::PipelineError;
use crate::linker::{CandidateEdge, LinkedEntities};
use job_index_shared::{JobKey, JobSkillEdge};
use job_index_store::JobStore;

/// Natural key to surrogate id maps produced by the first two phases.
#[derive(Debug, Clone, Default)]
pub struct IdMaps {
    pub skills: HashMap<String, i64>,
    pub jobs: HashMap<JobKey, i64>,
}

impl IdMaps {
    /// Resolve a candidate edge, or `None` if either endpoint is unknown.
    pub fn resolve_edge(&self, edge: &CandidateEdge) -> Option<JobSkillEdge> {
        Some(JobSkillEdge {
            job_id: *self.jobs.get(&edge.job)?,
            skill_id: *self.skills.get(&edge.skill)?,
        })
    }

    /// Resolve candidate edges, deduplicated in first-seen order.
    ///
    /// Returns the resolved edges and the number of candidates dropped.
    pub fn resolve_edges(&self, candidates: &[CandidateEdge]) -> (Vec<JobSkillEdge>, usize) {
        let mut seen = HashSet::new();
        let mut edges = Vec::new();
        let mut dropped = 0;

        for candidate in candidates {
            match self.resolve_edge(candidate) {
                Some(edge) => {
                    if seen.insert(edge) {
                        edges.push(edge);
                    }
                }
                None => {
                    debug!(
                        title = %candidate.job.title,
                        company = %candidate.job.company,
                        skill = %candidate.skill,
                        "Dropping unresolved edge"
                    );
                    dropped += 1;
                }
            }
        }

        (edges, dropped)
    }
}

/// Counts for the edge phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EdgeCounts {
    /// Candidate edges from the linker, duplicates included.
    pub candidates: usize,
    /// Candidates whose job or skill did not resolve.
    pub dropped: usize,
    /// Distinct resolved edges handed to the store.
    pub submitted: usize,
    pub inserted: u64,
}

/// Per-phase results of a commit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommitReport {
    pub skills: PhaseCounts,
    pub jobs: PhaseCounts,
    pub edges: EdgeCounts,
}

fn phase_error(phase: CommitPhase, stop: CommitStop) -> PipelineError {
    match stop {
        CommitStop::Failed(e) => PipelineError::store_write(phase, e),
        CommitStop::Cancelled { batches_committed } => {
            PipelineError::interrupted(format!("{} phase", phase), batches_committed)
        }
    }
}

/// Writes linked entities to the relational store.
///
/// Phases run strictly in order: skills, jobs, edges. A failure stops the
/// remaining phases without undoing the completed ones, and re-running over
/// the same input is safe because every insert skips existing rows.
/// Cancellation is honoured between batches only.
pub struct BatchCommitter {
    store: Arc<dyn JobStore>,
    config: CommitConfig,
    cancel: CancellationToken,
}

impl BatchCommitter {
    pub fn new(store: Arc<dyn JobStore>) -> Self {
        Self::with_config(store, CommitConfig::default())
    }

    pub fn with_config(store: Arc<dyn JobStore>, config: CommitConfig) -> Self {
        Self {
            store,
            config,
            cancel: CancellationToken::new(),
        }
    }

    /// Stop at the next batch boundary once `cancel` fires.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    #[instrument(
        skip(self, linked),
        fields(skills = linked.skills.len(), jobs = linked.jobs.len(), edges = linked.edges.len())
    )]
    pub async fn commit(&self, linked: &LinkedEntities) -> Result<CommitReport, PipelineError> {
        self.config.validate()?;
        let batch_size = self.config.batch_size;
        let store = self.store.as_ref();

        let skills = commit_then_resolve(
            &SkillCommit::new(store),
            &linked.skills,
            batch_size,
            &self.cancel,
        )
        .await
        .map_err(|stop| phase_error(CommitPhase::Skills, stop))?;
        info!(
            phase = %CommitPhase::Skills,
            inserted = skills.counts.inserted,
            resolved = skills.counts.resolved,
            "Phase complete"
        );

        let jobs = commit_then_resolve(&JobCommit::new(store), &linked.jobs, batch_size, &self.cancel)
            .await
            .map_err(|stop| phase_error(CommitPhase::Jobs, stop))?;
        info!(
            phase = %CommitPhase::Jobs,
            inserted = jobs.counts.inserted,
            resolved = jobs.counts.resolved,
            "Phase complete"
        );

        let maps = IdMaps {
            skills: skills.ids,
            jobs: jobs.ids,
        };
        let (edges, dropped) = maps.resolve_edges(&linked.edges);

        let mut inserted = 0;
        for (index, batch) in edges.chunks(batch_size).enumerate() {
            if self.cancel.is_cancelled() {
                warn!(phase = %CommitPhase::Edges, batches_committed = index, "Cancelled between batches");
                return Err(phase_error(
                    CommitPhase::Edges,
                    CommitStop::Cancelled {
                        batches_committed: index,
                    },
                ));
            }
            inserted += store
                .insert_job_skills(batch)
                .await
                .map_err(|e| PipelineError::store_write(CommitPhase::Edges, e))?;
        }
        info!(
            phase = %CommitPhase::Edges,
            inserted = inserted,
            dropped = dropped,
            "Phase complete"
        );

        Ok(CommitReport {
            skills: skills.counts,
            jobs: jobs.counts,
            edges: EdgeCounts {
                candidates: linked.edges.len(),
                dropped,
                submitted: edges.len(),
                inserted,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linker::link;
    use crate::reader::NormalizedRow;
    use async_trait::async_trait;
    use job_index_shared::{Industry, Job, JobWithSkills, NewJob, Skill};
    use job_index_store::{JobUpdate, SqliteJobStore, StoreCounts, StoreError};

    fn row(title: &str, company: &str, location: &str, skills: &str) -> NormalizedRow {
        NormalizedRow {
            row: 1,
            job: NewJob {
                title: title.to_string(),
                company: company.to_string(),
                location: location.to_string(),
                experience_level: "Mid".to_string(),
                salary: 100,
                industry: Industry::Retail,
            },
            required_skills: skills.to_string(),
        }
    }

    fn sample() -> LinkedEntities {
        link(vec![
            row("Engineer", "Acme", "Berlin", "Go,SQL"),
            row("Engineer", "Acme", "Berlin", "Go,SQL"),
            row("Cashier", "Shop", "Rome", "Sales, SQL"),
        ])
    }

    #[tokio::test]
    async fn test_commit_resolves_edges() {
        let store = Arc::new(SqliteJobStore::in_memory().await.unwrap());
        let committer = BatchCommitter::with_config(store.clone(), CommitConfig::with_batch_size(2));

        let report = committer.commit(&sample()).await.unwrap();

        assert_eq!(report.skills.inserted, 3);
        assert_eq!(report.jobs.inserted, 2);
        assert_eq!(report.edges.candidates, 6);
        assert_eq!(report.edges.dropped, 0);
        assert_eq!(report.edges.submitted, 4);
        assert_eq!(report.edges.inserted, 4);

        let engineer = store.find_jobs_with_skills(0, 10).await.unwrap();
        assert_eq!(engineer[0].skill_names(), vec!["Go", "SQL"]);
    }

    #[tokio::test]
    async fn test_commit_is_idempotent() {
        let store = Arc::new(SqliteJobStore::in_memory().await.unwrap());
        let committer = BatchCommitter::new(store.clone());

        committer.commit(&sample()).await.unwrap();
        let first = store.counts().await.unwrap();
        let report = committer.commit(&sample()).await.unwrap();
        let second = store.counts().await.unwrap();

        assert_eq!(first, second);
        assert_eq!(report.skills.inserted, 0);
        assert_eq!(report.jobs.inserted, 0);
        assert_eq!(report.edges.inserted, 0);
        assert_eq!(report.jobs.resolved, 2);
    }

    #[tokio::test]
    async fn test_seeded_rows_not_overwritten() {
        let store = Arc::new(SqliteJobStore::in_memory().await.unwrap());
        let committer = BatchCommitter::new(store.clone());
        committer.commit(&link(vec![row("Engineer", "Acme", "Berlin", "Go")])).await.unwrap();

        committer.commit(&link(vec![row("Engineer", "Acme", "Paris", "Rust")])).await.unwrap();

        let jobs = store.find_jobs_with_skills(0, 10).await.unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].job.location, "Berlin");
        assert_eq!(jobs[0].skill_names(), vec!["Go", "Rust"]);
    }

    #[tokio::test]
    async fn test_cancelled_before_commit_writes_nothing() {
        let store = Arc::new(SqliteJobStore::in_memory().await.unwrap());
        let cancel = CancellationToken::new();
        cancel.cancel();
        let committer = BatchCommitter::new(store.clone()).with_cancellation(cancel);

        let result = committer.commit(&sample()).await;

        match result {
            Err(PipelineError::Interrupted { stage, batches_completed }) => {
                assert_eq!(stage, "skills phase");
                assert_eq!(batches_completed, 0);
            }
            other => panic!("unexpected result: {:?}", other),
        }
        assert_eq!(store.counts().await.unwrap(), StoreCounts::default());
    }

    #[tokio::test]
    async fn test_zero_batch_size_rejected() {
        let store = Arc::new(SqliteJobStore::in_memory().await.unwrap());
        let committer = BatchCommitter::with_config(store, CommitConfig::with_batch_size(0));

        let result = committer.commit(&sample()).await;

        assert!(matches!(result, Err(PipelineError::Config(_))));
    }

    #[test]
    fn test_unresolved_edges_dropped() {
        let mut maps = IdMaps::default();
        maps.skills.insert("Go".to_string(), 1);
        maps.jobs.insert(JobKey::new("Engineer", "Acme"), 10);

        let candidates = vec![
            CandidateEdge { job: JobKey::new("Engineer", "Acme"), skill: "Go".to_string() },
            CandidateEdge { job: JobKey::new("Engineer", "Acme"), skill: "Go".to_string() },
            CandidateEdge { job: JobKey::new("Engineer", "Acme"), skill: "SQL".to_string() },
            CandidateEdge { job: JobKey::new("Engineer", "Globex"), skill: "Go".to_string() },
        ];
        let (edges, dropped) = maps.resolve_edges(&candidates);

        assert_eq!(edges, vec![JobSkillEdge { job_id: 10, skill_id: 1 }]);
        assert_eq!(dropped, 2);
    }

    /// Store that can fail or cancel on job inserts; everything else is delegated.
    struct JobsHookStore {
        inner: SqliteJobStore,
        fail_jobs: bool,
        cancel_after_jobs: Option<CancellationToken>,
    }

    impl JobsHookStore {
        async fn new() -> Self {
            Self {
                inner: SqliteJobStore::in_memory().await.unwrap(),
                fail_jobs: false,
                cancel_after_jobs: None,
            }
        }
    }

    #[async_trait]
    impl JobStore for JobsHookStore {
        async fn insert_skills(&self, names: &[String]) -> Result<u64, StoreError> {
            self.inner.insert_skills(names).await
        }

        async fn find_skills(&self) -> Result<Vec<Skill>, StoreError> {
            self.inner.find_skills().await
        }

        async fn insert_jobs(&self, jobs: &[NewJob]) -> Result<u64, StoreError> {
            if self.fail_jobs {
                return Err(StoreError::invalid_input("Mock failure"));
            }
            let inserted = self.inner.insert_jobs(jobs).await?;
            if let Some(cancel) = &self.cancel_after_jobs {
                cancel.cancel();
            }
            Ok(inserted)
        }

        async fn find_jobs(&self) -> Result<Vec<Job>, StoreError> {
            self.inner.find_jobs().await
        }

        async fn insert_job_skills(&self, edges: &[JobSkillEdge]) -> Result<u64, StoreError> {
            self.inner.insert_job_skills(edges).await
        }

        async fn find_jobs_with_skills(
            &self,
            after_id: i64,
            limit: usize,
        ) -> Result<Vec<JobWithSkills>, StoreError> {
            self.inner.find_jobs_with_skills(after_id, limit).await
        }

        async fn find_job(&self, id: i64) -> Result<Option<JobWithSkills>, StoreError> {
            self.inner.find_job(id).await
        }

        async fn create_job(&self, job: &NewJob, skill_ids: &[i64]) -> Result<JobWithSkills, StoreError> {
            self.inner.create_job(job, skill_ids).await
        }

        async fn update_job(&self, update: &JobUpdate) -> Result<JobWithSkills, StoreError> {
            self.inner.update_job(update).await
        }

        async fn delete_job(&self, id: i64) -> Result<bool, StoreError> {
            self.inner.delete_job(id).await
        }

        async fn counts(&self) -> Result<StoreCounts, StoreError> {
            self.inner.counts().await
        }
    }

    #[tokio::test]
    async fn test_failure_reports_phase_and_keeps_earlier_phases() {
        let store = Arc::new(JobsHookStore {
            fail_jobs: true,
            ..JobsHookStore::new().await
        });
        let committer = BatchCommitter::new(store.clone());

        let result = committer.commit(&sample()).await;

        assert!(matches!(
            result,
            Err(PipelineError::StoreWrite { phase: CommitPhase::Jobs, phases_completed: 1, .. })
        ));
        let counts = store.counts().await.unwrap();
        assert_eq!(counts.skills, 3);
        assert_eq!(counts.job_skills, 0);
    }

    #[tokio::test]
    async fn test_cancel_during_jobs_stops_before_edges() {
        let cancel = CancellationToken::new();
        let store = Arc::new(JobsHookStore {
            cancel_after_jobs: Some(cancel.clone()),
            ..JobsHookStore::new().await
        });
        let committer = BatchCommitter::new(store.clone()).with_cancellation(cancel);

        let result = committer.commit(&sample()).await;

        match result {
            Err(PipelineError::Interrupted { stage, batches_completed }) => {
                assert_eq!(stage, "edges phase");
                assert_eq!(batches_completed, 0);
            }
            other => panic!("unexpected result: {:?}", other),
        }
        let counts = store.counts().await.unwrap();
        assert_eq!(counts.skills, 3);
        assert_eq!(counts.jobs, 2);
        assert_eq!(counts.job_skills, 0);
    }
}
