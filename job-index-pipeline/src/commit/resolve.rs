//! The commit-then-resolve routine.
//!
//! The store's bulk insert path skips existing rows and does not return
//! generated ids, so ids are learned by re-reading after every batch has
//! been written.

use std::collections::HashMap;
use std::hash::Hash;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use job_index_shared::{JobKey, NewJob};
use job_index_store::{JobStore, StoreError};

/// A record type that can be bulk-inserted and then resolved to ids by its
/// natural key.
#[async_trait]
pub trait CommitResolve: Send + Sync {
    type Record: Send + Sync;
    type Key: Eq + Hash + Send;

    /// Insert one batch with skip-if-exists semantics.
    ///
    /// Returns the number of rows actually inserted.
    async fn insert_batch(&self, batch: &[Self::Record]) -> Result<u64, StoreError>;

    /// Read back every committed row as a natural key to id map.
    async fn resolve(&self) -> Result<HashMap<Self::Key, i64>, StoreError>;
}

/// Counts for one commit phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PhaseCounts {
    /// Records handed to the store.
    pub submitted: usize,
    /// Rows the store actually inserted.
    pub inserted: u64,
    /// Entries in the resolved id map.
    pub resolved: usize,
}

/// Outcome of [`commit_then_resolve`].
#[derive(Debug, Clone)]
pub struct Resolved<K> {
    pub ids: HashMap<K, i64>,
    pub counts: PhaseCounts,
}

/// Why [`commit_then_resolve`] stopped before resolving.
#[derive(Debug)]
pub enum CommitStop {
    /// A batch failed in the store.
    Failed(StoreError),
    /// Cancellation was observed between batches.
    Cancelled { batches_committed: usize },
}

impl From<StoreError> for CommitStop {
    fn from(err: StoreError) -> Self {
        Self::Failed(err)
    }
}

/// Insert `records` in batches of `batch_size`, then resolve all ids.
///
/// A failed batch stops the routine; earlier batches stay committed.
/// `cancel` is checked before each batch, never during one.
pub async fn commit_then_resolve<C>(
    committer: &C,
    records: &[C::Record],
    batch_size: usize,
    cancel: &CancellationToken,
) -> Result<Resolved<C::Key>, CommitStop>
where
    C: CommitResolve + ?Sized,
{
    let mut inserted = 0;

    for (index, batch) in records.chunks(batch_size.max(1)).enumerate() {
        if cancel.is_cancelled() {
            warn!(batches_committed = index, "Cancelled between batches");
            return Err(CommitStop::Cancelled {
                batches_committed: index,
            });
        }
        inserted += committer.insert_batch(batch).await?;
        debug!(batch = index, size = batch.len(), "Committed batch");
    }

    let ids = committer.resolve().await?;

    Ok(Resolved {
        counts: PhaseCounts {
            submitted: records.len(),
            inserted,
            resolved: ids.len(),
        },
        ids,
    })
}

/// Skills keyed by name.
pub struct SkillCommit<'a> {
    store: &'a dyn JobStore,
}

impl<'a> SkillCommit<'a> {
    pub fn new(store: &'a dyn JobStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl<'a> CommitResolve for SkillCommit<'a> {
    type Record = String;
    type Key = String;

    async fn insert_batch(&self, batch: &[String]) -> Result<u64, StoreError> {
        self.store.insert_skills(batch).await
    }

    async fn resolve(&self) -> Result<HashMap<String, i64>, StoreError> {
        let skills = self.store.find_skills().await?;
        Ok(skills.into_iter().map(|s| (s.name, s.id)).collect())
    }
}

/// Jobs keyed by `(title, company)`.
pub struct JobCommit<'a> {
    store: &'a dyn JobStore,
}

impl<'a> JobCommit<'a> {
    pub fn new(store: &'a dyn JobStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl<'a> CommitResolve for JobCommit<'a> {
    type Record = NewJob;
    type Key = JobKey;

    async fn insert_batch(&self, batch: &[NewJob]) -> Result<u64, StoreError> {
        self.store.insert_jobs(batch).await
    }

    async fn resolve(&self) -> Result<HashMap<JobKey, i64>, StoreError> {
        let jobs = self.store.find_jobs().await?;
        Ok(jobs.into_iter().map(|j| (j.key(), j.id)).collect())
    }
}
