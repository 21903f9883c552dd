//! Loader module for the job index pipeline.
//!
//! Rebuilds the search index from the relational store: jobs are paged out
//! with their skills, turned into documents, and bulk-indexed one chunk per
//! request.

mod retry;

use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

pub use retry::{with_retry, RetryPolicy};

use crate::commit::DEFAULT_BATCH_SIZE;
use crate::errors::PipelineError;
use job_index_repository::JobIndexClient;
use job_index_shared::JobDocument;
use job_index_store::JobStore;

/// Configuration for the index loader.
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    /// Jobs read from the store and sent per bulk request.
    pub batch_size: usize,
    pub retry: RetryPolicy,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            retry: RetryPolicy::default(),
        }
    }
}

impl LoaderConfig {
    pub fn with_batch_size(batch_size: usize) -> Self {
        Self {
            batch_size,
            ..Self::default()
        }
    }
}

/// Outcome of an index rebuild.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Whether the index had to be created first.
    pub index_created: bool,
    pub documents_indexed: usize,
    pub chunks_sent: usize,
}

/// Loader that bulk-indexes every job in the relational store.
///
/// Documents are upserts keyed by job id, so a rebuild over an existing
/// index replaces stale documents rather than duplicating them.
pub struct IndexLoader {
    store: Arc<dyn JobStore>,
    index: Arc<JobIndexClient>,
    config: LoaderConfig,
    cancel: CancellationToken,
}

impl IndexLoader {
    /// Create a new index loader with default configuration.
    pub fn new(store: Arc<dyn JobStore>, index: Arc<JobIndexClient>) -> Self {
        Self::with_config(store, index, LoaderConfig::default())
    }

    /// Create a new index loader with custom configuration.
    pub fn with_config(
        store: Arc<dyn JobStore>,
        index: Arc<JobIndexClient>,
        config: LoaderConfig,
    ) -> Self {
        Self {
            store,
            index,
            config,
            cancel: CancellationToken::new(),
        }
    }

    /// Stop before the next chunk once `cancel` fires. A chunk already in
    /// flight is always finished.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Jobs per chunk: the configured batch size, capped at the largest bulk
    /// request the index client accepts.
    pub fn chunk_size(&self) -> usize {
        match self.index.max_batch_size() {
            Some(max) => self.config.batch_size.min(max),
            None => self.config.batch_size,
        }
    }

    /// Ensure the index exists, then index every job chunk by chunk.
    ///
    /// Stops at the first chunk that cannot be indexed; chunks sent before
    /// it remain in the index and are counted in the returned
    /// [`PipelineError::RebuildFailed`].
    #[instrument(skip(self), fields(batch_size = self.config.batch_size))]
    pub async fn rebuild(&self) -> Result<LoadReport, PipelineError> {
        let chunk_size = self.chunk_size();
        if chunk_size == 0 {
            return Err(PipelineError::config("Batch size must be greater than zero"));
        }
        if chunk_size < self.config.batch_size {
            info!(
                batch_size = self.config.batch_size,
                chunk_size, "Capping chunks at the index client's bulk limit"
            );
        }

        let mut report = LoadReport {
            index_created: self.ensure_index().await?,
            ..LoadReport::default()
        };

        match self.index_all(chunk_size, &mut report).await {
            Ok(()) => {}
            Err(e @ PipelineError::Interrupted { .. }) => return Err(e),
            Err(e) => {
                error!(
                    chunks_sent = report.chunks_sent,
                    documents_indexed = report.documents_indexed,
                    "Index rebuild stopped"
                );
                return Err(PipelineError::rebuild_failed(
                    report.chunks_sent,
                    report.documents_indexed,
                    e,
                ));
            }
        }

        info!(
            documents = report.documents_indexed,
            chunks = report.chunks_sent,
            "Index rebuild complete"
        );
        Ok(report)
    }

    /// Page jobs out by id and send each page as one chunk, recording
    /// progress in `report` as chunks land.
    async fn index_all(&self, chunk_size: usize, report: &mut LoadReport) -> Result<(), PipelineError> {
        let mut after_id = 0;
        loop {
            if self.cancel.is_cancelled() {
                warn!(chunks_sent = report.chunks_sent, "Cancelled between chunks");
                return Err(PipelineError::interrupted("index rebuild", report.chunks_sent));
            }

            let page = self.store.find_jobs_with_skills(after_id, chunk_size).await?;

            let last_id = match page.last() {
                Some(record) => record.job.id,
                None => return Ok(()),
            };

            let documents: Vec<JobDocument> = page.iter().map(JobDocument::from).collect();
            self.flush(&documents).await?;

            report.documents_indexed += documents.len();
            report.chunks_sent += 1;
            after_id = last_id;

            debug!(
                chunk = report.chunks_sent,
                indexed = report.documents_indexed,
                "Indexed chunk"
            );
        }
    }

    /// Send one chunk as a single bulk request.
    async fn flush(&self, documents: &[JobDocument]) -> Result<(), PipelineError> {
        let index = self.index.as_ref();
        let summary = with_retry(&self.config.retry, "bulk index", move || {
            index.bulk_put(documents)
        })
        .await
        .map_err(|e| {
            error!(error = %e, count = documents.len(), "Failed to index chunk");
            PipelineError::index_write(e.to_string())
        })?;

        if summary.failed > 0 {
            let failed = summary.failed_ids();
            error!(failed = summary.failed, ids = ?failed, "Bulk request had item failures");
            return Err(PipelineError::index_write(format!(
                "Failed to index {} of {} documents (ids: {})",
                summary.failed,
                summary.total,
                failed.join(", ")
            )));
        }

        Ok(())
    }

    /// Create the index if it is missing.
    pub async fn ensure_index(&self) -> Result<bool, PipelineError> {
        let index = self.index.as_ref();
        with_retry(&self.config.retry, "ensure index", move || index.ensure_index())
            .await
            .map_err(PipelineError::Search)
    }

    /// Check if the search engine is healthy.
    pub async fn health_check(&self) -> Result<bool, PipelineError> {
        Ok(self.index.health_check().await?)
    }
}
