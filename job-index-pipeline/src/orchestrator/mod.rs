//! Orchestrator module for the job index pipeline.
//!
//! Coordinates the reader, linker, commit engine and index loader for a
//! full ingestion run.

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};

use crate::commit::{BatchCommitter, CommitConfig, CommitReport};
use crate::errors::PipelineError;
use crate::linker::{EntityLinker, LinkedEntities};
use crate::loader::{IndexLoader, LoadReport, LoaderConfig};
use crate::reader::{ReaderConfig, RowReader};
use job_index_repository::JobIndexClient;
use job_index_store::{JobStore, StoreCounts};

/// Configuration for the orchestrator.
#[derive(Debug, Clone, Default)]
pub struct OrchestratorConfig {
    pub reader: ReaderConfig,
    pub commit: CommitConfig,
    pub loader: LoaderConfig,
}

impl OrchestratorConfig {
    /// Use the same batch size for store commits and index chunks.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.commit.batch_size = batch_size;
        self.loader.batch_size = batch_size;
        self
    }
}

/// Rows read from the source, already linked.
#[derive(Debug, Clone, Default)]
pub struct ReadOutcome {
    pub linked: LinkedEntities,
    /// Rows dropped under the skip policy.
    pub skipped: usize,
}

/// Summary of one ingestion run.
#[derive(Debug, Clone)]
pub struct IngestionReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Rows accepted by the reader.
    pub rows_read: usize,
    pub rows_skipped: usize,
    pub duplicate_rows: usize,
    pub commit: CommitReport,
    pub load: LoadReport,
    /// Table sizes after the run.
    pub counts: StoreCounts,
}

impl IngestionReport {
    pub fn elapsed(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}

/// Read and link a CSV file, applying the configured row policy.
///
/// Under the abort policy the first bad row ends the read, so nothing has
/// been written anywhere yet.
pub fn read_linked(path: &Path, config: &ReaderConfig) -> Result<ReadOutcome, PipelineError> {
    let mut linker = EntityLinker::new();
    let mut skipped = 0;

    for result in RowReader::from_path(path, config)? {
        match result {
            Ok(row) => linker.push(row),
            Err(e) => {
                config.policy.handle(e)?;
                skipped += 1;
            }
        }
    }

    Ok(ReadOutcome {
        linked: linker.finish(),
        skipped,
    })
}

/// Orchestrator that runs ingestion end to end.
///
/// The run is sequential: read and link, commit skills, jobs and edges,
/// then rebuild the index from the store.
pub struct Orchestrator {
    store: Arc<dyn JobStore>,
    committer: BatchCommitter,
    loader: IndexLoader,
    reader_config: ReaderConfig,
}

impl Orchestrator {
    /// Create a new orchestrator with default configuration.
    pub fn new(store: Arc<dyn JobStore>, index: Arc<JobIndexClient>) -> Self {
        Self::with_config(store, index, OrchestratorConfig::default())
    }

    /// Create a new orchestrator with custom configuration.
    pub fn with_config(
        store: Arc<dyn JobStore>,
        index: Arc<JobIndexClient>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            committer: BatchCommitter::with_config(store.clone(), config.commit),
            loader: IndexLoader::with_config(store.clone(), index, config.loader),
            reader_config: config.reader,
            store,
        }
    }

    /// Share `cancel` with the commit engine and the loader. Once it fires,
    /// the run stops at the next batch or chunk boundary with
    /// [`PipelineError::Interrupted`].
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.committer = self.committer.with_cancellation(cancel.clone());
        self.loader = self.loader.with_cancellation(cancel);
        self
    }

    /// Ingest a CSV file into the store and the index.
    #[instrument(skip(self, path), fields(path = %path.display()))]
    pub async fn ingest(&self, path: &Path) -> Result<IngestionReport, PipelineError> {
        let started_at = Utc::now();
        info!("Starting ingestion");

        let read = self.read(path).await?;
        info!(
            rows = read.linked.rows,
            skipped = read.skipped,
            skills = read.linked.skills.len(),
            jobs = read.linked.jobs.len(),
            "Source read"
        );

        let commit = self.committer.commit(&read.linked).await?;
        let load = self.loader.rebuild().await?;
        let counts = self.store.counts().await?;

        let report = IngestionReport {
            started_at,
            finished_at: Utc::now(),
            rows_read: read.linked.rows,
            rows_skipped: read.skipped,
            duplicate_rows: read.linked.duplicate_rows,
            commit,
            load,
            counts,
        };

        info!(
            elapsed_ms = report.elapsed().num_milliseconds(),
            skills = counts.skills,
            jobs = counts.jobs,
            job_skills = counts.job_skills,
            "Ingestion complete"
        );
        Ok(report)
    }

    /// Rebuild the index from the store without reading any input.
    pub async fn reindex(&self) -> Result<LoadReport, PipelineError> {
        self.loader.rebuild().await
    }

    /// Read off the async runtime; CSV parsing is blocking file I/O.
    async fn read(&self, path: &Path) -> Result<ReadOutcome, PipelineError> {
        let path = path.to_path_buf();
        let config = self.reader_config.clone();

        tokio::task::spawn_blocking(move || read_linked(&path, &config))
            .await
            .map_err(|e| PipelineError::Io(std::io::Error::other(e)))?
    }
}
