//! Dependency initialization and wiring for the job index.

use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::Settings;
use crate::IndexingError;
use job_index_pipeline::{JobService, Orchestrator, OrchestratorConfig, ReaderConfig};
use job_index_repository::{
    IndexConfig, JobIndexClient, OpenSearchClient, SearchEngineClient, SearchIndexConfig,
};
use job_index_store::{JobStore, SqliteJobStore, StoreConfig};

/// Container for all initialized dependencies.
pub struct Dependencies {
    pub store: Arc<dyn JobStore>,
    pub index: Arc<JobIndexClient>,
    /// Bulk ingestion and index rebuilds.
    pub orchestrator: Orchestrator,
    /// Single-job reads and writes with index write-through.
    pub service: JobService,
    /// Cancelling stops ingestion and rebuilds at the next batch boundary.
    pub cancel: CancellationToken,
}

impl Dependencies {
    /// Connect to OpenSearch and the relational store described by `settings`.
    ///
    /// # Returns
    ///
    /// * `Ok(Dependencies)` - Initialized dependencies
    /// * `Err(IndexingError)` - If a backend cannot be reached
    pub async fn new(settings: &Settings) -> Result<Self, IndexingError> {
        info!(
            opensearch_url = %settings.opensearch_url,
            index = %settings.index_name,
            database_url = %settings.database_url,
            batch_size = settings.batch_size,
            row_error_policy = %settings.row_error_policy,
            "Initializing dependencies"
        );

        let search_client = OpenSearchClient::new(
            &settings.opensearch_url,
            IndexConfig::new(settings.index_name.clone()),
            settings.opensearch_credentials.clone(),
        )
        .await
        .map_err(|e| IndexingError::config(format!("Failed to create OpenSearch client: {}", e)))?;

        let healthy = search_client
            .health_check()
            .await
            .map_err(|e| IndexingError::config(format!("OpenSearch health check failed: {}", e)))?;

        if !healthy {
            return Err(IndexingError::config("OpenSearch cluster is unhealthy"));
        }

        info!("OpenSearch connection verified");

        let store = SqliteJobStore::connect(&StoreConfig::new(settings.database_url.clone())).await?;

        Ok(Self::from_parts(Arc::new(store), Arc::new(search_client), settings))
    }

    /// Wire already-constructed backends together.
    pub fn from_parts(
        store: Arc<dyn JobStore>,
        engine: Arc<dyn SearchEngineClient>,
        settings: &Settings,
    ) -> Self {
        let index_config = SearchIndexConfig::for_batch_size(settings.batch_size);
        let index = Arc::new(JobIndexClient::with_config(engine, index_config));

        let orchestrator_config = OrchestratorConfig {
            reader: ReaderConfig {
                policy: settings.row_error_policy,
                ..ReaderConfig::default()
            },
            ..OrchestratorConfig::default()
        }
        .with_batch_size(settings.batch_size);

        let cancel = CancellationToken::new();
        let orchestrator =
            Orchestrator::with_config(store.clone(), index.clone(), orchestrator_config)
                .with_cancellation(cancel.clone());
        let service = JobService::new(store.clone(), index.clone());

        Self {
            store,
            index,
            orchestrator,
            service,
            cancel,
        }
    }
}
