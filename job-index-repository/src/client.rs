//! Job index client implementation.
//!
//! This module provides the main client for interacting with the job index.
//! Application code uses this to create the index, write and remove job
//! documents, and run paginated searches.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, error, info, instrument, warn};

use crate::config::SearchIndexConfig;
use crate::errors::SearchError;
use crate::interfaces::SearchEngineClient;
use crate::opensearch::{build_search_query, get_index_settings};
use crate::types::{BatchOperationSummary, IndexOperation, RawHit};
use job_index_shared::{Industry, JobDocument, JobPage, JobSearchRequest, SkillRef};

/// The main client for interacting with the job index.
///
/// Every write forces a refresh so the change is searchable as soon as the
/// call returns.
pub struct JobIndexClient {
    engine: Arc<dyn SearchEngineClient>,
    config: SearchIndexConfig,
}

impl JobIndexClient {
    /// Create a new JobIndexClient with default configuration.
    pub fn new(engine: Arc<dyn SearchEngineClient>) -> Self {
        Self {
            engine,
            config: SearchIndexConfig::default(),
        }
    }

    /// Create a new JobIndexClient with custom configuration.
    pub fn with_config(engine: Arc<dyn SearchEngineClient>, config: SearchIndexConfig) -> Self {
        Self { engine, config }
    }

    /// Create the index with the job mappings if it does not exist yet.
    ///
    /// An existing index is left untouched, even if its mappings differ.
    /// Returns whether the index was created by this call.
    pub async fn ensure_index(&self) -> Result<bool, SearchError> {
        if self.engine.index_exists().await? {
            debug!("Search index already exists");
            return Ok(false);
        }

        self.engine.create_index(&get_index_settings()).await?;
        info!("Search index created");
        Ok(true)
    }

    /// Upsert a single job document.
    pub async fn put(&self, document: &JobDocument) -> Result<(), SearchError> {
        let operation = IndexOperation::from_document(document)?;
        self.engine.index_document(&operation, true).await
    }

    /// Remove the document of a job. A missing document is not an error.
    pub async fn delete(&self, job_id: i64) -> Result<(), SearchError> {
        self.engine.delete_document(&job_id.to_string(), true).await
    }

    /// Upsert a chunk of job documents in one bulk request.
    ///
    /// The batch size is limited by the configured max_batch_size (default: 1000).
    /// Individual failures are reported in the summary.
    #[instrument(skip(self, documents), fields(count = documents.len()))]
    pub async fn bulk_put(
        &self,
        documents: &[JobDocument],
    ) -> Result<BatchOperationSummary, SearchError> {
        if documents.is_empty() {
            return Ok(BatchOperationSummary::default());
        }

        self.config.check(documents.len())?;

        let operations = documents
            .iter()
            .map(IndexOperation::from_document)
            .collect::<Result<Vec<_>, _>>()?;

        self.engine.bulk(&operations, true).await
    }

    /// Run a paginated search.
    ///
    /// Search is best-effort: engine failures are logged and produce an empty
    /// page instead of an error.
    #[instrument(skip(self))]
    pub async fn search(&self, request: &JobSearchRequest) -> JobPage {
        let body = build_search_query(request);

        let response = match self.engine.search(&body).await {
            Ok(response) => response,
            Err(e) => {
                error!(error = %e, "Search failed, returning empty page");
                return JobPage::empty(request);
            }
        };

        let data: Vec<JobDocument> = response.hits.iter().filter_map(map_hit).collect();
        let skipped = (response.hits.len() - data.len()) as u32;
        if skipped > 0 {
            warn!(skipped, total = response.total, "Page holds hits that could not be mapped");
        }

        JobPage {
            data,
            total: response.total,
            page: request.page(),
            limit: request.limit(),
            skipped,
        }
    }

    /// Check if the search engine is healthy.
    pub async fn health_check(&self) -> Result<bool, SearchError> {
        self.engine.health_check().await
    }

    /// Largest chunk [`bulk_put`](Self::bulk_put) accepts, if limited.
    pub fn max_batch_size(&self) -> Option<usize> {
        self.config.max_batch_size
    }
}

/// Map a raw hit back to a job document.
///
/// The id comes from the document body when it is an integer, otherwise from
/// the engine's document id, otherwise 0. Skills without a name are dropped.
/// Returns `None` only when the industry is not a known value.
pub fn map_hit(hit: &RawHit) -> Option<JobDocument> {
    let source = &hit.source;

    let id = source
        .get("id")
        .and_then(Value::as_i64)
        .or_else(|| hit.id.as_deref().and_then(|id| id.parse::<i64>().ok()))
        .unwrap_or(0);

    let industry_text = string_field(source, "industry");
    let industry = match industry_text.parse::<Industry>() {
        Ok(industry) => industry,
        Err(e) => {
            warn!(id = id, error = %e, "Skipping hit with unknown industry");
            return None;
        }
    };

    let skills = source
        .get("skills")
        .and_then(Value::as_array)
        .map(|skills| {
            skills
                .iter()
                .filter_map(|skill| {
                    let name = skill.get("name").and_then(Value::as_str)?;
                    if name.is_empty() {
                        return None;
                    }
                    Some(SkillRef {
                        skill_id: skill.get("skillId").and_then(Value::as_i64).unwrap_or(0),
                        name: name.to_string(),
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    Some(JobDocument {
        id,
        title: string_field(source, "title"),
        company: string_field(source, "company"),
        location: string_field(source, "location"),
        experience_level: string_field(source, "experienceLevel"),
        salary: source.get("salary").and_then(Value::as_i64).unwrap_or(0),
        industry,
        skills,
    })
}

fn string_field(source: &Value, field: &str) -> String {
    source
        .get(field)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}
