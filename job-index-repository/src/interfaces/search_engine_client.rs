//! Search engine client trait definition.
//!
//! This module defines the abstract interface for search engine operations,
//! allowing for different backend implementations (OpenSearch, Elasticsearch, etc.).

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::SearchError;
use crate::types::{BatchOperationSummary, IndexOperation, RawSearchResponse};

/// Abstract interface for search engine operations.
///
/// An implementation is bound to a single index (for OpenSearch, the name in
/// its [`IndexConfig`](crate::opensearch::IndexConfig)). Implementations can be
/// swapped for different backends (OpenSearch, mock, etc.) enabling easy
/// testing and potential future migrations.
///
/// # Thread Safety
///
/// All implementations must be `Send + Sync` to allow use across async tasks.
///
/// # Error Handling
///
/// All methods return `Result<T, SearchError>` for consistent error handling.
#[async_trait]
pub trait SearchEngineClient: Send + Sync {
    /// Check whether the index exists.
    async fn index_exists(&self) -> Result<bool, SearchError>;

    /// Create the index with the given settings and mappings.
    ///
    /// # Arguments
    ///
    /// * `settings` - The full index creation body (`settings` and `mappings`)
    ///
    /// # Returns
    ///
    /// * `Ok(())` - If the index was created
    /// * `Err(SearchError::IndexCreationError)` - If creation fails, including
    ///   when the index already exists
    async fn create_index(&self, settings: &Value) -> Result<(), SearchError>;

    /// Submit index operations in a single bulk request.
    ///
    /// Each operation replaces any existing document with the same id.
    ///
    /// # Arguments
    ///
    /// * `operations` - The documents to write
    /// * `refresh` - Make the written documents searchable before returning
    ///
    /// # Returns
    ///
    /// * `Ok(BatchOperationSummary)` - Per-item outcome of the bulk request
    /// * `Err(SearchError)` - If the request as a whole fails
    async fn bulk(
        &self,
        operations: &[IndexOperation],
        refresh: bool,
    ) -> Result<BatchOperationSummary, SearchError>;

    /// Index a single document, replacing a document with the same id.
    ///
    /// # Arguments
    ///
    /// * `operation` - The document to write
    /// * `refresh` - Make the document searchable before returning
    async fn index_document(&self, operation: &IndexOperation, refresh: bool)
        -> Result<(), SearchError>;

    /// Delete a document from the index.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - If the document was deleted (or didn't exist)
    /// * `Err(SearchError)` - If the deletion fails
    async fn delete_document(&self, document_id: &str, refresh: bool) -> Result<(), SearchError>;

    /// Execute a search request body against the index.
    ///
    /// # Arguments
    ///
    /// * `query` - A complete search body (query, sort, from, size)
    ///
    /// # Example
    ///
    /// ```ignore
    /// let body = build_search_query(&JobSearchRequest::new().with_query("rust"));
    /// let response = client.search(&body).await?;
    /// println!("Found {} results", response.total);
    /// ```
    async fn search(&self, query: &Value) -> Result<RawSearchResponse, SearchError>;

    /// Check if the search engine is healthy and reachable.
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - If the search engine is healthy
    /// * `Ok(false)` - If the search engine is unhealthy
    /// * `Err(SearchError)` - If the health check fails to execute
    async fn health_check(&self) -> Result<bool, SearchError>;
}
