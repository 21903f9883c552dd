//! OpenSearch client implementation.
//!
//! This module provides the concrete implementation of `SearchEngineClient`
//! using the OpenSearch Rust client.

use async_trait::async_trait;
use opensearch::{
    auth::Credentials,
    cluster::ClusterHealthParts,
    http::request::JsonBody,
    http::response::Response,
    http::transport::{SingleNodeConnectionPool, TransportBuilder},
    indices::{IndicesCreateParts, IndicesExistsParts},
    params::Refresh,
    BulkParts, DeleteParts, IndexParts, OpenSearch, SearchParts,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, error, info, instrument};
use url::Url;

use crate::errors::SearchError;
use crate::interfaces::SearchEngineClient;
use crate::opensearch::index_config::IndexConfig;
use crate::types::{
    BatchOperationResult, BatchOperationSummary, IndexOperation, RawHit, RawSearchResponse,
};

/// OpenSearch client implementation.
///
/// Provides full-text search capabilities using OpenSearch as the backend.
///
/// # Example
///
/// ```ignore
/// use job_index_repository::opensearch::{IndexConfig, OpenSearchClient};
/// let client = OpenSearchClient::new("http://localhost:9200", IndexConfig::default(), None).await?;
/// let exists = client.index_exists().await?;
/// ```
pub struct OpenSearchClient {
    client: OpenSearch,
    index_config: IndexConfig,
}

impl OpenSearchClient {
    /// Create a new OpenSearch client connected to the specified URL.
    ///
    /// # Arguments
    ///
    /// * `url` - The OpenSearch server URL (e.g., "http://localhost:9200")
    /// * `index_config` - The index this client reads and writes
    /// * `credentials` - Optional `(username, password)` for basic auth
    ///
    /// # Returns
    ///
    /// * `Ok(OpenSearchClient)` - A new client instance
    /// * `Err(SearchError)` - If connection setup fails
    pub async fn new(
        url: &str,
        index_config: IndexConfig,
        credentials: Option<(String, String)>,
    ) -> Result<Self, SearchError> {
        let parsed_url = Url::parse(url).map_err(|e| SearchError::connection(e.to_string()))?;

        let conn_pool = SingleNodeConnectionPool::new(parsed_url);
        let mut builder = TransportBuilder::new(conn_pool).disable_proxy();
        if let Some((username, password)) = credentials {
            builder = builder.auth(Credentials::Basic(username, password));
        }
        let transport = builder
            .build()
            .map_err(|e| SearchError::connection(e.to_string()))?;

        let client = OpenSearch::new(transport);

        info!(
            url = %url,
            index = %index_config.name,
            "Created OpenSearch client"
        );

        Ok(Self {
            client,
            index_config,
        })
    }

    fn refresh_param(refresh: bool) -> Refresh {
        if refresh {
            Refresh::True
        } else {
            Refresh::False
        }
    }

    /// Read the body of a failed response for error reporting.
    async fn error_body(response: Response) -> String {
        response.text().await.unwrap_or_default()
    }

    /// Parse a bulk response body into per-item results.
    fn parse_bulk_response(body: &Value) -> Result<BatchOperationSummary, SearchError> {
        let items = body
            .get("items")
            .and_then(Value::as_array)
            .ok_or_else(|| SearchError::parse("Bulk response has no items"))?;

        let results = items
            .iter()
            .map(|item| {
                let action = item
                    .get("index")
                    .or_else(|| item.get("create"))
                    .or_else(|| item.get("update"))
                    .unwrap_or(item);
                let document_id = action
                    .get("_id")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                let error = action.get("error").map(|e| e.to_string());

                BatchOperationResult {
                    document_id,
                    success: error.is_none(),
                    error,
                }
            })
            .collect();

        Ok(BatchOperationSummary::from_results(results))
    }

    /// Parse a search response body into raw hits and the exact total.
    fn parse_search_response(body: Value) -> Result<RawSearchResponse, SearchError> {
        let parsed: SearchBody =
            serde_json::from_value(body).map_err(|e| SearchError::parse(e.to_string()))?;

        let total = match parsed.hits.total {
            Some(TotalHits::Count(count)) => count,
            Some(TotalHits::Object { value }) => value,
            None => parsed.hits.hits.len() as u64,
        };

        let hits = parsed
            .hits
            .hits
            .into_iter()
            .map(|hit| RawHit {
                id: hit.id,
                score: hit.score,
                source: hit.source,
            })
            .collect();

        Ok(RawSearchResponse { hits, total })
    }
}

#[derive(Debug, Deserialize)]
struct SearchBody {
    hits: HitsBody,
}

#[derive(Debug, Deserialize)]
struct HitsBody {
    #[serde(default)]
    total: Option<TotalHits>,
    #[serde(default)]
    hits: Vec<HitBody>,
}

/// `hits.total` is either a bare number or `{ "value": n, "relation": ... }`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TotalHits {
    Count(u64),
    Object { value: u64 },
}

#[derive(Debug, Deserialize)]
struct HitBody {
    #[serde(rename = "_id", default)]
    id: Option<String>,
    #[serde(rename = "_score", default)]
    score: Option<f64>,
    #[serde(rename = "_source", default)]
    source: Value,
}

#[async_trait]
impl SearchEngineClient for OpenSearchClient {
    async fn index_exists(&self) -> Result<bool, SearchError> {
        let response = self
            .client
            .indices()
            .exists(IndicesExistsParts::Index(&[self.index_config.name.as_str()]))
            .send()
            .await
            .map_err(|e| SearchError::connection(e.to_string()))?;

        match response.status_code().as_u16() {
            200 => Ok(true),
            404 => Ok(false),
            status => Err(SearchError::query(format!(
                "Index exists check failed with status {}",
                status
            ))),
        }
    }

    #[instrument(skip(self, settings), fields(index = %self.index_config.name))]
    async fn create_index(&self, settings: &Value) -> Result<(), SearchError> {
        let response = self
            .client
            .indices()
            .create(IndicesCreateParts::Index(&self.index_config.name))
            .body(settings.clone())
            .send()
            .await
            .map_err(|e| SearchError::index_creation(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let error_body = Self::error_body(response).await;
            error!(status = %status, body = %error_body, "Index creation failed");
            return Err(SearchError::index_creation(format!(
                "Index creation failed with status {}: {}",
                status, error_body
            )));
        }

        info!("Created search index");
        Ok(())
    }

    #[instrument(skip(self, operations), fields(count = operations.len()))]
    async fn bulk(
        &self,
        operations: &[IndexOperation],
        refresh: bool,
    ) -> Result<BatchOperationSummary, SearchError> {
        if operations.is_empty() {
            return Ok(BatchOperationSummary::default());
        }

        let mut body: Vec<JsonBody<Value>> = Vec::with_capacity(operations.len() * 2);
        for op in operations {
            body.push(json!({"index": {"_index": self.index_config.name, "_id": op.document_id}}).into());
            body.push(op.document.clone().into());
        }

        let response = self
            .client
            .bulk(BulkParts::Index(&self.index_config.name))
            .refresh(Self::refresh_param(refresh))
            .body(body)
            .send()
            .await
            .map_err(|e| SearchError::bulk_index(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let error_body = Self::error_body(response).await;
            error!(status = %status, body = %error_body, "Bulk request failed");
            return Err(SearchError::bulk_index(format!(
                "Bulk failed with status {}: {}",
                status, error_body
            )));
        }

        let response_body: Value = response
            .json()
            .await
            .map_err(|e| SearchError::parse(e.to_string()))?;

        let summary = Self::parse_bulk_response(&response_body)?;
        debug!(
            succeeded = summary.succeeded,
            failed = summary.failed,
            "Bulk request completed"
        );
        Ok(summary)
    }

    async fn index_document(
        &self,
        operation: &IndexOperation,
        refresh: bool,
    ) -> Result<(), SearchError> {
        let response = self
            .client
            .index(IndexParts::IndexId(&self.index_config.name, &operation.document_id))
            .refresh(Self::refresh_param(refresh))
            .body(operation.document.clone())
            .send()
            .await
            .map_err(|e| SearchError::index(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let error_body = Self::error_body(response).await;
            error!(status = %status, body = %error_body, "Index request failed");
            return Err(SearchError::index(format!(
                "Index failed with status {}: {}",
                status, error_body
            )));
        }

        debug!(doc_id = %operation.document_id, "Document indexed");
        Ok(())
    }

    async fn delete_document(&self, document_id: &str, refresh: bool) -> Result<(), SearchError> {
        let response = self
            .client
            .delete(DeleteParts::IndexId(&self.index_config.name, document_id))
            .refresh(Self::refresh_param(refresh))
            .send()
            .await
            .map_err(|e| SearchError::delete(e.to_string()))?;

        let status = response.status_code();

        // 404 is acceptable - document may not exist
        if !status.is_success() && status.as_u16() != 404 {
            let error_body = Self::error_body(response).await;
            error!(status = %status, body = %error_body, "Delete request failed");
            return Err(SearchError::delete(format!(
                "Delete failed with status {}: {}",
                status, error_body
            )));
        }

        debug!(doc_id = %document_id, "Document deleted");
        Ok(())
    }

    async fn search(&self, query: &Value) -> Result<RawSearchResponse, SearchError> {
        let response = self
            .client
            .search(SearchParts::Index(&[self.index_config.name.as_str()]))
            .body(query.clone())
            .send()
            .await
            .map_err(|e| SearchError::query(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let error_body = Self::error_body(response).await;
            return Err(SearchError::query(format!(
                "Search failed with status {}: {}",
                status, error_body
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| SearchError::parse(e.to_string()))?;

        Self::parse_search_response(body)
    }

    async fn health_check(&self) -> Result<bool, SearchError> {
        let response = self
            .client
            .cluster()
            .health(ClusterHealthParts::None)
            .send()
            .await
            .map_err(|e| SearchError::connection(e.to_string()))?;

        if !response.status_code().is_success() {
            return Ok(false);
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| SearchError::parse(e.to_string()))?;

        let status = body.get("status").and_then(Value::as_str).unwrap_or("red");
        Ok(status == "green" || status == "yellow")
    }
}
