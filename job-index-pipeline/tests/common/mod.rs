//! Shared fixtures for the pipeline integration tests.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::io::Write;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;

use job_index_pipeline::{Orchestrator, OrchestratorConfig};
use job_index_repository::{
    BatchOperationResult, BatchOperationSummary, IndexOperation, JobIndexClient, RawHit,
    RawSearchResponse, SearchEngineClient, SearchError,
};
use job_index_store::SqliteJobStore;

pub const HEADER: &str =
    "Job Title,Company,Location,Experience Level,Salary,Industry,Required Skills\n";

/// In-memory search engine that evaluates the query bodies the client builds:
/// `match_all` or `multi_match`, `term` filters, salary sort and `from`/`size`.
#[derive(Default)]
pub struct InMemorySearchEngine {
    exists: Mutex<bool>,
    documents: Mutex<BTreeMap<i64, Value>>,
}

impl InMemorySearchEngine {
    pub async fn document(&self, id: i64) -> Option<Value> {
        self.documents.lock().await.get(&id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.documents.lock().await.len()
    }
}

fn parse_id(document_id: &str) -> Result<i64, SearchError> {
    document_id
        .parse()
        .map_err(|_| SearchError::index(format!("non-numeric id {}", document_id)))
}

fn text_score(source: &Value, query: &str) -> u32 {
    let weighted = [("title", 2), ("company", 1), ("location", 1), ("industry", 1)];
    let mut score = 0;

    for token in query.split_whitespace().map(str::to_lowercase) {
        for (field, weight) in weighted {
            let text = source[field].as_str().unwrap_or_default().to_lowercase();
            if text.split_whitespace().any(|word| word == token) {
                score += weight;
            }
        }
    }
    score
}

fn term_matches(source: &Value, filter: &Value) -> bool {
    match filter["term"].as_object() {
        Some(term) => term.iter().all(|(field, value)| &source[field.as_str()] == value),
        None => true,
    }
}

#[async_trait]
impl SearchEngineClient for InMemorySearchEngine {
    async fn index_exists(&self) -> Result<bool, SearchError> {
        Ok(*self.exists.lock().await)
    }

    async fn create_index(&self, _settings: &Value) -> Result<(), SearchError> {
        let mut exists = self.exists.lock().await;
        if *exists {
            return Err(SearchError::index_creation("resource_already_exists_exception"));
        }
        *exists = true;
        Ok(())
    }

    async fn bulk(
        &self,
        operations: &[IndexOperation],
        _refresh: bool,
    ) -> Result<BatchOperationSummary, SearchError> {
        let mut documents = self.documents.lock().await;
        let mut results = Vec::with_capacity(operations.len());

        for op in operations {
            let id = parse_id(&op.document_id)?;
            documents.insert(id, op.document.clone());
            results.push(BatchOperationResult {
                document_id: op.document_id.clone(),
                success: true,
                error: None,
            });
        }
        Ok(BatchOperationSummary::from_results(results))
    }

    async fn index_document(&self, operation: &IndexOperation, _refresh: bool) -> Result<(), SearchError> {
        let id = parse_id(&operation.document_id)?;
        self.documents.lock().await.insert(id, operation.document.clone());
        Ok(())
    }

    async fn delete_document(&self, document_id: &str, _refresh: bool) -> Result<(), SearchError> {
        let id = parse_id(document_id)?;
        self.documents.lock().await.remove(&id);
        Ok(())
    }

    async fn search(&self, query: &Value) -> Result<RawSearchResponse, SearchError> {
        let documents = self.documents.lock().await;
        let must = &query["query"]["bool"]["must"][0];
        let filters = query["query"]["bool"]["filter"].as_array().cloned().unwrap_or_default();

        let mut matches: Vec<(u32, i64, &Value)> = documents
            .iter()
            .filter(|(_, source)| filters.iter().all(|f| term_matches(source, f)))
            .filter_map(|(id, source)| match must["multi_match"]["query"].as_str() {
                Some(text) => {
                    let score = text_score(source, text);
                    (score > 0).then_some((score, *id, source))
                }
                None => Some((1, *id, source)),
            })
            .collect();

        match query["sort"][0]["salary"]["order"].as_str() {
            Some(order) => matches.sort_by(|a, b| {
                let ordering = a.2["salary"]
                    .as_i64()
                    .cmp(&b.2["salary"].as_i64())
                    .then(a.1.cmp(&b.1));
                if order == "desc" {
                    ordering.reverse()
                } else {
                    ordering
                }
            }),
            None => matches.sort_by(|a, b| match b.0.cmp(&a.0) {
                Ordering::Equal => a.1.cmp(&b.1),
                other => other,
            }),
        }

        let from = query["from"].as_u64().unwrap_or(0) as usize;
        let size = query["size"].as_u64().unwrap_or(10) as usize;

        Ok(RawSearchResponse {
            total: matches.len() as u64,
            hits: matches
                .into_iter()
                .skip(from)
                .take(size)
                .map(|(score, id, source)| RawHit {
                    id: Some(id.to_string()),
                    score: Some(f64::from(score)),
                    source: source.clone(),
                })
                .collect(),
        })
    }

    async fn health_check(&self) -> Result<bool, SearchError> {
        Ok(true)
    }
}

/// Everything an end-to-end test needs, wired over in-memory backends.
pub struct Harness {
    pub store: Arc<SqliteJobStore>,
    pub engine: Arc<InMemorySearchEngine>,
    pub index: Arc<JobIndexClient>,
    pub orchestrator: Orchestrator,
}

impl Harness {
    pub async fn new(batch_size: usize) -> Self {
        let store = Arc::new(SqliteJobStore::in_memory().await.unwrap());
        let engine = Arc::new(InMemorySearchEngine::default());
        let index = Arc::new(JobIndexClient::new(engine.clone()));
        let orchestrator = Orchestrator::with_config(
            store.clone(),
            index.clone(),
            OrchestratorConfig::default().with_batch_size(batch_size),
        );

        Self {
            store,
            engine,
            index,
            orchestrator,
        }
    }
}

/// Write a CSV body (without header) to a temporary file.
pub fn csv_file(body: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "{}{}", HEADER, body).unwrap();
    file
}
