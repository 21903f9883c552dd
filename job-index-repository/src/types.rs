//! Request and response types for search index operations.

use serde_json::Value;

use crate::errors::SearchError;
use job_index_shared::JobDocument;

/// One document write inside a bulk request.
///
/// Carries upsert semantics: a document with the same id is replaced.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexOperation {
    /// The document id in the index.
    pub document_id: String,
    /// The document body.
    pub document: Value,
}

impl IndexOperation {
    /// Build the index operation for a job document.
    pub fn from_document(document: &JobDocument) -> Result<Self, SearchError> {
        let body = serde_json::to_value(document)
            .map_err(|e| SearchError::serialization(e.to_string()))?;

        Ok(Self {
            document_id: document.document_id(),
            document: body,
        })
    }
}

/// A single hit as returned by the search engine, before domain mapping.
#[derive(Debug, Clone, PartialEq)]
pub struct RawHit {
    /// The engine's internal document identifier.
    pub id: Option<String>,
    /// Relevance score; absent when sorting by a field.
    pub score: Option<f64>,
    /// The stored document body.
    pub source: Value,
}

/// Raw search results with the engine-reported match count.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawSearchResponse {
    pub hits: Vec<RawHit>,
    /// Exact number of matching documents across all pages.
    pub total: u64,
}

/// Result of a batch operation for a single item.
///
/// This struct represents the outcome of a single operation within a batch.
/// It indicates whether the operation succeeded and includes error details if
/// it failed.
#[derive(Debug, Clone)]
pub struct BatchOperationResult {
    /// The document id the operation targeted.
    pub document_id: String,
    /// Whether the operation succeeded.
    pub success: bool,
    /// Error reported by the engine if the operation failed.
    pub error: Option<String>,
}

/// Summary of a batch operation containing aggregate statistics and individual results.
///
/// This struct provides a complete overview of a bulk operation, including the total
/// number of items processed, how many succeeded and failed, and detailed results for
/// each individual item. This allows callers to handle partial failures gracefully.
#[derive(Debug, Clone, Default)]
pub struct BatchOperationSummary {
    /// Total number of items in the batch.
    pub total: usize,
    /// Number of successful operations.
    pub succeeded: usize,
    /// Number of failed operations.
    pub failed: usize,
    /// Individual results for each item.
    pub results: Vec<BatchOperationResult>,
}

impl BatchOperationSummary {
    /// Build a summary from per-item results.
    pub fn from_results(results: Vec<BatchOperationResult>) -> Self {
        let succeeded = results.iter().filter(|r| r.success).count();
        Self {
            total: results.len(),
            succeeded,
            failed: results.len() - succeeded,
            results,
        }
    }

    /// Ids of the documents that failed, in request order.
    pub fn failed_ids(&self) -> Vec<&str> {
        self.results
            .iter()
            .filter(|r| !r.success)
            .map(|r| r.document_id.as_str())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use job_index_shared::{Industry, SkillRef};

    #[test]
    fn test_index_operation_from_document() {
        let doc = JobDocument {
            id: 42,
            title: "Nurse".to_string(),
            company: "Clinic".to_string(),
            location: "Oslo".to_string(),
            experience_level: "Senior".to_string(),
            salary: 70_000,
            industry: Industry::Healthcare,
            skills: vec![SkillRef { skill_id: 9, name: "Triage".to_string() }],
        };

        let op = IndexOperation::from_document(&doc).unwrap();

        assert_eq!(op.document_id, "42");
        assert_eq!(op.document["id"], 42);
        assert_eq!(op.document["skills"][0]["name"], "Triage");
    }

    #[test]
    fn test_summary_from_results() {
        let summary = BatchOperationSummary::from_results(vec![
            BatchOperationResult { document_id: "1".to_string(), success: true, error: None },
            BatchOperationResult {
                document_id: "2".to_string(),
                success: false,
                error: Some("mapper_parsing_exception".to_string()),
            },
        ]);

        assert_eq!(summary.total, 2);
        assert_eq!(summary.succeeded, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.failed_ids(), vec!["2"]);
    }
}
