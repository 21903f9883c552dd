//! OpenSearch index configuration and mappings.
//!
//! This module defines the index settings and mappings for the job search index.

use serde_json::{json, Value};

/// The default name of the search index.
pub const DEFAULT_INDEX_NAME: &str = "jobs";

/// Identifies the index a client writes to and reads from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexConfig {
    /// Index name.
    pub name: String,
}

impl IndexConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self::new(DEFAULT_INDEX_NAME)
    }
}

/// Get the index settings and mappings for the job search index.
///
/// The configuration includes:
/// - **Text fields**: `title`, `company`, `location` for relevance matching
/// - **Keyword fields**: `experienceLevel` and `industry` for exact filtering;
///   `industry` also carries a `text` sub-field so free-text queries match it
/// - **Numeric fields**: `id` and `salary` as `long`, matching the 64-bit
///   values the relational store holds
/// - **Nested skills**: `{skillId, name}` with a `raw` keyword on the name
pub fn get_index_settings() -> Value {
    json!({
        "settings": {
            "number_of_shards": 1,
            "number_of_replicas": 1
        },
        "mappings": {
            "properties": {
                "id": {
                    "type": "long"
                },
                "title": {
                    "type": "text"
                },
                "company": {
                    "type": "text"
                },
                "location": {
                    "type": "text"
                },
                "experienceLevel": {
                    "type": "keyword"
                },
                "salary": {
                    "type": "long"
                },
                "industry": {
                    "type": "keyword",
                    "fields": {
                        "text": {
                            "type": "text"
                        }
                    }
                },
                "skills": {
                    "type": "nested",
                    "properties": {
                        "skillId": {
                            "type": "long"
                        },
                        "name": {
                            "type": "text",
                            "fields": {
                                "raw": {
                                    "type": "keyword"
                                }
                            }
                        }
                    }
                }
            }
        }
    })
}
