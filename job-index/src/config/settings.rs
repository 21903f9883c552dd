//! Settings read from environment variables.

use std::env;
use std::str::FromStr;

use job_index_pipeline::RowErrorPolicy;

use crate::IndexingError;

/// Default OpenSearch URL.
pub const DEFAULT_OPENSEARCH_URL: &str = "http://localhost:9200";

/// Default search index name.
pub const DEFAULT_INDEX_NAME: &str = job_index_repository::opensearch::DEFAULT_INDEX_NAME;

/// Default relational database.
pub const DEFAULT_DATABASE_URL: &str = "sqlite://jobs.db";

/// Default batch size for store commits and index chunks.
pub const DEFAULT_BATCH_SIZE: usize = job_index_pipeline::commit::DEFAULT_BATCH_SIZE;

/// Everything the binary needs to build its dependencies.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub opensearch_url: String,
    /// Basic auth `(username, password)`; set only when both are given.
    pub opensearch_credentials: Option<(String, String)>,
    pub index_name: String,
    pub database_url: String,
    pub batch_size: usize,
    pub row_error_policy: RowErrorPolicy,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            opensearch_url: DEFAULT_OPENSEARCH_URL.to_string(),
            opensearch_credentials: None,
            index_name: DEFAULT_INDEX_NAME.to_string(),
            database_url: DEFAULT_DATABASE_URL.to_string(),
            batch_size: DEFAULT_BATCH_SIZE,
            row_error_policy: RowErrorPolicy::default(),
        }
    }
}

impl Settings {
    /// Read settings from the process environment.
    ///
    /// # Environment Variables
    ///
    /// - `OPENSEARCH_URL`: OpenSearch server URL (default: http://localhost:9200)
    /// - `OPENSEARCH_USERNAME` / `OPENSEARCH_PASSWORD`: optional basic auth
    /// - `JOB_INDEX_NAME`: index name (default: jobs)
    /// - `DATABASE_URL`: sqlx SQLite URL (default: sqlite://jobs.db)
    /// - `BATCH_SIZE`: records per commit statement and bulk request (default: 500)
    /// - `ROW_ERROR_POLICY`: `skip` or `abort` (default: skip)
    pub fn from_env() -> Result<Self, IndexingError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build settings from an arbitrary variable lookup. Blank values count
    /// as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, IndexingError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let defaults = Self::default();

        let opensearch_credentials = match (var("OPENSEARCH_USERNAME"), var("OPENSEARCH_PASSWORD")) {
            (Some(username), Some(password)) => Some((username, password)),
            (None, None) => None,
            _ => {
                return Err(IndexingError::config(
                    "OPENSEARCH_USERNAME and OPENSEARCH_PASSWORD must be set together",
                ))
            }
        };

        let batch_size = match var("BATCH_SIZE") {
            Some(raw) => parse_batch_size(&raw)?,
            None => defaults.batch_size,
        };

        let row_error_policy = match var("ROW_ERROR_POLICY") {
            Some(raw) => RowErrorPolicy::from_str(&raw)
                .map_err(|e| IndexingError::config(e.to_string()))?,
            None => defaults.row_error_policy,
        };

        Ok(Self {
            opensearch_url: var("OPENSEARCH_URL").unwrap_or(defaults.opensearch_url),
            opensearch_credentials,
            index_name: var("JOB_INDEX_NAME").unwrap_or(defaults.index_name),
            database_url: var("DATABASE_URL").unwrap_or(defaults.database_url),
            batch_size,
            row_error_policy,
        })
    }
}

/// Parse a positive batch size.
pub(crate) fn parse_batch_size(raw: &str) -> Result<usize, IndexingError> {
    match raw.trim().parse::<usize>() {
        Ok(0) => Err(IndexingError::config("BATCH_SIZE must be greater than zero")),
        Ok(n) => Ok(n),
        Err(_) => Err(IndexingError::config(format!(
            "BATCH_SIZE must be a positive integer, got {:?}",
            raw
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let settings = Settings::from_lookup(lookup(&[])).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.index_name, "jobs");
        assert_eq!(settings.batch_size, 500);
    }

    #[test]
    fn test_reads_every_variable() {
        let settings = Settings::from_lookup(lookup(&[
            ("OPENSEARCH_URL", "https://search:9200"),
            ("OPENSEARCH_USERNAME", "admin"),
            ("OPENSEARCH_PASSWORD", "secret"),
            ("JOB_INDEX_NAME", "jobs_v2"),
            ("DATABASE_URL", "sqlite::memory:"),
            ("BATCH_SIZE", " 250 "),
            ("ROW_ERROR_POLICY", "Abort"),
        ]))
        .unwrap();

        assert_eq!(settings.opensearch_url, "https://search:9200");
        assert_eq!(
            settings.opensearch_credentials,
            Some(("admin".to_string(), "secret".to_string()))
        );
        assert_eq!(settings.index_name, "jobs_v2");
        assert_eq!(settings.database_url, "sqlite::memory:");
        assert_eq!(settings.batch_size, 250);
        assert_eq!(settings.row_error_policy, RowErrorPolicy::Abort);
    }

    #[test]
    fn test_blank_values_fall_back_to_defaults() {
        let settings =
            Settings::from_lookup(lookup(&[("JOB_INDEX_NAME", "  "), ("BATCH_SIZE", "")])).unwrap();
        assert_eq!(settings.index_name, DEFAULT_INDEX_NAME);
        assert_eq!(settings.batch_size, DEFAULT_BATCH_SIZE);
    }

    #[test]
    fn test_username_without_password_is_rejected() {
        let result = Settings::from_lookup(lookup(&[("OPENSEARCH_USERNAME", "admin")]));
        assert!(matches!(result, Err(IndexingError::ConfigError(_))));
    }

    #[test]
    fn test_invalid_batch_size() {
        for raw in ["0", "-3", "many"] {
            let result = Settings::from_lookup(lookup(&[("BATCH_SIZE", raw)]));
            assert!(matches!(result, Err(IndexingError::ConfigError(_))), "{}", raw);
        }
    }

    #[test]
    fn test_unknown_policy() {
        let result = Settings::from_lookup(lookup(&[("ROW_ERROR_POLICY", "retry")]));
        match result {
            Err(IndexingError::ConfigError(msg)) => assert!(msg.contains("retry")),
            other => panic!("expected config error, got {:?}", other),
        }
    }
}
