//! # Job Index Repository
//!
//! This crate provides traits and implementations for interacting with the
//! search engine that holds the denormalized job documents. It includes
//! definitions for errors, the engine interface, a concrete implementation
//! for OpenSearch, and [`JobIndexClient`], the façade the rest of the system
//! uses to build, update and query the index.

pub mod client;
pub mod config;
pub mod errors;
pub mod interfaces;
pub mod opensearch;
pub mod types;

pub use client::JobIndexClient;
pub use config::SearchIndexConfig;
pub use errors::SearchError;
pub use interfaces::SearchEngineClient;
pub use opensearch::{IndexConfig, OpenSearchClient};
pub use types::{BatchOperationResult, BatchOperationSummary, IndexOperation, RawHit, RawSearchResponse};
