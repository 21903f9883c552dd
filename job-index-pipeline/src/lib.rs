//! # Job Index Pipeline
//!
//! This crate turns a flat job CSV into a normalized relational model and a
//! denormalized search index, and keeps the index in step with later
//! single-job mutations.
//!
//! ## Architecture
//!
//! Bulk ingestion flows through:
//!
//! 1. **Reader**: streams and normalizes CSV rows
//! 2. **Linker**: deduplicates skills and jobs, collects candidate edges
//! 3. **Commit**: writes skills, jobs and edges in batches and resolves ids
//! 4. **Loader**: rebuilds the search index from the store
//! 5. **Orchestrator**: runs the steps above in order
//!
//! Single-job writes go through [`JobService`], which mirrors every change
//! into the index with [`WriteThroughSync`].

pub mod commit;
pub mod errors;
pub mod linker;
pub mod loader;
pub mod orchestrator;
pub mod reader;
pub mod service;
pub mod sync;

pub use commit::{BatchCommitter, CommitConfig, CommitPhase, CommitReport};
pub use errors::{PipelineError, RowParseError};
pub use linker::{EntityLinker, LinkedEntities};
pub use loader::{IndexLoader, LoadReport, LoaderConfig, RetryPolicy};
pub use orchestrator::{IngestionReport, Orchestrator, OrchestratorConfig};
pub use reader::{NormalizedRow, ReaderConfig, RowErrorPolicy, RowReader};
pub use service::JobService;
pub use sync::WriteThroughSync;
