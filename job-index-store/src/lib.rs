//! # Job Index Store
//!
//! The relational system of record for skills, jobs and the edges between
//! them. It exposes the [`JobStore`] trait used by the ingestion pipeline and
//! the write-through path, and a SQLite implementation built on `sqlx`.

pub mod errors;
pub mod interfaces;
pub mod sqlite;
pub mod types;

pub use errors::StoreError;
pub use interfaces::JobStore;
pub use sqlite::{SqliteJobStore, StoreConfig};
pub use types::{JobUpdate, StoreCounts};
