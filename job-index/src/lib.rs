//! # Job Index
//!
//! Entry point and configuration for the job index. The binary reads its
//! settings from the environment, wires the relational store and the search
//! index together, and runs one command per invocation.

pub mod cli;
pub mod config;

pub use cli::{Cli, Command};
pub use config::{Dependencies, Settings};

use thiserror::Error;

/// Errors that can occur during start-up or while running a command.
#[derive(Error, Debug)]
pub enum IndexingError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Pipeline error.
    #[error("Pipeline error: {0}")]
    PipelineError(#[from] job_index_pipeline::PipelineError),

    /// Relational store error.
    #[error("Store error: {0}")]
    StoreError(#[from] job_index_store::StoreError),

    /// Search error.
    #[error("Search error: {0}")]
    SearchError(#[from] job_index_repository::SearchError),

    /// IO error.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl IndexingError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }
}
