//! Command-line interface.
//!
//! Each invocation runs one [`Command`] against fully wired
//! [`Dependencies`] and writes a JSON result to the given writer.

use std::io::Write;
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use serde_json::json;
use tracing::{error, info, warn};

use crate::config::{Dependencies, Settings};
use crate::IndexingError;
use job_index_pipeline::{PipelineError, RowErrorPolicy};
use job_index_shared::{Industry, JobSearchRequest, SortOrder, DEFAULT_PAGE_SIZE};
use job_index_store::StoreError;

#[derive(Parser, Debug)]
#[command(name = "job-index")]
#[command(about = "Load job CSVs into a relational store and a search index", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Log output format
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Text, global = true)]
    pub log_format: LogFormat,

    /// Override BATCH_SIZE
    #[arg(long, global = true, value_parser = parse_batch_size)]
    pub batch_size: Option<usize>,

    /// Override ROW_ERROR_POLICY (skip|abort)
    #[arg(long, global = true, value_parser = parse_policy)]
    pub row_error_policy: Option<RowErrorPolicy>,

    /// Override DATABASE_URL
    #[arg(long, global = true)]
    pub database_url: Option<String>,

    /// Override JOB_INDEX_NAME
    #[arg(long, global = true)]
    pub index_name: Option<String>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Load a job CSV into the store, then rebuild the index
    Ingest {
        /// Path to the CSV file
        path: PathBuf,
    },
    /// Rebuild the index from the store
    Reindex,
    /// Query the index
    Search {
        /// Free-text query over title, company, location and industry
        #[arg(short, long)]
        query: Option<String>,
        /// Exact industry filter
        #[arg(long)]
        industry: Option<Industry>,
        /// Sort by salary instead of relevance
        #[arg(long, value_enum)]
        sort: Option<SalarySort>,
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
        limit: u32,
    },
    /// Print one job and its skills from the store
    Show { id: i64 },
    /// Delete a job and its index document
    Delete { id: i64 },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SalarySort {
    Asc,
    Desc,
}

impl From<SalarySort> for SortOrder {
    fn from(sort: SalarySort) -> Self {
        match sort {
            SalarySort::Asc => SortOrder::Asc,
            SalarySort::Desc => SortOrder::Desc,
        }
    }
}

fn parse_batch_size(raw: &str) -> Result<usize, String> {
    crate::config::parse_batch_size(raw).map_err(|e| e.to_string())
}

fn parse_policy(raw: &str) -> Result<RowErrorPolicy, String> {
    raw.parse::<RowErrorPolicy>().map_err(|e| e.to_string())
}

impl Cli {
    /// Apply command-line overrides on top of environment settings.
    pub fn apply_overrides(&self, mut settings: Settings) -> Settings {
        if let Some(batch_size) = self.batch_size {
            settings.batch_size = batch_size;
        }
        if let Some(policy) = self.row_error_policy {
            settings.row_error_policy = policy;
        }
        if let Some(url) = &self.database_url {
            settings.database_url = url.clone();
        }
        if let Some(name) = &self.index_name {
            settings.index_name = name.clone();
        }
        settings
    }
}

impl Command {
    /// Build the search request for a `search` command.
    pub fn search_request(&self) -> Option<JobSearchRequest> {
        match self {
            Command::Search {
                query,
                industry,
                sort,
                page,
                limit,
            } => {
                let mut request = JobSearchRequest::new().with_page(*page, *limit);
                if let Some(query) = query {
                    request = request.with_query(query.clone());
                }
                if let Some(industry) = industry {
                    request = request.with_industry(*industry);
                }
                if let Some(sort) = sort {
                    request = request.sorted_by_salary((*sort).into());
                }
                Some(request)
            }
            _ => None,
        }
    }
}

/// Run a command and write its JSON result to `out`.
pub async fn execute<W: Write>(
    command: &Command,
    deps: &Dependencies,
    out: &mut W,
) -> Result<(), IndexingError> {
    let result = match command {
        Command::Ingest { path } => {
            let report = deps.orchestrator.ingest(path).await?;
            json!({
                "startedAt": report.started_at.to_rfc3339(),
                "elapsedMs": report.elapsed().num_milliseconds(),
                "rowsRead": report.rows_read,
                "rowsSkipped": report.rows_skipped,
                "duplicateRows": report.duplicate_rows,
                "skillsInserted": report.commit.skills.inserted,
                "jobsInserted": report.commit.jobs.inserted,
                "edgesInserted": report.commit.edges.inserted,
                "edgesDropped": report.commit.edges.dropped,
                "documentsIndexed": report.load.documents_indexed,
                "counts": {
                    "skills": report.counts.skills,
                    "jobs": report.counts.jobs,
                    "jobSkills": report.counts.job_skills,
                },
            })
        }
        Command::Reindex => {
            let report = deps.orchestrator.reindex().await?;
            json!({
                "indexCreated": report.index_created,
                "documentsIndexed": report.documents_indexed,
                "chunksSent": report.chunks_sent,
            })
        }
        Command::Search { .. } => {
            let request = command.search_request().unwrap_or_default();
            let page = deps.service.list_jobs(&request).await;
            serde_json::to_value(&page).map_err(std::io::Error::from)?
        }
        Command::Show { id } => match deps.service.get_job(*id).await? {
            Some(job) => serde_json::to_value(&job).map_err(std::io::Error::from)?,
            None => return Err(StoreError::not_found(*id).into()),
        },
        Command::Delete { id } => {
            let deleted = deps.service.delete_job(*id).await?;
            info!(id, deleted, "Delete finished");
            json!({ "id": id, "deleted": deleted })
        }
    };

    serde_json::to_writer_pretty(&mut *out, &result).map_err(std::io::Error::from)?;
    writeln!(out)?;
    Ok(())
}

/// Log a failed command with as much progress detail as the error carries.
pub fn log_failure(err: &IndexingError) {
    match err {
        IndexingError::PipelineError(PipelineError::StoreWrite {
            phase,
            phases_completed,
            source,
        }) => error!(
            phase = %phase,
            phases_completed,
            error = %source,
            "Ingestion failed while committing"
        ),
        IndexingError::PipelineError(PipelineError::RebuildFailed {
            chunks_sent,
            documents_indexed,
            source,
        }) => error!(
            chunks_sent,
            documents_indexed,
            error = %source,
            "Index rebuild failed"
        ),
        IndexingError::PipelineError(PipelineError::Interrupted {
            stage,
            batches_completed,
        }) => warn!(
            stage = %stage,
            batches_completed,
            "Interrupted, completed batches were kept"
        ),
        other => error!(error = %other, "Command failed"),
    }
}
