//! Linker module for the job index pipeline.
//!
//! Deduplicates skills and jobs out of normalized rows and records the
//! job-skill pairs each row asks for. Nothing here has surrogate ids yet;
//! edges are keyed by business keys and resolved after commit.

use std::collections::HashSet;

use tracing::{debug, instrument};

use crate::reader::NormalizedRow;
use job_index_shared::{JobKey, NewJob};

/// Split a `Required Skills` cell into trimmed, non-empty skill names.
pub fn split_skills(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',').map(str::trim).filter(|s| !s.is_empty())
}

/// A job-skill pair by business key, before id resolution.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CandidateEdge {
    pub job: JobKey,
    pub skill: String,
}

/// Everything the commit engine needs from one pass over the input.
#[derive(Debug, Clone, Default)]
pub struct LinkedEntities {
    /// Unique skill names in first-seen order.
    pub skills: Vec<String>,
    /// Unique jobs in first-seen order; the first row for a key wins.
    pub jobs: Vec<NewJob>,
    /// One edge per skill token per row, duplicates included.
    pub edges: Vec<CandidateEdge>,
    /// Rows consumed.
    pub rows: usize,
    /// Rows whose `(title, company)` had already been seen.
    pub duplicate_rows: usize,
}

/// Incremental deduplicator fed one row at a time.
#[derive(Debug, Default)]
pub struct EntityLinker {
    linked: LinkedEntities,
    seen_skills: HashSet<String>,
    seen_jobs: HashSet<JobKey>,
}

impl EntityLinker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one row into the running sets.
    ///
    /// A repeated job key does not replace the stored job, but the row's
    /// skills and edges still count.
    pub fn push(&mut self, row: NormalizedRow) {
        let key = row.job.key();
        self.linked.rows += 1;

        for skill in split_skills(&row.required_skills) {
            if self.seen_skills.insert(skill.to_string()) {
                self.linked.skills.push(skill.to_string());
            }
            self.linked.edges.push(CandidateEdge {
                job: key.clone(),
                skill: skill.to_string(),
            });
        }

        if self.seen_jobs.insert(key) {
            self.linked.jobs.push(row.job);
        } else {
            debug!(row = row.row, "Duplicate job row");
            self.linked.duplicate_rows += 1;
        }
    }

    pub fn finish(self) -> LinkedEntities {
        self.linked
    }
}

/// Link a complete set of rows.
#[instrument(skip(rows))]
pub fn link<I>(rows: I) -> LinkedEntities
where
    I: IntoIterator<Item = NormalizedRow>,
{
    let mut linker = EntityLinker::new();
    for row in rows {
        linker.push(row);
    }

    let linked = linker.finish();
    debug!(
        skills = linked.skills.len(),
        jobs = linked.jobs.len(),
        edges = linked.edges.len(),
        "Linked rows"
    );
    linked
}
