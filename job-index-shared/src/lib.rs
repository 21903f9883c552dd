//! # Job Index Shared
//!
//! Domain types shared by the job index crates: the relational entities
//! (skills, jobs and the edges between them), the denormalized search
//! document, and the logical search request/response pair.

mod document;
mod industry;
mod job;
mod query;

pub use document::{JobDocument, SkillRef};
pub use industry::{Industry, ParseIndustryError};
pub use job::{Job, JobKey, JobSkillEdge, JobWithSkills, NewJob, Skill};
pub use query::{JobPage, JobSearchRequest, SortOrder, DEFAULT_PAGE_SIZE};
