//! Denormalized search document for a job.

use serde::{Deserialize, Serialize};

use crate::{Industry, JobWithSkills};

/// A skill embedded inside a [`JobDocument`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillRef {
    pub skill_id: i64,
    pub name: String,
}

/// The document stored in the search index for one job.
///
/// This is a derived cache of the relational model: the job's own fields
/// plus its skill edges expanded inline. The document id in the index is the
/// job's surrogate id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobDocument {
    pub id: i64,
    pub title: String,
    pub company: String,
    pub location: String,
    pub experience_level: String,
    pub salary: i64,
    pub industry: Industry,
    pub skills: Vec<SkillRef>,
}

impl JobDocument {
    /// The identifier used for the document in the search index.
    pub fn document_id(&self) -> String {
        self.id.to_string()
    }
}

impl From<&JobWithSkills> for JobDocument {
    fn from(record: &JobWithSkills) -> Self {
        let job = &record.job;
        Self {
            id: job.id,
            title: job.title.clone(),
            company: job.company.clone(),
            location: job.location.clone(),
            experience_level: job.experience_level.clone(),
            salary: job.salary,
            industry: job.industry,
            skills: record
                .skills
                .iter()
                .map(|s| SkillRef {
                    skill_id: s.id,
                    name: s.name.clone(),
                })
                .collect(),
        }
    }
}
