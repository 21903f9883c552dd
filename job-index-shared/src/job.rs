//! Relational entities: skills, jobs and the edges between them.

use serde::{Deserialize, Serialize};

use crate::Industry;

/// A skill as committed to the relational store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Skill {
    /// Surrogate id assigned by the store.
    pub id: i64,
    /// Unique, case-sensitive skill name.
    pub name: String,
}

/// Business key used to recognize the same job across repeated input rows.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JobKey {
    pub title: String,
    pub company: String,
}

impl JobKey {
    pub fn new(title: impl Into<String>, company: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            company: company.into(),
        }
    }
}

/// A job that has not been committed yet, so it has no surrogate id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewJob {
    pub title: String,
    pub company: String,
    pub location: String,
    pub experience_level: String,
    pub salary: i64,
    pub industry: Industry,
}

impl NewJob {
    /// The `(title, company)` business key of this job.
    pub fn key(&self) -> JobKey {
        JobKey::new(self.title.clone(), self.company.clone())
    }
}

/// A job as committed to the relational store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: i64,
    pub title: String,
    pub company: String,
    pub location: String,
    pub experience_level: String,
    pub salary: i64,
    pub industry: Industry,
}

impl Job {
    pub fn key(&self) -> JobKey {
        JobKey::new(self.title.clone(), self.company.clone())
    }
}

/// Many-to-many edge between a job and a skill, identified by the id pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct JobSkillEdge {
    pub job_id: i64,
    pub skill_id: i64,
}

/// A job together with the skills its edges currently point at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobWithSkills {
    pub job: Job,
    pub skills: Vec<Skill>,
}

impl JobWithSkills {
    pub fn skill_names(&self) -> Vec<&str> {
        self.skills.iter().map(|s| s.name.as_str()).collect()
    }
}
