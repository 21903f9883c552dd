//! Request and report types for store operations.

use job_index_shared::Industry;

/// Partial update of a job. `None` fields are left unchanged.
///
/// When `skill_ids` is present the job's edge set is replaced by it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobUpdate {
    pub id: i64,
    pub title: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub experience_level: Option<String>,
    pub salary: Option<i64>,
    pub industry: Option<Industry>,
    pub skill_ids: Option<Vec<i64>>,
}

impl JobUpdate {
    /// An update of the given job that changes nothing yet.
    pub fn new(id: i64) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_salary(mut self, salary: i64) -> Self {
        self.salary = Some(salary);
        self
    }

    pub fn with_skills(mut self, skill_ids: Vec<i64>) -> Self {
        self.skill_ids = Some(skill_ids);
        self
    }

    /// Whether any job column is touched.
    pub fn has_field_changes(&self) -> bool {
        self.title.is_some()
            || self.company.is_some()
            || self.location.is_some()
            || self.experience_level.is_some()
            || self.salary.is_some()
            || self.industry.is_some()
    }
}

/// Row counts of the three relational tables.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreCounts {
    pub skills: u64,
    pub jobs: u64,
    pub job_skills: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_update_has_no_field_changes() {
        let update = JobUpdate::new(1).with_skills(vec![2, 3]);
        assert!(!update.has_field_changes());
        assert!(JobUpdate::new(1).with_salary(10).has_field_changes());
    }
}
