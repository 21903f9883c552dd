//! SQLite implementation of [`JobStore`].

use std::collections::{BTreeSet, HashMap};
use std::str::FromStr;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{QueryBuilder, Row, Sqlite, Transaction};
use tracing::{debug, info, instrument};

use super::schema::bootstrap;
use crate::errors::StoreError;
use crate::interfaces::JobStore;
use crate::types::{JobUpdate, StoreCounts};
use job_index_shared::{Industry, Job, JobSkillEdge, JobWithSkills, NewJob, Skill};

/// Default database location.
pub const DEFAULT_DATABASE_URL: &str = "sqlite://jobs.db";

/// Default number of pooled connections.
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// SQLite refuses statements with more bound parameters than this.
const MAX_BIND_PARAMS: usize = 32_766;

const JOB_COLUMNS: &str = "id, title, company, location, experience_level, salary, industry";

/// Connection settings for [`SqliteJobStore`].
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// sqlx connection URL, e.g. `sqlite://jobs.db` or `sqlite::memory:`.
    pub database_url: String,
    pub max_connections: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
        }
    }
}

impl StoreConfig {
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            ..Self::default()
        }
    }

    /// A private in-memory database. Every connection to `sqlite::memory:`
    /// opens a fresh database, so the pool is held to one connection.
    pub fn in_memory() -> Self {
        Self {
            database_url: "sqlite::memory:".to_string(),
            max_connections: 1,
        }
    }

    fn is_in_memory(&self) -> bool {
        self.database_url.contains(":memory:")
    }
}

/// Relational store backed by a SQLite connection pool.
#[derive(Clone)]
pub struct SqliteJobStore {
    pool: SqlitePool,
}

impl SqliteJobStore {
    /// Open the database, creating the file if needed, and bootstrap the schema.
    pub async fn connect(config: &StoreConfig) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(&config.database_url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let mut pool_options = SqlitePoolOptions::new().max_connections(config.max_connections);
        if config.is_in_memory() {
            // Closing the only connection would drop the database.
            pool_options = pool_options.idle_timeout(None).max_lifetime(None);
        }

        let pool = pool_options.connect_with(options).await?;
        bootstrap(&pool).await?;

        info!(database_url = %config.database_url, "Relational store connected");
        Ok(Self { pool })
    }

    /// Open a bootstrapped in-memory store.
    pub async fn in_memory() -> Result<Self, StoreError> {
        Self::connect(&StoreConfig::in_memory()).await
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn skills_for_job(
        tx: &mut Transaction<'_, Sqlite>,
        job_id: i64,
    ) -> Result<Vec<Skill>, StoreError> {
        let rows = sqlx::query(
            "SELECT s.id, s.name FROM job_skill js JOIN skill s ON s.id = js.skill_id WHERE js.job_id = ? ORDER BY s.id",
        )
        .bind(job_id)
        .fetch_all(&mut **tx)
        .await?;

        rows.iter().map(skill_from_row).collect()
    }

    async fn load_job(
        tx: &mut Transaction<'_, Sqlite>,
        id: i64,
    ) -> Result<Option<JobWithSkills>, StoreError> {
        let row = sqlx::query(&format!("SELECT {} FROM job WHERE id = ?", JOB_COLUMNS))
            .bind(id)
            .fetch_optional(&mut **tx)
            .await?;

        let job = match row {
            Some(row) => job_from_row(&row)?,
            None => return Ok(None),
        };
        let skills = Self::skills_for_job(tx, id).await?;

        Ok(Some(JobWithSkills { job, skills }))
    }

    async fn link_skills(
        tx: &mut Transaction<'_, Sqlite>,
        job_id: i64,
        skill_ids: &[i64],
    ) -> Result<(), StoreError> {
        let unique: BTreeSet<i64> = skill_ids.iter().copied().collect();
        if unique.is_empty() {
            return Ok(());
        }

        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new("INSERT INTO job_skill (job_id, skill_id) ");
        builder.push_values(unique, |mut row, skill_id| {
            row.push_bind(job_id).push_bind(skill_id);
        });
        builder.push(" ON CONFLICT DO NOTHING");

        builder
            .build()
            .execute(&mut **tx)
            .await
            .map_err(|e| StoreError::from_write(e, "job skill"))?;
        Ok(())
    }
}

fn skill_from_row(row: &SqliteRow) -> Result<Skill, StoreError> {
    Ok(Skill {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
    })
}

fn job_from_row(row: &SqliteRow) -> Result<Job, StoreError> {
    let industry: String = row.try_get("industry")?;
    let industry = Industry::from_str(&industry).map_err(|e| StoreError::decode(e.to_string()))?;

    Ok(Job {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        company: row.try_get("company")?,
        location: row.try_get("location")?,
        experience_level: row.try_get("experience_level")?,
        salary: row.try_get("salary")?,
        industry,
    })
}

#[async_trait]
impl JobStore for SqliteJobStore {
    async fn insert_skills(&self, names: &[String]) -> Result<u64, StoreError> {
        let mut inserted = 0;

        for chunk in names.chunks(MAX_BIND_PARAMS) {
            let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new("INSERT INTO skill (name) ");
            builder.push_values(chunk, |mut row, name| {
                row.push_bind(name.as_str());
            });
            builder.push(" ON CONFLICT DO NOTHING");

            inserted += builder.build().execute(&self.pool).await?.rows_affected();
        }

        debug!(submitted = names.len(), inserted = inserted, "Inserted skills");
        Ok(inserted)
    }

    async fn find_skills(&self) -> Result<Vec<Skill>, StoreError> {
        let rows = sqlx::query("SELECT id, name FROM skill ORDER BY id")
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(skill_from_row).collect()
    }

    async fn insert_jobs(&self, jobs: &[NewJob]) -> Result<u64, StoreError> {
        let mut inserted = 0;

        for chunk in jobs.chunks(MAX_BIND_PARAMS / 6) {
            let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
                "INSERT INTO job (title, company, location, experience_level, salary, industry) ",
            );
            builder.push_values(chunk, |mut row, job| {
                row.push_bind(job.title.as_str())
                    .push_bind(job.company.as_str())
                    .push_bind(job.location.as_str())
                    .push_bind(job.experience_level.as_str())
                    .push_bind(job.salary)
                    .push_bind(job.industry.as_str());
            });
            builder.push(" ON CONFLICT (title, company) DO NOTHING");

            inserted += builder.build().execute(&self.pool).await?.rows_affected();
        }

        debug!(submitted = jobs.len(), inserted = inserted, "Inserted jobs");
        Ok(inserted)
    }

    async fn find_jobs(&self) -> Result<Vec<Job>, StoreError> {
        let rows = sqlx::query(&format!("SELECT {} FROM job ORDER BY id", JOB_COLUMNS))
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(job_from_row).collect()
    }

    async fn insert_job_skills(&self, edges: &[JobSkillEdge]) -> Result<u64, StoreError> {
        let mut inserted = 0;

        for chunk in edges.chunks(MAX_BIND_PARAMS / 2) {
            let mut builder: QueryBuilder<Sqlite> =
                QueryBuilder::new("INSERT INTO job_skill (job_id, skill_id) ");
            builder.push_values(chunk, |mut row, edge| {
                row.push_bind(edge.job_id).push_bind(edge.skill_id);
            });
            builder.push(" ON CONFLICT DO NOTHING");

            inserted += builder
                .build()
                .execute(&self.pool)
                .await
                .map_err(|e| StoreError::from_write(e, "job skill"))?
                .rows_affected();
        }

        debug!(submitted = edges.len(), inserted = inserted, "Inserted job skills");
        Ok(inserted)
    }

    #[instrument(skip(self))]
    async fn find_jobs_with_skills(
        &self,
        after_id: i64,
        limit: usize,
    ) -> Result<Vec<JobWithSkills>, StoreError> {
        let limit = i64::try_from(limit).map_err(|_| StoreError::invalid_input("limit too large"))?;

        let job_rows = sqlx::query(&format!(
            "SELECT {} FROM job WHERE id > ? ORDER BY id LIMIT ?",
            JOB_COLUMNS
        ))
        .bind(after_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        let jobs = job_rows
            .iter()
            .map(job_from_row)
            .collect::<Result<Vec<_>, _>>()?;

        let last_id = match jobs.last() {
            Some(job) => job.id,
            None => return Ok(Vec::new()),
        };

        let skill_rows = sqlx::query(
            "SELECT js.job_id, s.id, s.name FROM job_skill js JOIN skill s ON s.id = js.skill_id \
             WHERE js.job_id > ? AND js.job_id <= ? ORDER BY js.job_id, s.id",
        )
        .bind(after_id)
        .bind(last_id)
        .fetch_all(&self.pool)
        .await?;

        let mut skills_by_job: HashMap<i64, Vec<Skill>> = HashMap::new();
        for row in &skill_rows {
            let job_id: i64 = row.try_get("job_id")?;
            skills_by_job
                .entry(job_id)
                .or_default()
                .push(skill_from_row(row)?);
        }

        Ok(jobs
            .into_iter()
            .map(|job| {
                let skills = skills_by_job.remove(&job.id).unwrap_or_default();
                JobWithSkills { job, skills }
            })
            .collect())
    }

    async fn find_job(&self, id: i64) -> Result<Option<JobWithSkills>, StoreError> {
        let mut tx = self.pool.begin().await?;
        let record = Self::load_job(&mut tx, id).await?;
        tx.commit().await?;
        Ok(record)
    }

    #[instrument(skip(self, job), fields(title = %job.title, company = %job.company))]
    async fn create_job(&self, job: &NewJob, skill_ids: &[i64]) -> Result<JobWithSkills, StoreError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "INSERT INTO job (title, company, location, experience_level, salary, industry) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&job.title)
        .bind(&job.company)
        .bind(&job.location)
        .bind(&job.experience_level)
        .bind(job.salary)
        .bind(job.industry.as_str())
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            StoreError::from_write(e, &format!("job ({}, {})", job.title, job.company))
        })?;

        let id = result.last_insert_rowid();
        Self::link_skills(&mut tx, id, skill_ids).await?;

        let record = Self::load_job(&mut tx, id)
            .await?
            .ok_or_else(|| StoreError::not_found(id))?;
        tx.commit().await?;

        info!(id = id, "Job created");
        Ok(record)
    }

    #[instrument(skip(self, update), fields(id = update.id))]
    async fn update_job(&self, update: &JobUpdate) -> Result<JobWithSkills, StoreError> {
        let mut tx = self.pool.begin().await?;

        let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM job WHERE id = ?")
            .bind(update.id)
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_none() {
            return Err(StoreError::not_found(update.id));
        }

        if update.has_field_changes() {
            let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE job SET ");
            {
                let mut set = builder.separated(", ");
                if let Some(title) = &update.title {
                    set.push("title = ").push_bind_unseparated(title.as_str());
                }
                if let Some(company) = &update.company {
                    set.push("company = ").push_bind_unseparated(company.as_str());
                }
                if let Some(location) = &update.location {
                    set.push("location = ").push_bind_unseparated(location.as_str());
                }
                if let Some(level) = &update.experience_level {
                    set.push("experience_level = ").push_bind_unseparated(level.as_str());
                }
                if let Some(salary) = update.salary {
                    set.push("salary = ").push_bind_unseparated(salary);
                }
                if let Some(industry) = update.industry {
                    set.push("industry = ").push_bind_unseparated(industry.as_str());
                }
            }
            builder.push(" WHERE id = ").push_bind(update.id);

            builder
                .build()
                .execute(&mut *tx)
                .await
                .map_err(|e| StoreError::from_write(e, "job (title, company)"))?;
        }

        if let Some(skill_ids) = &update.skill_ids {
            sqlx::query("DELETE FROM job_skill WHERE job_id = ?")
                .bind(update.id)
                .execute(&mut *tx)
                .await?;
            Self::link_skills(&mut tx, update.id, skill_ids).await?;
        }

        let record = Self::load_job(&mut tx, update.id)
            .await?
            .ok_or_else(|| StoreError::not_found(update.id))?;
        tx.commit().await?;

        info!("Job updated");
        Ok(record)
    }

    #[instrument(skip(self))]
    async fn delete_job(&self, id: i64) -> Result<bool, StoreError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM job_skill WHERE job_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let deleted = sqlx::query("DELETE FROM job WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        tx.commit().await?;

        debug!(deleted = deleted, "Job delete finished");
        Ok(deleted > 0)
    }

    async fn counts(&self) -> Result<StoreCounts, StoreError> {
        let skills: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM skill")
            .fetch_one(&self.pool)
            .await?;
        let jobs: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM job")
            .fetch_one(&self.pool)
            .await?;
        let job_skills: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM job_skill")
            .fetch_one(&self.pool)
            .await?;

        Ok(StoreCounts {
            skills: skills.max(0) as u64,
            jobs: jobs.max(0) as u64,
            job_skills: job_skills.max(0) as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_job(title: &str, company: &str, location: &str) -> NewJob {
        NewJob {
            title: title.to_string(),
            company: company.to_string(),
            location: location.to_string(),
            experience_level: "Mid".to_string(),
            salary: 50_000,
            industry: Industry::Software,
        }
    }

    fn names(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    async fn seeded_store() -> (SqliteJobStore, HashMap<String, i64>) {
        let store = SqliteJobStore::in_memory().await.unwrap();
        store.insert_skills(&names(&["Go", "SQL", "Rust"])).await.unwrap();
        let skills = store
            .find_skills()
            .await
            .unwrap()
            .into_iter()
            .map(|s| (s.name, s.id))
            .collect();
        (store, skills)
    }

    #[tokio::test]
    async fn test_insert_skills_skips_existing() {
        let store = SqliteJobStore::in_memory().await.unwrap();

        assert_eq!(store.insert_skills(&names(&["Go", "SQL"])).await.unwrap(), 2);
        assert_eq!(store.insert_skills(&names(&["SQL", "Rust"])).await.unwrap(), 1);
        assert_eq!(store.insert_skills(&[]).await.unwrap(), 0);

        let skills = store.find_skills().await.unwrap();
        let found: Vec<&str> = skills.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(found, vec!["Go", "SQL", "Rust"]);
    }

    #[tokio::test]
    async fn test_skill_names_are_case_sensitive() {
        let store = SqliteJobStore::in_memory().await.unwrap();

        store.insert_skills(&names(&["sql", "SQL"])).await.unwrap();

        assert_eq!(store.counts().await.unwrap().skills, 2);
    }

    #[tokio::test]
    async fn test_insert_jobs_keeps_first_row() {
        let store = SqliteJobStore::in_memory().await.unwrap();

        store.insert_jobs(&[new_job("Engineer", "Acme", "Berlin")]).await.unwrap();
        let inserted = store
            .insert_jobs(&[
                new_job("Engineer", "Acme", "Paris"),
                new_job("Engineer", "Globex", "Rome"),
            ])
            .await
            .unwrap();

        assert_eq!(inserted, 1);

        let jobs = store.find_jobs().await.unwrap();
        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[0].location, "Berlin");
        assert_eq!(jobs[1].company, "Globex");
    }

    #[tokio::test]
    async fn test_insert_job_skills_skips_existing() {
        let (store, skills) = seeded_store().await;
        store.insert_jobs(&[new_job("Engineer", "Acme", "Berlin")]).await.unwrap();
        let job_id = store.find_jobs().await.unwrap()[0].id;

        let edge = JobSkillEdge { job_id, skill_id: skills["Go"] };
        assert_eq!(store.insert_job_skills(&[edge, edge]).await.unwrap(), 1);
        assert_eq!(store.insert_job_skills(&[edge]).await.unwrap(), 0);
        assert_eq!(store.counts().await.unwrap().job_skills, 1);
    }

    #[tokio::test]
    async fn test_find_jobs_with_skills_pages_by_id() {
        let (store, skills) = seeded_store().await;
        store
            .insert_jobs(&[
                new_job("A", "Acme", ""),
                new_job("B", "Acme", ""),
                new_job("C", "Acme", ""),
            ])
            .await
            .unwrap();
        let jobs = store.find_jobs().await.unwrap();
        store
            .insert_job_skills(&[
                JobSkillEdge { job_id: jobs[0].id, skill_id: skills["Go"] },
                JobSkillEdge { job_id: jobs[2].id, skill_id: skills["SQL"] },
                JobSkillEdge { job_id: jobs[2].id, skill_id: skills["Rust"] },
            ])
            .await
            .unwrap();

        let first = store.find_jobs_with_skills(0, 2).await.unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(first[0].skill_names(), vec!["Go"]);
        assert!(first[1].skills.is_empty());

        let second = store.find_jobs_with_skills(first[1].job.id, 2).await.unwrap();
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].job.title, "C");
        assert_eq!(second[0].skill_names(), vec!["SQL", "Rust"]);

        let done = store.find_jobs_with_skills(second[0].job.id, 2).await.unwrap();
        assert!(done.is_empty());
    }

    #[tokio::test]
    async fn test_create_job_links_skills() {
        let (store, skills) = seeded_store().await;

        let record = store
            .create_job(&new_job("Engineer", "Acme", "Berlin"), &[skills["Go"], skills["Go"]])
            .await
            .unwrap();

        assert!(record.job.id > 0);
        assert_eq!(record.skill_names(), vec!["Go"]);
        assert_eq!(store.find_job(record.job.id).await.unwrap(), Some(record));
    }

    #[tokio::test]
    async fn test_create_job_conflict() {
        let store = SqliteJobStore::in_memory().await.unwrap();
        store.create_job(&new_job("Engineer", "Acme", ""), &[]).await.unwrap();

        let result = store.create_job(&new_job("Engineer", "Acme", "Oslo"), &[]).await;

        assert!(matches!(result, Err(StoreError::Conflict(_))));
        assert_eq!(store.counts().await.unwrap().jobs, 1);
    }

    #[tokio::test]
    async fn test_create_job_with_unknown_skill_is_rolled_back() {
        let store = SqliteJobStore::in_memory().await.unwrap();

        let result = store.create_job(&new_job("Engineer", "Acme", ""), &[999]).await;

        assert!(matches!(result, Err(StoreError::InvalidInput(_))));
        assert_eq!(store.counts().await.unwrap().jobs, 0);
    }

    #[tokio::test]
    async fn test_update_job_fields_and_skills() {
        let (store, skills) = seeded_store().await;
        let created = store
            .create_job(&new_job("Engineer", "Acme", "Berlin"), &[skills["Go"]])
            .await
            .unwrap();

        let update = JobUpdate::new(created.job.id)
            .with_title("Senior Engineer")
            .with_salary(90_000)
            .with_skills(vec![skills["SQL"], skills["Rust"]]);
        let updated = store.update_job(&update).await.unwrap();

        assert_eq!(updated.job.title, "Senior Engineer");
        assert_eq!(updated.job.salary, 90_000);
        assert_eq!(updated.job.location, "Berlin");
        assert_eq!(updated.skill_names(), vec!["SQL", "Rust"]);
    }

    #[tokio::test]
    async fn test_update_without_skills_keeps_edges() {
        let (store, skills) = seeded_store().await;
        let created = store
            .create_job(&new_job("Engineer", "Acme", ""), &[skills["Go"]])
            .await
            .unwrap();

        let updated = store
            .update_job(&JobUpdate::new(created.job.id).with_salary(1))
            .await
            .unwrap();

        assert_eq!(updated.skill_names(), vec!["Go"]);
    }

    #[tokio::test]
    async fn test_update_missing_job() {
        let store = SqliteJobStore::in_memory().await.unwrap();

        let result = store.update_job(&JobUpdate::new(42).with_salary(1)).await;

        assert!(matches!(result, Err(StoreError::NotFound(42))));
    }

    #[tokio::test]
    async fn test_delete_job_removes_edges() {
        let (store, skills) = seeded_store().await;
        let created = store
            .create_job(&new_job("Engineer", "Acme", ""), &[skills["Go"], skills["SQL"]])
            .await
            .unwrap();

        assert!(store.delete_job(created.job.id).await.unwrap());
        assert!(!store.delete_job(created.job.id).await.unwrap());

        let counts = store.counts().await.unwrap();
        assert_eq!(counts.jobs, 0);
        assert_eq!(counts.job_skills, 0);
        assert_eq!(counts.skills, 3);
        assert!(store.find_job(created.job.id).await.unwrap().is_none());
    }
}
