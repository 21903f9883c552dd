//! Schema bootstrap for the relational store.
//!
//! Tables are created with `CREATE TABLE IF NOT EXISTS`, so bootstrapping an
//! existing database is a no-op. There is no migration support.

use sqlx::SqlitePool;
use tracing::info;

use crate::errors::StoreError;

const CREATE_SKILL: &str = r#"
CREATE TABLE IF NOT EXISTS skill (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE
)
"#;

const CREATE_JOB: &str = r#"
CREATE TABLE IF NOT EXISTS job (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    company TEXT NOT NULL,
    location TEXT NOT NULL DEFAULT '',
    experience_level TEXT NOT NULL DEFAULT '',
    salary INTEGER NOT NULL DEFAULT 0,
    industry TEXT NOT NULL,
    UNIQUE (title, company)
)
"#;

const CREATE_JOB_SKILL: &str = r#"
CREATE TABLE IF NOT EXISTS job_skill (
    job_id INTEGER NOT NULL REFERENCES job (id) ON DELETE CASCADE,
    skill_id INTEGER NOT NULL REFERENCES skill (id) ON DELETE CASCADE,
    PRIMARY KEY (job_id, skill_id)
)
"#;

const CREATE_JOB_SKILL_SKILL_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS job_skill_skill_id ON job_skill (skill_id)";

/// Create the skill, job and job_skill tables if they are missing.
pub async fn bootstrap(pool: &SqlitePool) -> Result<(), StoreError> {
    for statement in [
        CREATE_SKILL,
        CREATE_JOB,
        CREATE_JOB_SKILL,
        CREATE_JOB_SKILL_SKILL_INDEX,
    ] {
        sqlx::query(statement).execute(pool).await?;
    }

    info!("Relational schema ready");
    Ok(())
}
