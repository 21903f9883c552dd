//! Store error types.
//!
//! This module defines the error types that can occur during relational
//! store operations.

use thiserror::Error;

/// Errors that can occur during relational store operations.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The database rejected or failed a statement.
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    /// No job exists with the given id.
    #[error("Job {0} not found")]
    NotFound(i64),

    /// A unique constraint rejected the write.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The caller passed data the store cannot accept.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A stored row could not be turned back into a domain value.
    #[error("Decode error: {0}")]
    DecodeError(String),
}

impl StoreError {
    /// Create a not found error.
    pub fn not_found(id: i64) -> Self {
        Self::NotFound(id)
    }

    /// Create a conflict error.
    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    /// Create an invalid input error.
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a decode error.
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::DecodeError(msg.into())
    }

    /// Classify a sqlx error, turning unique violations into [`StoreError::Conflict`].
    pub fn from_write(err: sqlx::Error, what: &str) -> Self {
        match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                Self::conflict(format!("{} already exists", what))
            }
            sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
                Self::invalid_input(format!("{} references a missing row", what))
            }
            _ => Self::DatabaseError(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(StoreError::not_found(7).to_string(), "Job 7 not found");
        assert_eq!(
            StoreError::conflict("job (Engineer, Acme) already exists").to_string(),
            "Conflict: job (Engineer, Acme) already exists"
        );
    }

    #[test]
    fn test_from_write_passes_through_other_errors() {
        let err = StoreError::from_write(sqlx::Error::RowNotFound, "job");
        assert!(matches!(err, StoreError::DatabaseError(sqlx::Error::RowNotFound)));
    }
}
