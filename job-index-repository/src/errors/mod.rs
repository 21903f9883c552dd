//! Error types for the job index repository.

mod search_error;

pub use search_error::SearchError;
