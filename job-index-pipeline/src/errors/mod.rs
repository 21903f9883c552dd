//! Error types for the pipeline.

mod pipeline_error;

pub use pipeline_error::{PipelineError, RowParseError};
