//! Configuration and dependency wiring for the job index binary.

mod dependencies;
mod settings;

pub use dependencies::Dependencies;
pub(crate) use settings::parse_batch_size;
pub use settings::{
    Settings, DEFAULT_BATCH_SIZE, DEFAULT_DATABASE_URL, DEFAULT_INDEX_NAME,
    DEFAULT_OPENSEARCH_URL,
};
