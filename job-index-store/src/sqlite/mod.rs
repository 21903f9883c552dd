//! SQLite implementation of the relational store.

mod schema;
mod store;

pub use schema::bootstrap;
pub use store::{SqliteJobStore, StoreConfig};
