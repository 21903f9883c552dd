//! Error types for the relational store.

mod store_error;

pub use store_error::StoreError;
