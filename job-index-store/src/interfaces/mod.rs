//! Interface definitions for the relational store.

mod job_store;

pub use job_store::JobStore;
