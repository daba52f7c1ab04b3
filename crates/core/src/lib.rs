//! Shared types, error taxonomy, configuration, and external store
//! interfaces for the campus ads delivery pipeline.

pub mod config;
pub mod error;
pub mod store;
pub mod types;

pub use error::{AdServeError, AdServeResult, StoreError};
