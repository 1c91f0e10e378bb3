//! MongoDB connection management and facade operations.
//!
//! This module provides:
//! - `ConnectionManager`: client lifecycle and the shared instance
//! - `Store`: the facade over a manager and an optional default model
//! - `ops`: facade operations (documents, aggregation, raw)
//! - `types`: shared option and error types

pub mod manager;
pub mod ops;
pub mod store;
pub mod types;

pub use manager::ConnectionManager;
pub use store::Store;
pub use types::{AggregatePipelineError, QueryOptions};
