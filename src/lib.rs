//! A thin facade over the official MongoDB driver.
//!
//! - [`ConnectionManager`]: connect, disconnect, reconnect, shared process-wide instance
//! - [`Store`]: CRUD, upsert, existence checks, batch insert and aggregation on a default
//!   [`Model`], plus raw queries against any collection
//! - [`ConnectionConfig`]: defaults, `MONGODB_*` environment overrides, JSON persistence
//!
//! Every operation forwards to the driver, logs failures through `log`, and returns the
//! driver's error unchanged inside [`Error::Mongo`].

pub mod config;
pub mod connection;
pub mod error;
pub mod helpers;
pub mod models;

pub use config::ConnectionConfig;
pub use connection::{AggregatePipelineError, ConnectionManager, QueryOptions, Store};
pub use error::{Error, Result};
pub use models::Model;
pub use mongodb::bson;
