//! Resman Database: SurrealDB connection management and repository
//! implementations.
//!
//! This crate provides:
//! - Connection management ([`DbManager`], [`DbConfig`])
//! - Schema initialization and migrations ([`run_migrations`])
//! - Repository implementations for the `resman-core` traits, bundled
//!   as [`SurrealStore`]
//! - Error types ([`DbError`])

mod connection;
mod error;
mod id;
mod password;
mod query;
pub mod repository;
mod schema;
mod store;

pub use connection::{DbConfig, DbManager};
pub use error::DbError;
pub use schema::{run_migrations, schema_v1, schema_v2};
pub use store::{StoreOptions, SurrealStore};
