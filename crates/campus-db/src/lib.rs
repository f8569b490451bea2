//! Campus IAM database layer: SurrealDB connection management and the
//! [`RoleRepository`](campus_core::repository::RoleRepository)
//! implementation.
//!
//! This crate provides:
//! - Connection management ([`DbManager`], [`DbConfig`])
//! - Schema initialization and migrations ([`run_migrations`])
//! - Error types ([`DbError`])
//! - [`repository::SurrealRoleRepository`]

mod connection;
mod error;
pub mod repository;
mod schema;

pub use connection::{DbConfig, DbManager};
pub use error::DbError;
pub use schema::{GLOBAL_SCOPE_KEY, run_migrations, schema_v1};
