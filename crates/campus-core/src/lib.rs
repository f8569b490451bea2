//! Campus IAM core: the permission model and the role aggregate.
//!
//! - [`Permission`] parses and validates `resource:action[:scope]` strings
//!   and decides whether a granted permission satisfies a required one.
//! - [`Role`] owns an ordered, duplicate-free set of permission strings and
//!   answers exact-membership queries.
//! - [`Authorizer`] ORs a required permission across an actor's roles.
//!
//! Persistence is abstracted behind [`repository::RoleRepository`]; the
//! SurrealDB implementation lives in `campus-db`.

pub mod authz;
pub mod config;
pub mod error;
pub mod id;
pub mod models;
pub mod repository;

pub use authz::Authorizer;
pub use config::{AuthzConfig, MatchMode};
pub use error::{CampusError, CampusResult, PermissionError, UnknownSystemRole};
pub use models::permission::{Action, Permission, Resource};
pub use models::role::{CreateRole, Role, RoleRecord, SystemRole, UpdateRoleDetails};
