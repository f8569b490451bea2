//! SurrealDB repository implementations.

mod role;

pub use role::SurrealRoleRepository;
