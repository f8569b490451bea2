//! Error types for the Campus IAM core.

use thiserror::Error;

/// Failure to parse a permission string.
///
/// These are caller bugs or bad input, never transient conditions, so
/// nothing in the core retries on them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PermissionError {
    /// Not `resource:action` or `resource:action:scope`.
    #[error("invalid permission format: '{0}' (expected resource:action[:scope])")]
    InvalidFormat(String),

    #[error("invalid permission resource: '{0}'")]
    InvalidResource(String),

    #[error("invalid permission action: '{0}'")]
    InvalidAction(String),
}

/// A role name that is not one of the predefined system roles.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown system role: '{0}'")]
pub struct UnknownSystemRole(pub String);

#[derive(Debug, Error)]
pub enum CampusError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Entity already exists: {entity}")]
    AlreadyExists { entity: String },

    #[error("Authorization denied: {reason}")]
    AuthorizationDenied { reason: String },

    #[error(transparent)]
    InvalidPermission(#[from] PermissionError),

    #[error("Database error: {0}")]
    Database(String),
}

pub type CampusResult<T> = Result<T, CampusError>;
