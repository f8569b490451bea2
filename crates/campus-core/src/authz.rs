//! Authorization check across an actor's resolved roles.
//!
//! Role resolution (direct assignment, group membership, tenant filtering)
//! happens outside this crate. Given the resolved roles, the actor is
//! authorized iff at least one role satisfies the required permission.

use tracing::debug;

use crate::config::{AuthzConfig, MatchMode};
use crate::error::{CampusError, CampusResult};
use crate::models::permission::Permission;
use crate::models::role::Role;

#[derive(Debug, Clone, Default)]
pub struct Authorizer {
    config: AuthzConfig,
}

impl Authorizer {
    pub fn new(config: AuthzConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AuthzConfig {
        &self.config
    }

    /// Returns the first role that satisfies `required`, if any.
    pub fn deciding_role<'a>(&self, roles: &'a [Role], required: &Permission) -> Option<&'a Role> {
        let required_str = required.to_string();
        roles
            .iter()
            .filter(|role| role.is_active() || self.config.include_inactive_roles)
            .find(|role| match self.config.match_mode {
                MatchMode::Exact => role.has_permission(&required_str),
                MatchMode::Implied => role.grants(required),
            })
    }

    pub fn is_authorized(&self, roles: &[Role], required: &Permission) -> bool {
        match self.deciding_role(roles, required) {
            Some(role) => {
                debug!(
                    permission = %required,
                    role_id = %role.id(),
                    role = role.name(),
                    "Access granted"
                );
                true
            }
            None => {
                debug!(
                    permission = %required,
                    roles = roles.len(),
                    mode = ?self.config.match_mode,
                    "Access denied"
                );
                false
            }
        }
    }

    /// Like [`Authorizer::is_authorized`], but a deny becomes
    /// [`CampusError::AuthorizationDenied`].
    pub fn authorize(&self, roles: &[Role], required: &Permission) -> CampusResult<()> {
        if self.is_authorized(roles, required) {
            Ok(())
        } else {
            Err(CampusError::AuthorizationDenied {
                reason: format!("missing permission {required}"),
            })
        }
    }

    /// Parses `required` and authorizes it. A malformed string surfaces as
    /// [`CampusError::InvalidPermission`].
    pub fn authorize_str(&self, roles: &[Role], required: &str) -> CampusResult<()> {
        let required = Permission::parse(required)?;
        self.authorize(roles, &required)
    }
}
