//! Authorization configuration.

/// How a required permission is compared against a role's stored strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchMode {
    /// Exact string membership via [`Role::has_permission`](crate::models::role::Role::has_permission).
    #[default]
    Exact,
    /// Wildcard and scope aware via [`Role::grants`](crate::models::role::Role::grants).
    Implied,
}

/// Configuration for the [`Authorizer`](crate::authz::Authorizer).
#[derive(Debug, Clone, Default)]
pub struct AuthzConfig {
    pub match_mode: MatchMode,
    /// Let deactivated roles take part in decisions (default: false).
    pub include_inactive_roles: bool,
}
