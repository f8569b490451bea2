//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async. A `tenant_id` of `None` addresses
//! global (cross-tenant) roles.

use uuid::Uuid;

use crate::error::CampusResult;
use crate::models::role::Role;

/// Pagination parameters for list queries.
#[derive(Debug, Clone)]
pub struct Pagination {
    pub offset: u64,
    pub limit: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: 50,
        }
    }
}

/// A paginated result set.
#[derive(Debug, Clone)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub offset: u64,
    pub limit: u64,
}

/// Load/save contract for [`Role`] aggregates.
///
/// Implementations persist the fields of [`Role::to_record`] and rebuild
/// roles with [`Role::reconstitute`], so no validation happens on load.
pub trait RoleRepository: Send + Sync {
    /// Insert or replace the role stored under `role.id()`. Last write wins.
    fn save(&self, role: &Role) -> impl Future<Output = CampusResult<()>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = CampusResult<Role>> + Send;
    fn get_by_name(
        &self,
        tenant_id: Option<Uuid>,
        name: &str,
    ) -> impl Future<Output = CampusResult<Role>> + Send;
    fn delete(&self, id: Uuid) -> impl Future<Output = CampusResult<()>> + Send;
    /// Roles of one tenant, or the global roles when `tenant_id` is `None`,
    /// oldest first.
    fn list(
        &self,
        tenant_id: Option<Uuid>,
        pagination: Pagination,
    ) -> impl Future<Output = CampusResult<PaginatedResult<Role>>> + Send;
}
