//! SurrealDB implementation of [`RoleRepository`].

use campus_core::error::CampusResult;
use campus_core::models::role::{Role, RoleRecord};
use campus_core::repository::{PaginatedResult, Pagination, RoleRepository};
use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;
use crate::schema::GLOBAL_SCOPE_KEY;

/// Unique index on `(scope_key, name)`.
const SCOPE_NAME_INDEX: &str = "idx_role_scope_name";

#[derive(Debug, SurrealValue)]
struct RoleRow {
    record_id: String,
    name: String,
    display_name: String,
    description: Option<String>,
    permissions: Vec<String>,
    tenant_id: Option<String>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl RoleRow {
    fn try_into_role(self) -> Result<Role, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::CorruptRecord(format!("invalid role UUID: {e}")))?;
        let tenant_id = self
            .tenant_id
            .map(|t| Uuid::parse_str(&t))
            .transpose()
            .map_err(|e| DbError::CorruptRecord(format!("invalid tenant UUID: {e}")))?;

        Ok(Role::reconstitute(RoleRecord {
            id,
            name: self.name,
            display_name: self.display_name,
            description: self.description,
            permissions: self.permissions,
            tenant_id,
            is_active: self.is_active,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }))
    }
}

#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

/// Value of the `scope_key` column for a tenant, or for the global roles.
fn scope_key(tenant_id: Option<Uuid>) -> String {
    tenant_id.map_or_else(|| GLOBAL_SCOPE_KEY.to_string(), |t| t.to_string())
}

/// Maps a rejected write on the name index to [`DbError::Duplicate`].
fn write_error(err: surrealdb::Error) -> DbError {
    let detail = err.to_string();
    if detail.contains(SCOPE_NAME_INDEX) {
        DbError::Duplicate {
            entity: "role".into(),
            detail,
        }
    } else {
        DbError::Surreal(err)
    }
}

/// SurrealDB implementation of the Role repository.
#[derive(Clone)]
pub struct SurrealRoleRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealRoleRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> RoleRepository for SurrealRoleRepository<C> {
    async fn save(&self, role: &Role) -> CampusResult<()> {
        let record = role.to_record();

        let result = self
            .db
            .query(
                "UPSERT type::record('role', $id) SET \
                 name = $name, display_name = $display_name, \
                 description = $description, permissions = $permissions, \
                 tenant_id = $tenant_id, scope_key = $scope_key, \
                 is_active = $is_active, \
                 created_at = $created_at, updated_at = $updated_at",
            )
            .bind(("id", record.id.to_string()))
            .bind(("name", record.name))
            .bind(("display_name", record.display_name))
            .bind(("description", record.description))
            .bind(("permissions", record.permissions))
            .bind(("tenant_id", record.tenant_id.map(|t| t.to_string())))
            .bind(("scope_key", scope_key(record.tenant_id)))
            .bind(("is_active", record.is_active))
            .bind(("created_at", record.created_at))
            .bind(("updated_at", record.updated_at))
            .await
            .map_err(write_error)?;

        result.check().map_err(write_error)?;

        Ok(())
    }

    async fn get_by_id(&self, id: Uuid) -> CampusResult<Role> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT meta::id(id) AS record_id, * FROM type::record('role', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<RoleRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "role".into(),
            id: id_str,
        })?;

        Ok(row.try_into_role()?)
    }

    async fn get_by_name(&self, tenant_id: Option<Uuid>, name: &str) -> CampusResult<Role> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM role \
                 WHERE scope_key = $scope_key AND name = $name LIMIT 1",
            )
            .bind(("scope_key", scope_key(tenant_id)))
            .bind(("name", name.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<RoleRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "role".into(),
            id: format!("name={name}"),
        })?;

        Ok(row.try_into_role()?)
    }

    async fn delete(&self, id: Uuid) -> CampusResult<()> {
        let result = self
            .db
            .query("DELETE type::record('role', $id)")
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?;

        result.check().map_err(DbError::from)?;

        Ok(())
    }

    async fn list(
        &self,
        tenant_id: Option<Uuid>,
        pagination: Pagination,
    ) -> CampusResult<PaginatedResult<Role>> {
        let key = scope_key(tenant_id);

        let mut count_result = self
            .db
            .query("SELECT count() AS total FROM role WHERE scope_key = $scope_key GROUP ALL")
            .bind(("scope_key", key.clone()))
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM role \
                 WHERE scope_key = $scope_key \
                 ORDER BY created_at ASC \
                 LIMIT $limit START $offset",
            )
            .bind(("scope_key", key))
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<RoleRow> = result.take(0).map_err(DbError::from)?;

        let items = rows
            .into_iter()
            .map(|row| row.try_into_role())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }
}
