//! Role domain model.
//!
//! A [`Role`] owns an ordered, duplicate-free list of canonical permission
//! strings. Two query families coexist on it:
//!
//! - [`Role::has_permission`] and friends do exact string membership.
//!   `grade:manage` does **not** satisfy `grade:read` here.
//! - [`Role::grants`] applies [`Permission::matches`], so `manage` and
//!   global grants cover narrower requirements.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::error::UnknownSystemRole;
use crate::id::{Clock, IdGenerator, RandomIdGenerator, SystemClock};
use crate::models::permission::Permission;

/// Predefined role names. Any other string is a custom role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SystemRole {
    SuperAdmin,
    Admin,
    Teacher,
    Student,
    Parent,
}

impl SystemRole {
    pub const ALL: [SystemRole; 5] = [
        SystemRole::SuperAdmin,
        SystemRole::Admin,
        SystemRole::Teacher,
        SystemRole::Student,
        SystemRole::Parent,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SystemRole::SuperAdmin => "super_admin",
            SystemRole::Admin => "admin",
            SystemRole::Teacher => "teacher",
            SystemRole::Student => "student",
            SystemRole::Parent => "parent",
        }
    }
}

impl FromStr for SystemRole {
    type Err = UnknownSystemRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SystemRole::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| UnknownSystemRole(s.to_string()))
    }
}

impl fmt::Display for SystemRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fields required to create a new role.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateRole {
    pub name: String,
    pub display_name: String,
    pub description: Option<String>,
    pub permissions: Vec<String>,
    /// `None` creates a global (cross-tenant) role.
    pub tenant_id: Option<Uuid>,
}

/// Descriptive fields that can be changed on an existing role.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateRoleDetails {
    /// Blank values are ignored rather than clearing the display name.
    pub display_name: Option<String>,
    /// `Some(Some(val))` = set, `Some(None)` = clear, `None` = no change.
    /// A blank value also clears.
    pub description: Option<Option<String>>,
}

/// Persisted shape of a [`Role`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleRecord {
    pub id: Uuid,
    pub name: String,
    pub display_name: String,
    pub description: Option<String>,
    pub permissions: Vec<String>,
    pub tenant_id: Option<Uuid>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A named collection of permission strings assignable to users.
///
/// Mutators take `&mut self`; a single instance has a single writer.
/// Every mutator advances `updated_at`, even when the permission list is
/// left unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RoleRecord", into = "RoleRecord")]
pub struct Role {
    id: Uuid,
    name: String,
    display_name: String,
    description: Option<String>,
    permissions: Vec<String>,
    tenant_id: Option<Uuid>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Role {
    /// Creates an active role with a random id, stamped with the system time.
    pub fn create(input: CreateRole) -> Self {
        Self::create_with(input, &RandomIdGenerator, &SystemClock)
    }

    /// Creates an active role using the supplied id and time sources.
    ///
    /// The display name and description are trimmed; a blank description
    /// becomes `None`. Duplicate permissions keep their first occurrence.
    pub fn create_with(input: CreateRole, ids: &dyn IdGenerator, clock: &dyn Clock) -> Self {
        let now = clock.now();
        Self {
            id: ids.next_id(),
            name: input.name,
            display_name: input.display_name.trim().to_string(),
            description: normalize_description(input.description),
            permissions: dedupe(input.permissions),
            tenant_id: input.tenant_id,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Rebuilds a role from persisted state without validation or dedupe.
    pub fn reconstitute(record: RoleRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
            display_name: record.display_name,
            description: record.description,
            permissions: record.permissions,
            tenant_id: record.tenant_id,
            is_active: record.is_active,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }

    pub fn to_record(&self) -> RoleRecord {
        self.clone().into()
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// The stored permission strings, in insertion order.
    pub fn permissions(&self) -> &[String] {
        &self.permissions
    }

    pub fn tenant_id(&self) -> Option<Uuid> {
        self.tenant_id
    }

    /// A role without a tenant applies across all tenants.
    pub fn is_global(&self) -> bool {
        self.tenant_id.is_none()
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn system_role(&self) -> Option<SystemRole> {
        self.name.parse().ok()
    }

    pub fn is_system_role(&self) -> bool {
        self.system_role().is_some()
    }

    // -----------------------------------------------------------------------
    // Mutators
    //
    // Each mutator has a `*_with` form that stamps `updated_at` from the
    // given clock; the plain form uses the system clock.
    // -----------------------------------------------------------------------

    pub fn update_details(&mut self, input: UpdateRoleDetails) {
        self.update_details_with(input, &SystemClock);
    }

    pub fn update_details_with(&mut self, input: UpdateRoleDetails, clock: &dyn Clock) {
        if let Some(display_name) = input.display_name {
            let trimmed = display_name.trim();
            if !trimmed.is_empty() {
                self.display_name = trimmed.to_string();
            }
        }
        if let Some(description) = input.description {
            self.description = normalize_description(description);
        }
        self.touch(clock);
    }

    /// Appends `permission` unless the exact string is already present.
    pub fn add_permission(&mut self, permission: impl Into<String>) {
        self.add_permission_with(permission, &SystemClock);
    }

    pub fn add_permission_with(&mut self, permission: impl Into<String>, clock: &dyn Clock) {
        let permission = permission.into();
        if !self.permissions.contains(&permission) {
            self.permissions.push(permission);
        }
        self.touch(clock);
    }

    /// Removes the exact string `permission`; absent strings are ignored.
    pub fn remove_permission(&mut self, permission: &str) {
        self.remove_permission_with(permission, &SystemClock);
    }

    pub fn remove_permission_with(&mut self, permission: &str, clock: &dyn Clock) {
        if let Some(pos) = self.permissions.iter().position(|p| p == permission) {
            self.permissions.remove(pos);
        }
        self.touch(clock);
    }

    /// Replaces the whole permission list, dropping later duplicates.
    pub fn set_permissions<I, S>(&mut self, permissions: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.set_permissions_with(permissions, &SystemClock);
    }

    pub fn set_permissions_with<I, S>(&mut self, permissions: I, clock: &dyn Clock)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.permissions = dedupe(permissions.into_iter().map(Into::into));
        self.touch(clock);
    }

    pub fn activate(&mut self) {
        self.activate_with(&SystemClock);
    }

    pub fn activate_with(&mut self, clock: &dyn Clock) {
        self.is_active = true;
        self.touch(clock);
    }

    /// Deactivation keeps the permission list; callers decide whether an
    /// inactive role may authorize anything.
    pub fn deactivate(&mut self) {
        self.deactivate_with(&SystemClock);
    }

    pub fn deactivate_with(&mut self, clock: &dyn Clock) {
        self.is_active = false;
        self.touch(clock);
    }

    /// Strictly advances `updated_at`, by 1µs when `clock` has not moved
    /// past it.
    fn touch(&mut self, clock: &dyn Clock) {
        let now = clock.now();
        self.updated_at = if now > self.updated_at {
            now
        } else {
            self.updated_at + Duration::microseconds(1)
        };
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Exact string membership. Not wildcard or scope aware; see
    /// [`Role::grants`] for that.
    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.iter().any(|p| p == permission)
    }

    /// `true` if any of `permissions` is held exactly. Empty input is `false`.
    pub fn has_any_permission<I, S>(&self, permissions: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        permissions
            .into_iter()
            .any(|p| self.has_permission(p.as_ref()))
    }

    /// `true` if all of `permissions` are held exactly. Empty input is `true`.
    pub fn has_all_permissions<I, S>(&self, permissions: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        permissions
            .into_iter()
            .all(|p| self.has_permission(p.as_ref()))
    }

    /// Wildcard and scope aware check of `required` against every stored
    /// permission. Stored strings that no longer parse are skipped.
    pub fn grants(&self, required: &Permission) -> bool {
        self.permissions.iter().any(|stored| match Permission::parse(stored) {
            Ok(granted) => granted.matches(required),
            Err(e) => {
                warn!(
                    role_id = %self.id,
                    permission = %stored,
                    error = %e,
                    "Skipping unparseable stored permission"
                );
                false
            }
        })
    }
}

impl From<RoleRecord> for Role {
    fn from(record: RoleRecord) -> Self {
        Role::reconstitute(record)
    }
}

impl From<Role> for RoleRecord {
    fn from(role: Role) -> Self {
        RoleRecord {
            id: role.id,
            name: role.name,
            display_name: role.display_name,
            description: role.description,
            permissions: role.permissions,
            tenant_id: role.tenant_id,
            is_active: role.is_active,
            created_at: role.created_at,
            updated_at: role.updated_at,
        }
    }
}

fn normalize_description(description: Option<String>) -> Option<String> {
    description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
}

fn dedupe(permissions: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut seen = HashSet::new();
    permissions
        .into_iter()
        .filter(|p| seen.insert(p.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::{FixedClock, SequentialIdGenerator};
    use crate::models::permission::{Action, Resource};

    fn epoch() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    fn role_with(permissions: &[&str]) -> Role {
        Role::create(CreateRole {
            name: "editor".into(),
            display_name: "Editor".into(),
            permissions: permissions.iter().map(|p| p.to_string()).collect(),
            ..Default::default()
        })
    }

    #[test]
    fn create_normalizes_input() {
        let ids = SequentialIdGenerator::new();
        let role = Role::create_with(
            CreateRole {
                name: "teacher".into(),
                display_name: "  Class Teacher \n".into(),
                description: Some("   ".into()),
                permissions: vec!["grade:read".into(), "grade:read".into(), "class:read".into()],
                tenant_id: None,
            },
            &ids,
            &FixedClock(epoch()),
        );

        assert_eq!(role.id(), Uuid::from_u128(1));
        assert_eq!(role.display_name(), "Class Teacher");
        assert_eq!(role.description(), None);
        assert_eq!(role.permissions(), ["grade:read", "class:read"]);
        assert!(role.is_active());
        assert!(role.is_global());
        assert_eq!(role.created_at(), epoch());
        assert_eq!(role.updated_at(), epoch());
    }

    #[test]
    fn create_keeps_tenant_and_trims_description() {
        let tenant = Uuid::new_v4();
        let role = Role::create(CreateRole {
            name: "custom".into(),
            display_name: "Custom".into(),
            description: Some("  Reads reports  ".into()),
            tenant_id: Some(tenant),
            ..Default::default()
        });
        assert_eq!(role.tenant_id(), Some(tenant));
        assert!(!role.is_global());
        assert_eq!(role.description(), Some("Reads reports"));
    }

    #[test]
    fn reconstitute_is_verbatim() {
        let record = RoleRecord {
            id: Uuid::from_u128(7),
            name: "legacy".into(),
            display_name: " Legacy ".into(),
            description: Some(String::new()),
            permissions: vec!["x".into(), "x".into()],
            tenant_id: None,
            is_active: false,
            created_at: epoch(),
            updated_at: epoch() + Duration::hours(1),
        };
        let role = Role::reconstitute(record.clone());
        assert_eq!(role.to_record(), record);
    }

    #[test]
    fn add_permission_is_idempotent() {
        let mut role = role_with(&[]);
        role.add_permission("grade:read");
        role.add_permission("grade:read");
        assert_eq!(role.permissions(), ["grade:read"]);
    }

    #[test]
    fn add_permission_accepts_typed_permission() {
        let mut role = role_with(&[]);
        role.add_permission(Permission::scoped(Resource::Grade, Action::Update, "class_1"));
        assert!(role.has_permission("grade:update:class_1"));
    }

    #[test]
    fn remove_missing_permission_is_noop() {
        let mut role = role_with(&["grade:read", "class:read"]);
        role.remove_permission("user:delete");
        assert_eq!(role.permissions(), ["grade:read", "class:read"]);

        role.remove_permission("grade:read");
        assert_eq!(role.permissions(), ["class:read"]);
    }

    #[test]
    fn set_permissions_replaces_and_dedupes() {
        let mut role = role_with(&["grade:read"]);
        let list = vec!["user:read", "class:manage", "user:read"];
        role.set_permissions(list.clone());
        assert_eq!(role.permissions(), ["user:read", "class:manage"]);

        let stored: HashSet<&str> = role.permissions().iter().map(String::as_str).collect();
        let expected: HashSet<&str> = list.into_iter().collect();
        assert_eq!(stored, expected);
    }

    #[test]
    fn returned_permissions_are_a_snapshot() {
        let role = role_with(&["grade:read"]);
        let mut copy = role.permissions().to_vec();
        copy.push("user:delete".into());
        copy.clear();
        assert_eq!(role.permissions(), ["grade:read"]);
    }

    #[test]
    fn empty_any_and_all() {
        for role in [role_with(&[]), role_with(&["grade:read", "user:manage"])] {
            assert!(role.has_all_permissions(Vec::<&str>::new()));
            assert!(!role.has_any_permission(Vec::<&str>::new()));
        }
    }

    #[test]
    fn any_and_all_use_exact_membership() {
        let role = role_with(&["grade:read", "class:read"]);
        assert!(role.has_any_permission(["user:read", "class:read"]));
        assert!(!role.has_any_permission(["user:read", "grade:update"]));
        assert!(role.has_all_permissions(["grade:read", "class:read"]));
        assert!(!role.has_all_permissions(["grade:read", "user:read"]));
    }

    #[test]
    fn teacher_exact_and_wildcard_semantics_coexist() {
        let role = Role::create(CreateRole {
            name: "teacher".into(),
            display_name: "Teacher".into(),
            permissions: vec!["grade:manage".into()],
            ..Default::default()
        });

        assert!(role.has_permission("grade:manage"));
        assert!(!role.has_permission("grade:read"));

        let manage = Permission::parse("grade:manage").unwrap();
        let read = Permission::parse("grade:read").unwrap();
        assert!(manage.matches(&read));
        assert!(role.grants(&read));
    }

    #[test]
    fn grants_honours_scope_and_skips_garbage() {
        let role = Role::reconstitute(RoleRecord {
            id: Uuid::from_u128(1),
            name: "grader".into(),
            display_name: "Grader".into(),
            description: None,
            permissions: vec!["not a permission".into(), "grade:update:class_123".into()],
            tenant_id: None,
            is_active: true,
            created_at: epoch(),
            updated_at: epoch(),
        });

        assert!(role.grants(&Permission::parse("grade:update:class_123").unwrap()));
        assert!(!role.grants(&Permission::parse("grade:update:class_456").unwrap()));
        assert!(!role.grants(&Permission::parse("grade:delete:class_123").unwrap()));
    }

    #[test]
    fn update_details_scenario() {
        let mut role = Role::create(CreateRole {
            name: "admin".into(),
            display_name: "Admin".into(),
            ..Default::default()
        });
        let created = role.updated_at();

        role.update_details(UpdateRoleDetails {
            description: Some(Some("x".into())),
            ..Default::default()
        });
        let first = role.updated_at();
        assert_eq!(role.description(), Some("x"));
        assert!(first > created);

        role.update_details(UpdateRoleDetails::default());
        assert_eq!(role.description(), Some("x"));
        assert_eq!(role.display_name(), "Admin");
        assert!(role.updated_at() > first);
    }

    #[test]
    fn update_details_ignores_blank_display_name_and_clears_description() {
        let mut role = Role::create(CreateRole {
            name: "admin".into(),
            display_name: "Admin".into(),
            description: Some("keep?".into()),
            ..Default::default()
        });

        role.update_details(UpdateRoleDetails {
            display_name: Some("   ".into()),
            description: Some(None),
        });
        assert_eq!(role.display_name(), "Admin");
        assert_eq!(role.description(), None);

        role.update_details(UpdateRoleDetails {
            display_name: Some(" School Admin ".into()),
            description: Some(Some("  ".into())),
        });
        assert_eq!(role.display_name(), "School Admin");
        assert_eq!(role.description(), None);
    }

    #[test]
    fn deactivated_role_still_answers_queries() {
        let mut role = role_with(&["grade:read"]);
        role.deactivate();
        assert!(!role.is_active());
        assert!(role.has_permission("grade:read"));
        assert!(role.grants(&Permission::parse("grade:read").unwrap()));

        role.activate();
        assert!(role.is_active());
    }

    #[test]
    fn every_mutator_advances_updated_at() {
        let clock = FixedClock(epoch());
        let mut role = Role::create_with(
            CreateRole {
                name: "r".into(),
                display_name: "R".into(),
                ..Default::default()
            },
            &RandomIdGenerator,
            &clock,
        );
        assert_eq!(role.updated_at(), epoch());

        let steps: Vec<Box<dyn Fn(&mut Role)>> = vec![
            Box::new(|r: &mut Role| r.add_permission_with("user:read", &clock)),
            Box::new(|r: &mut Role| r.add_permission_with("user:read", &clock)),
            Box::new(|r: &mut Role| r.remove_permission_with("nope", &clock)),
            Box::new(|r: &mut Role| r.set_permissions_with(["class:read"], &clock)),
            Box::new(|r: &mut Role| r.deactivate_with(&clock)),
            Box::new(|r: &mut Role| r.activate_with(&clock)),
            Box::new(|r: &mut Role| {
                r.update_details_with(UpdateRoleDetails::default(), &clock)
            }),
        ];
        for (i, step) in steps.iter().enumerate() {
            step(&mut role);
            let expected = epoch() + Duration::microseconds(i as i64 + 1);
            assert_eq!(role.updated_at(), expected);
        }
        assert_eq!(role.created_at(), epoch());
    }

    #[test]
    fn mutator_takes_time_from_injected_clock() {
        let mut role = Role::create_with(
            CreateRole {
                name: "r".into(),
                display_name: "R".into(),
                ..Default::default()
            },
            &RandomIdGenerator,
            &FixedClock(epoch()),
        );

        let later = epoch() + Duration::hours(2);
        role.add_permission_with("grade:read", &FixedClock(later));
        assert_eq!(role.updated_at(), later);

        // A clock behind the stored stamp never moves it backwards.
        role.deactivate_with(&FixedClock(epoch()));
        assert_eq!(role.updated_at(), later + Duration::microseconds(1));
    }

    #[test]
    fn plain_mutators_use_system_clock() {
        let before = Utc::now();
        let mut role = Role::create_with(
            CreateRole {
                name: "r".into(),
                display_name: "R".into(),
                ..Default::default()
            },
            &RandomIdGenerator,
            &FixedClock(epoch()),
        );
        role.activate();
        assert!(role.updated_at() >= before);
    }

    #[test]
    fn system_role_names() {
        for system in SystemRole::ALL {
            let role = Role::create(CreateRole {
                name: system.as_str().into(),
                display_name: system.to_string(),
                ..Default::default()
            });
            assert_eq!(role.system_role(), Some(system));
        }
        assert!(!role_with(&[]).is_system_role());
    }

    #[test]
    fn system_role_from_str() {
        assert_eq!("teacher".parse::<SystemRole>(), Ok(SystemRole::Teacher));
        assert_eq!("super_admin".parse::<SystemRole>(), Ok(SystemRole::SuperAdmin));

        let err = "janitor".parse::<SystemRole>().unwrap_err();
        assert_eq!(err, UnknownSystemRole("janitor".into()));
        assert_eq!(err.to_string(), "unknown system role: 'janitor'");
        assert!("Teacher".parse::<SystemRole>().is_err());
    }

    #[test]
    fn serde_round_trips_through_record_shape() {
        let role = role_with(&["grade:read", "report:read:term_1"]);
        let json = serde_json::to_value(&role).unwrap();
        assert_eq!(json["name"], "editor");
        assert_eq!(json["permissions"][1], "report:read:term_1");
        assert!(json["tenant_id"].is_null());

        let back: Role = serde_json::from_value(json).unwrap();
        assert_eq!(back, role);
    }
}
