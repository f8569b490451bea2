//! Permission domain model.
//!
//! A permission is a `(resource, action, scope?)` triple with the canonical
//! textual form `resource:action` or `resource:action:scope`. The scope is
//! an opaque token (e.g. a class id); when absent the permission is global
//! for that resource and action.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PermissionError;

/// The entity type a permission applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resource {
    User,
    Role,
    Student,
    Teacher,
    Class,
    Subject,
    Assignment,
    Grade,
    Attendance,
    Schedule,
    Announcement,
    Report,
    System,
}

impl Resource {
    pub const ALL: [Resource; 13] = [
        Resource::User,
        Resource::Role,
        Resource::Student,
        Resource::Teacher,
        Resource::Class,
        Resource::Subject,
        Resource::Assignment,
        Resource::Grade,
        Resource::Attendance,
        Resource::Schedule,
        Resource::Announcement,
        Resource::Report,
        Resource::System,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Resource::User => "user",
            Resource::Role => "role",
            Resource::Student => "student",
            Resource::Teacher => "teacher",
            Resource::Class => "class",
            Resource::Subject => "subject",
            Resource::Assignment => "assignment",
            Resource::Grade => "grade",
            Resource::Attendance => "attendance",
            Resource::Schedule => "schedule",
            Resource::Announcement => "announcement",
            Resource::Report => "report",
            Resource::System => "system",
        }
    }
}

impl FromStr for Resource {
    type Err = PermissionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Resource::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| PermissionError::InvalidResource(s.to_string()))
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The operation category of a permission.
///
/// [`Action::Manage`] is a super-action: a granted `manage` covers every
/// action on the same resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Create,
    Read,
    Update,
    Delete,
    Manage,
}

impl Action {
    pub const ALL: [Action; 5] = [
        Action::Create,
        Action::Read,
        Action::Update,
        Action::Delete,
        Action::Manage,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Create => "create",
            Action::Read => "read",
            Action::Update => "update",
            Action::Delete => "delete",
            Action::Manage => "manage",
        }
    }
}

impl FromStr for Action {
    type Err = PermissionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Action::ALL
            .into_iter()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| PermissionError::InvalidAction(s.to_string()))
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single grantable capability.
///
/// Equality is structural: a scoped permission never equals its global
/// counterpart. Use [`Permission::matches`] to ask whether a granted
/// permission satisfies a required one.
///
/// Serializes as its canonical string and deserializes by parsing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Permission {
    resource: Resource,
    action: Action,
    scope: Option<String>,
}

impl Permission {
    /// Builds a permission from already-typed components.
    pub fn new(resource: Resource, action: Action, scope: Option<String>) -> Self {
        Self {
            resource,
            action,
            scope,
        }
    }

    pub fn global(resource: Resource, action: Action) -> Self {
        Self::new(resource, action, None)
    }

    pub fn scoped(resource: Resource, action: Action, scope: impl Into<String>) -> Self {
        Self::new(resource, action, Some(scope.into()))
    }

    /// Parses `resource:action` or `resource:action:scope`.
    ///
    /// The part count is checked before the resource, and the resource
    /// before the action. The scope segment is taken verbatim.
    pub fn parse(s: &str) -> Result<Self, PermissionError> {
        let parts: Vec<&str> = s.split(':').collect();
        if !(2..=3).contains(&parts.len()) {
            return Err(PermissionError::InvalidFormat(s.to_string()));
        }

        let resource = parts[0].parse::<Resource>()?;
        let action = parts[1].parse::<Action>()?;
        let scope = parts.get(2).map(|scope| scope.to_string());

        Ok(Self::new(resource, action, scope))
    }

    pub fn resource(&self) -> Resource {
        self.resource
    }

    pub fn action(&self) -> Action {
        self.action
    }

    pub fn scope(&self) -> Option<&str> {
        self.scope.as_deref()
    }

    pub fn is_global(&self) -> bool {
        self.scope.is_none()
    }

    /// Returns `true` if holding `self` satisfies the `required` permission.
    ///
    /// - Resources must be equal.
    /// - A granted `manage` covers any action; otherwise actions must be equal.
    /// - A scoped requirement is met by a global grant or a grant with the
    ///   same scope. An unscoped requirement is met regardless of the
    ///   granted scope.
    pub fn matches(&self, required: &Permission) -> bool {
        if self.resource != required.resource {
            return false;
        }

        if self.action != Action::Manage && self.action != required.action {
            return false;
        }

        match (&self.scope, &required.scope) {
            (_, None) => true,
            (None, Some(_)) => true,
            (Some(granted), Some(wanted)) => granted == wanted,
        }
    }

    /// Alias of [`Permission::matches`].
    pub fn implies(&self, required: &Permission) -> bool {
        self.matches(required)
    }
}

impl FromStr for Permission {
    type Err = PermissionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Permission {
    type Error = PermissionError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<Permission> for String {
    fn from(p: Permission) -> Self {
        p.to_string()
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.resource, self.action)?;
        if let Some(scope) = &self.scope {
            write!(f, ":{scope}")?;
        }
        Ok(())
    }
}
