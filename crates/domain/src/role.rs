use std::str::FromStr;

use scholaris_core::{AppError, AppResult, JournalId, TenantId, UserId};
use serde::{Deserialize, Serialize};

record_identifier!(
    /// Identifier of one role assignment row.
    RoleAssignmentId
);

/// Roles recognised by editorial and administrative policy checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleKind {
    /// Cross-tenant administrator.
    SuperAdmin,
    /// Administrator of one tenant and its journals.
    TenantAdmin,
    /// Manages one journal's configuration.
    JournalManager,
    /// Runs the editorial workflow of a journal.
    Editor,
    /// Editor restricted to assigned sections.
    SectionEditor,
    /// Reviews submissions on invitation.
    Reviewer,
    /// Submits manuscripts.
    Author,
    /// Reads published content.
    Reader,
}

impl RoleKind {
    /// Returns a stable storage value for this role.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SuperAdmin => "super_admin",
            Self::TenantAdmin => "tenant_admin",
            Self::JournalManager => "journal_manager",
            Self::Editor => "editor",
            Self::SectionEditor => "section_editor",
            Self::Reviewer => "reviewer",
            Self::Author => "author",
            Self::Reader => "reader",
        }
    }

    /// Returns all known roles.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[RoleKind] = &[
            RoleKind::SuperAdmin,
            RoleKind::TenantAdmin,
            RoleKind::JournalManager,
            RoleKind::Editor,
            RoleKind::SectionEditor,
            RoleKind::Reviewer,
            RoleKind::Author,
            RoleKind::Reader,
        ];

        ALL
    }
}

impl FromStr for RoleKind {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|role| role.as_str() == value)
            .ok_or_else(|| AppError::Validation(format!("unknown role '{value}'")))
    }
}

/// Scope a role assignment applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum RoleScope {
    /// Applies everywhere.
    Global,
    /// Applies to one tenant and all its journals.
    Tenant(TenantId),
    /// Applies to one journal.
    Journal(JournalId),
}

impl RoleScope {
    /// Returns the storage discriminator.
    #[must_use]
    pub fn kind_str(&self) -> &'static str {
        match self {
            Self::Global => "global",
            Self::Tenant(_) => "tenant",
            Self::Journal(_) => "journal",
        }
    }

    /// Rebuilds a scope from its storage columns.
    pub fn from_storage(kind: &str, scope_id: Option<uuid::Uuid>) -> AppResult<Self> {
        match (kind, scope_id) {
            ("global", _) => Ok(Self::Global),
            ("tenant", Some(id)) => Ok(Self::Tenant(TenantId::from_uuid(id))),
            ("journal", Some(id)) => Ok(Self::Journal(JournalId::from_uuid(id))),
            _ => Err(AppError::Validation(format!(
                "invalid role scope '{kind}' (scope id present: {})",
                scope_id.is_some()
            ))),
        }
    }

    /// Returns the scope id column value, if the scope has one.
    #[must_use]
    pub fn scope_uuid(&self) -> Option<uuid::Uuid> {
        match self {
            Self::Global => None,
            Self::Tenant(tenant_id) => Some(tenant_id.as_uuid()),
            Self::Journal(journal_id) => Some(journal_id.as_uuid()),
        }
    }
}

/// Role held by a user in one scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleAssignment {
    /// Assignment identifier.
    pub assignment_id: RoleAssignmentId,
    /// User holding the role.
    pub user_id: UserId,
    /// Assigned role.
    pub role: RoleKind,
    /// Scope of the assignment.
    pub scope: RoleScope,
    /// Inactive assignments are retained but never grant access.
    pub is_active: bool,
}

impl RoleAssignment {
    /// Returns whether this assignment is a global super admin grant.
    #[must_use]
    pub fn is_global_super_admin(&self) -> bool {
        self.is_active && self.role == RoleKind::SuperAdmin && self.scope == RoleScope::Global
    }
}
