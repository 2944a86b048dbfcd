//! User administration: activation and role assignments.

use std::sync::Arc;

use scholaris_core::{AppError, AppResult, Credential, FieldErrors, UserId};
use scholaris_domain::{
    AuditAction, RoleAssignment, RoleAssignmentId, RoleKind, RoleScope, UserAccount, ViewPath,
};
use serde::Deserialize;
use validator::Validate;

use crate::validation::{finish_fields, trimmed_optional};
use crate::{
    AccessRequirement, ActionEnvelope, ActionOutcome, AuditDraft, Completed, InputSchema,
    JournalRepository, PageQuery, UserListQuery, UserRepository,
};

/// Listing request for user accounts.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ListUsersRequest {
    /// Case-insensitive match on display name or email.
    #[validate(length(max = 255, message = "search must not exceed 255 characters"))]
    pub search: Option<String>,
    /// Page size.
    #[validate(range(min = 1, max = 200, message = "limit must be between 1 and 200"))]
    pub limit: Option<u32>,
    /// Rows skipped.
    pub offset: Option<u32>,
}

impl InputSchema for ListUsersRequest {
    type Valid = UserListQuery;

    fn into_valid(self) -> AppResult<Self::Valid> {
        Ok(UserListQuery {
            search: trimmed_optional(self.search).map(|search| search.to_lowercase()),
            page: PageQuery::from_parts(self.limit, self.offset),
        })
    }
}

/// Request enabling or disabling an account.
#[derive(Debug, Clone, Copy, Deserialize, Validate)]
pub struct SetUserActiveRequest {
    /// Target user.
    pub user_id: UserId,
    /// Desired state.
    pub is_active: bool,
}

impl InputSchema for SetUserActiveRequest {
    type Valid = Self;

    fn into_valid(self) -> AppResult<Self::Valid> {
        Ok(self)
    }
}

/// Request granting a role in a scope.
#[derive(Debug, Clone, Copy, Deserialize, Validate)]
pub struct AssignRoleRequest {
    /// Target user.
    pub user_id: UserId,
    /// Granted role.
    pub role: RoleKind,
    /// Scope, e.g. `{"kind": "journal", "id": "..."}`.
    pub scope: RoleScope,
}

impl InputSchema for AssignRoleRequest {
    type Valid = Self;

    fn into_valid(self) -> AppResult<Self::Valid> {
        let mut errors = FieldErrors::default();
        if self.role == RoleKind::SuperAdmin && self.scope != RoleScope::Global {
            errors.push("scope", "super_admin can only be granted globally");
        }
        finish_fields(errors)?;
        Ok(self)
    }
}

/// Request removing one role assignment.
#[derive(Debug, Clone, Copy, Deserialize, Validate)]
pub struct RevokeRoleRequest {
    /// Assignment to remove.
    pub assignment_id: RoleAssignmentId,
}

impl InputSchema for RevokeRoleRequest {
    type Valid = RoleAssignmentId;

    fn into_valid(self) -> AppResult<Self::Valid> {
        Ok(self.assignment_id)
    }
}

fn user_not_found(user_id: UserId) -> AppError {
    AppError::NotFound(format!("user '{user_id}' was not found"))
}

/// Super-admin user management.
#[derive(Clone)]
pub struct UserService {
    envelope: ActionEnvelope,
    users: Arc<dyn UserRepository>,
    journals: Arc<dyn JournalRepository>,
}

impl UserService {
    /// Creates the service.
    #[must_use]
    pub fn new(
        envelope: ActionEnvelope,
        users: Arc<dyn UserRepository>,
        journals: Arc<dyn JournalRepository>,
    ) -> Self {
        Self {
            envelope,
            users,
            journals,
        }
    }

    /// Lists user accounts with their role assignments.
    pub async fn list_users(
        &self,
        credential: Option<&Credential>,
        request: ListUsersRequest,
    ) -> ActionOutcome<Vec<UserAccount>> {
        self.envelope
            .run(
                credential,
                request,
                |_| AccessRequirement::super_admin(),
                |_, query| self.list_users_impl(query),
            )
            .await
    }

    /// Activates or deactivates an account; callers cannot deactivate themselves.
    pub async fn set_user_active(
        &self,
        credential: Option<&Credential>,
        request: SetUserActiveRequest,
    ) -> ActionOutcome<UserAccount> {
        self.envelope
            .run(
                credential,
                request,
                |_| AccessRequirement::super_admin(),
                |actor, request| self.set_user_active_impl(actor.user_id(), request),
            )
            .await
    }

    /// Grants a role in a global, tenant or journal scope.
    pub async fn assign_role(
        &self,
        credential: Option<&Credential>,
        request: AssignRoleRequest,
    ) -> ActionOutcome<RoleAssignment> {
        self.envelope
            .run(
                credential,
                request,
                |_| AccessRequirement::super_admin(),
                |_, request| self.assign_role_impl(request),
            )
            .await
    }

    /// Removes a role assignment; callers cannot drop their own super admin grant.
    pub async fn revoke_role(
        &self,
        credential: Option<&Credential>,
        request: RevokeRoleRequest,
    ) -> ActionOutcome<RoleAssignmentId> {
        self.envelope
            .run(
                credential,
                request,
                |_| AccessRequirement::super_admin(),
                |actor, assignment_id| self.revoke_role_impl(actor.user_id(), assignment_id),
            )
            .await
    }

    async fn find_user(&self, user_id: UserId) -> AppResult<UserAccount> {
        self.users
            .find_user(user_id)
            .await?
            .ok_or_else(|| user_not_found(user_id))
    }

    async fn list_users_impl(&self, query: UserListQuery) -> AppResult<Completed<Vec<UserAccount>>> {
        let users = self.users.list_users(query).await?;
        Ok(Completed::read(users))
    }

    async fn set_user_active_impl(
        &self,
        actor_id: UserId,
        request: SetUserActiveRequest,
    ) -> AppResult<Completed<UserAccount>> {
        if request.user_id == actor_id && !request.is_active {
            return Err(AppError::Conflict(
                "you cannot deactivate your own account".to_owned(),
            ));
        }

        let mut user = self.find_user(request.user_id).await?;
        if user.is_active == request.is_active {
            return Ok(Completed::read(user));
        }

        if !self
            .users
            .set_user_active(request.user_id, request.is_active)
            .await?
        {
            return Err(user_not_found(request.user_id));
        }
        user.is_active = request.is_active;

        let action = if user.is_active {
            AuditAction::UserActivated
        } else {
            AuditAction::UserDeactivated
        };
        let audit = AuditDraft::new(action, "user", user.user_id);
        Ok(Completed::changed(user, audit).invalidating([ViewPath::admin_users()]))
    }

    async fn assign_role_impl(
        &self,
        request: AssignRoleRequest,
    ) -> AppResult<Completed<RoleAssignment>> {
        self.find_user(request.user_id).await?;
        match request.scope {
            RoleScope::Global => {}
            RoleScope::Tenant(tenant_id) => {
                if !self.journals.tenant_exists(tenant_id).await? {
                    return Err(AppError::NotFound(format!(
                        "tenant '{tenant_id}' was not found"
                    )));
                }
            }
            RoleScope::Journal(journal_id) => {
                if self.journals.find_journal(journal_id).await?.is_none() {
                    return Err(AppError::NotFound(format!(
                        "journal '{journal_id}' was not found"
                    )));
                }
            }
        }

        let assignment = RoleAssignment {
            assignment_id: RoleAssignmentId::new(),
            user_id: request.user_id,
            role: request.role,
            scope: request.scope,
            is_active: true,
        };
        self.users.insert_role_assignment(&assignment).await?;

        let audit = AuditDraft::new(AuditAction::UserRoleAssigned, "user", assignment.user_id)
            .with_details(serde_json::json!({
                "assignment_id": assignment.assignment_id,
                "role": assignment.role.as_str(),
                "scope": assignment.scope.kind_str(),
                "scope_id": assignment.scope.scope_uuid(),
            }));
        Ok(Completed::changed(assignment, audit).invalidating([ViewPath::admin_users()]))
    }

    async fn revoke_role_impl(
        &self,
        actor_id: UserId,
        assignment_id: RoleAssignmentId,
    ) -> AppResult<Completed<RoleAssignmentId>> {
        let assignment = self
            .users
            .find_role_assignment(assignment_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("role assignment '{assignment_id}' was not found"))
            })?;
        if assignment.user_id == actor_id && assignment.is_global_super_admin() {
            return Err(AppError::Conflict(
                "you cannot revoke your own super admin role".to_owned(),
            ));
        }

        if !self.users.delete_role_assignment(assignment_id).await? {
            return Err(AppError::NotFound(format!(
                "role assignment '{assignment_id}' was not found"
            )));
        }

        let audit = AuditDraft::new(AuditAction::UserRoleRevoked, "user", assignment.user_id)
            .with_details(serde_json::json!({
                "assignment_id": assignment_id,
                "role": assignment.role.as_str(),
                "scope": assignment.scope.kind_str(),
            }));
        Ok(Completed::changed(assignment_id, audit).invalidating([ViewPath::admin_users()]))
    }
}
