use async_trait::async_trait;
use scholaris_core::{AppResult, UserId};
use scholaris_domain::{RoleAssignment, RoleAssignmentId, UserAccount};

use crate::PageQuery;

/// Filters for user listings.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UserListQuery {
    /// Case-insensitive match on name or email.
    pub search: Option<String>,
    /// Pagination window.
    pub page: PageQuery,
}

/// Repository port for user accounts and their role assignments.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Lists users with their assignments, ordered by display name.
    async fn list_users(&self, query: UserListQuery) -> AppResult<Vec<UserAccount>>;

    /// Finds one user with assignments.
    async fn find_user(&self, user_id: UserId) -> AppResult<Option<UserAccount>>;

    /// Flips the active flag, returning `false` when the user does not exist.
    async fn set_user_active(&self, user_id: UserId, is_active: bool) -> AppResult<bool>;

    /// Inserts an assignment; an identical active assignment is a conflict.
    async fn insert_role_assignment(&self, assignment: &RoleAssignment) -> AppResult<()>;

    /// Finds one assignment.
    async fn find_role_assignment(
        &self,
        assignment_id: RoleAssignmentId,
    ) -> AppResult<Option<RoleAssignment>>;

    /// Deletes an assignment, returning `false` when it does not exist.
    async fn delete_role_assignment(&self, assignment_id: RoleAssignmentId) -> AppResult<bool>;
}
