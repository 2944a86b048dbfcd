use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use scholaris_application::{UserListQuery, UserRepository};
use scholaris_core::{AppError, AppResult, UserId};
use scholaris_domain::{EmailAddress, RoleAssignment, RoleAssignmentId, UserAccount};

use crate::postgres_authorization_repository::RoleAssignmentRow;

/// PostgreSQL-backed repository for user accounts and role assignments.
#[derive(Clone)]
pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn assignments_for(
        &self,
        user_ids: &[uuid::Uuid],
    ) -> AppResult<HashMap<UserId, Vec<RoleAssignment>>> {
        let rows = sqlx::query_as::<_, RoleAssignmentRow>(
            r#"
            SELECT id AS assignment_id, user_id, role, scope_kind, scope_id, is_active
            FROM role_assignments
            WHERE user_id = ANY($1)
            ORDER BY created_at
            "#,
        )
        .bind(user_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load role assignments: {error}")))?;

        let mut by_user: HashMap<UserId, Vec<RoleAssignment>> = HashMap::new();
        for row in rows {
            let assignment = RoleAssignment::try_from(row)?;
            by_user
                .entry(assignment.user_id)
                .or_default()
                .push(assignment);
        }

        Ok(by_user)
    }

    async fn with_roles(&self, rows: Vec<UserRow>) -> AppResult<Vec<UserAccount>> {
        let user_ids: Vec<uuid::Uuid> = rows.iter().map(|row| row.id).collect();
        let mut assignments = self.assignments_for(&user_ids).await?;

        rows.into_iter()
            .map(|row| {
                let roles = assignments
                    .remove(&UserId::from_uuid(row.id))
                    .unwrap_or_default();
                row.into_account(roles)
            })
            .collect()
    }
}

#[derive(Debug, FromRow)]
struct UserRow {
    id: uuid::Uuid,
    display_name: String,
    email: String,
    is_active: bool,
    created_at: DateTime<Utc>,
}

impl UserRow {
    fn into_account(self, roles: Vec<RoleAssignment>) -> AppResult<UserAccount> {
        let email = EmailAddress::new(self.email).map_err(|error| {
            AppError::Internal(format!(
                "failed to decode email of user '{}': {error}",
                self.id
            ))
        })?;

        Ok(UserAccount {
            user_id: UserId::from_uuid(self.id),
            display_name: self.display_name,
            email,
            is_active: self.is_active,
            roles,
            created_at: self.created_at,
        })
    }
}

fn duplicate_role_or_internal(error: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(ref database_error) = error
        && database_error.code().as_deref() == Some("23505")
    {
        return AppError::Conflict("the user already holds this role in this scope".to_owned());
    }

    AppError::Internal(format!("failed to insert role assignment: {error}"))
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn list_users(&self, query: UserListQuery) -> AppResult<Vec<UserAccount>> {
        let pattern = query.search.map(|search| {
            let escaped = search
                .replace('\\', "\\\\")
                .replace('%', "\\%")
                .replace('_', "\\_");
            format!("%{escaped}%")
        });
        let rows = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, display_name, email, is_active, created_at
            FROM users
            WHERE $1::TEXT IS NULL
                OR display_name ILIKE $1
                OR email ILIKE $1
            ORDER BY display_name, email
            LIMIT $2
            OFFSET $3
            "#,
        )
        .bind(pattern)
        .bind(i64::from(query.page.limit))
        .bind(i64::from(query.page.offset))
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list users: {error}")))?;

        self.with_roles(rows).await
    }

    async fn find_user(&self, user_id: UserId) -> AppResult<Option<UserAccount>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, display_name, email, is_active, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find user: {error}")))?;

        let Some(row) = row else {
            return Ok(None);
        };
        Ok(self.with_roles(vec![row]).await?.into_iter().next())
    }

    async fn set_user_active(&self, user_id: UserId, is_active: bool) -> AppResult<bool> {
        let result = sqlx::query("UPDATE users SET is_active = $2 WHERE id = $1")
            .bind(user_id.as_uuid())
            .bind(is_active)
            .execute(&self.pool)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to update user active flag: {error}"))
            })?;

        Ok(result.rows_affected() > 0)
    }

    async fn insert_role_assignment(&self, assignment: &RoleAssignment) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO role_assignments (id, user_id, role, scope_kind, scope_id, is_active)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(assignment.assignment_id.as_uuid())
        .bind(assignment.user_id.as_uuid())
        .bind(assignment.role.as_str())
        .bind(assignment.scope.kind_str())
        .bind(assignment.scope.scope_uuid())
        .bind(assignment.is_active)
        .execute(&self.pool)
        .await
        .map_err(duplicate_role_or_internal)?;

        Ok(())
    }

    async fn find_role_assignment(
        &self,
        assignment_id: RoleAssignmentId,
    ) -> AppResult<Option<RoleAssignment>> {
        let row = sqlx::query_as::<_, RoleAssignmentRow>(
            r#"
            SELECT id AS assignment_id, user_id, role, scope_kind, scope_id, is_active
            FROM role_assignments
            WHERE id = $1
            "#,
        )
        .bind(assignment_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to find role assignment: {error}"))
        })?;

        row.map(RoleAssignment::try_from).transpose()
    }

    async fn delete_role_assignment(&self, assignment_id: RoleAssignmentId) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM role_assignments WHERE id = $1")
            .bind(assignment_id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to delete role assignment: {error}"))
            })?;

        Ok(result.rows_affected() > 0)
    }
}
