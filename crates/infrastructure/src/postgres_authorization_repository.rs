use std::str::FromStr;

use async_trait::async_trait;

use scholaris_application::{ActorResolver, RoleAssignmentRepository};
use scholaris_core::{Actor, AppError, AppResult, Credential, JournalId, TenantId, UserId};
use scholaris_domain::{RoleAssignment, RoleAssignmentId, RoleKind, RoleScope};

use sqlx::{FromRow, PgPool};

/// PostgreSQL-backed bearer token resolution and role lookups.
#[derive(Clone)]
pub struct PostgresAuthorizationRepository {
    pool: PgPool,
}

impl PostgresAuthorizationRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct ActorRow {
    user_id: uuid::Uuid,
    display_name: String,
    email: String,
}

#[derive(Debug, FromRow)]
pub(crate) struct RoleAssignmentRow {
    pub(crate) assignment_id: uuid::Uuid,
    pub(crate) user_id: uuid::Uuid,
    pub(crate) role: String,
    pub(crate) scope_kind: String,
    pub(crate) scope_id: Option<uuid::Uuid>,
    pub(crate) is_active: bool,
}

impl TryFrom<RoleAssignmentRow> for RoleAssignment {
    type Error = AppError;

    fn try_from(row: RoleAssignmentRow) -> Result<Self, Self::Error> {
        let role = RoleKind::from_str(row.role.as_str()).map_err(|error| {
            AppError::Internal(format!(
                "failed to decode role of assignment '{}': {error}",
                row.assignment_id
            ))
        })?;
        let scope = RoleScope::from_storage(row.scope_kind.as_str(), row.scope_id).map_err(
            |error| {
                AppError::Internal(format!(
                    "failed to decode scope of assignment '{}': {error}",
                    row.assignment_id
                ))
            },
        )?;

        Ok(Self {
            assignment_id: RoleAssignmentId::from_uuid(row.assignment_id),
            user_id: UserId::from_uuid(row.user_id),
            role,
            scope,
            is_active: row.is_active,
        })
    }
}

#[async_trait]
impl ActorResolver for PostgresAuthorizationRepository {
    async fn resolve_actor(&self, credential: &Credential) -> AppResult<Option<Actor>> {
        let row = sqlx::query_as::<_, ActorRow>(
            r#"
            SELECT users.id AS user_id, users.display_name, users.email
            FROM access_tokens AS tokens
            INNER JOIN users ON users.id = tokens.user_id
            WHERE tokens.token_hash = $1
                AND users.is_active
                AND (tokens.expires_at IS NULL OR tokens.expires_at > now())
            LIMIT 1
            "#,
        )
        .bind(credential.fingerprint())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to resolve access token: {error}")))?;

        Ok(row.map(|row| {
            Actor::new(
                UserId::from_uuid(row.user_id),
                row.display_name,
                Some(row.email),
            )
        }))
    }
}

#[async_trait]
impl RoleAssignmentRepository for PostgresAuthorizationRepository {
    async fn list_active_assignments(&self, user_id: UserId) -> AppResult<Vec<RoleAssignment>> {
        let rows = sqlx::query_as::<_, RoleAssignmentRow>(
            r#"
            SELECT id AS assignment_id, user_id, role, scope_kind, scope_id, is_active
            FROM role_assignments
            WHERE user_id = $1 AND is_active
            ORDER BY created_at
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load role assignments: {error}")))?;

        rows.into_iter().map(RoleAssignment::try_from).collect()
    }

    async fn journal_tenant(&self, journal_id: JournalId) -> AppResult<Option<TenantId>> {
        let tenant_id = sqlx::query_scalar::<_, uuid::Uuid>(
            r#"
            SELECT tenant_id
            FROM journals
            WHERE id = $1
            "#,
        )
        .bind(journal_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to resolve journal tenant: {error}"))
        })?;

        Ok(tenant_id.map(TenantId::from_uuid))
    }
}
