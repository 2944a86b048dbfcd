use async_trait::async_trait;
use sqlx::PgPool;

use scholaris_application::{AuditEvent, AuditRepository};
use scholaris_core::{AppError, AppResult};

/// PostgreSQL-backed append-only audit repository.
#[derive(Clone)]
pub struct PostgresAuditRepository {
    pool: PgPool,
}

impl PostgresAuditRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditRepository for PostgresAuditRepository {
    async fn append_event(&self, event: AuditEvent) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO audit_log_records (
                action,
                entity_type,
                entity_id,
                details,
                actor_id
            )
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(event.action.as_str())
        .bind(event.entity_type)
        .bind(event.entity_id)
        .bind(event.details)
        .bind(event.actor_id.map(|actor_id| actor_id.as_uuid()))
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to append audit event: {error}")))?;

        Ok(())
    }
}
