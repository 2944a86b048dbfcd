use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use scholaris_application::{AuditLogQuery, AuditLogRepository};
use scholaris_core::{AppError, AppResult, UserId};
use scholaris_domain::{AuditAction, AuditRecord, AuditRecordId};

/// PostgreSQL-backed repository for activity log reads and retention.
#[derive(Clone)]
pub struct PostgresAuditLogRepository {
    pool: PgPool,
}

impl PostgresAuditLogRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct AuditRecordRow {
    record_id: uuid::Uuid,
    action: String,
    entity_type: String,
    entity_id: String,
    details: serde_json::Value,
    actor_id: Option<uuid::Uuid>,
    created_at: DateTime<Utc>,
}

impl TryFrom<AuditRecordRow> for AuditRecord {
    type Error = AppError;

    fn try_from(row: AuditRecordRow) -> Result<Self, Self::Error> {
        let action = AuditAction::from_str(row.action.as_str()).map_err(|error| {
            AppError::Internal(format!(
                "failed to decode action of audit record '{}': {error}",
                row.record_id
            ))
        })?;

        Ok(Self {
            record_id: AuditRecordId::from_uuid(row.record_id),
            action,
            entity_type: row.entity_type,
            entity_id: row.entity_id,
            details: row.details,
            actor_id: row.actor_id.map(UserId::from_uuid),
            created_at: row.created_at,
        })
    }
}

#[async_trait]
impl AuditLogRepository for PostgresAuditLogRepository {
    async fn list_recent(&self, query: AuditLogQuery) -> AppResult<Vec<AuditRecord>> {
        let rows = sqlx::query_as::<_, AuditRecordRow>(
            r#"
            SELECT
                id AS record_id,
                action,
                entity_type,
                entity_id,
                details,
                actor_id,
                created_at
            FROM audit_log_records
            WHERE ($1::TEXT IS NULL OR action = $1)
                AND ($2::TEXT IS NULL OR entity_type = $2)
            ORDER BY created_at DESC
            LIMIT $3
            OFFSET $4
            "#,
        )
        .bind(query.action.map(|action| action.as_str()))
        .bind(query.entity_type)
        .bind(i64::from(query.page.limit))
        .bind(i64::from(query.page.offset))
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to list audit log records: {error}"))
        })?;

        rows.into_iter().map(AuditRecord::try_from).collect()
    }

    async fn purge_older_than(&self, cutoff: DateTime<Utc>) -> AppResult<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM audit_log_records
            WHERE created_at < $1
            "#,
        )
        .bind(cutoff)
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to purge audit log records: {error}"))
        })?;

        Ok(result.rows_affected())
    }
}
