use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use tracing::info;

use scholaris_application::{
    BackupRepository, DashboardRepository, DashboardStats, FeatureCapabilities, PageQuery,
};
use scholaris_core::{AppError, AppResult};
use scholaris_domain::{Backup, BackupId};

/// PostgreSQL-backed read model for the dashboard and the backups listing.
#[derive(Clone)]
pub struct PostgresReportingRepository {
    pool: PgPool,
}

impl PostgresReportingRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Detects optional tables once at startup.
pub async fn detect_capabilities(pool: &PgPool) -> AppResult<FeatureCapabilities> {
    let backups = sqlx::query_scalar::<_, bool>(
        r#"
        SELECT EXISTS (
            SELECT 1
            FROM information_schema.tables
            WHERE table_schema = current_schema()
                AND table_name = 'backups'
        )
        "#,
    )
    .fetch_one(pool)
    .await
    .map_err(|error| AppError::Internal(format!("failed to inspect optional tables: {error}")))?;

    info!(backups, "detected optional features");
    Ok(FeatureCapabilities { backups })
}

#[derive(Debug, FromRow)]
struct BackupRow {
    id: uuid::Uuid,
    label: String,
    size_bytes: i64,
    created_at: DateTime<Utc>,
}

impl From<BackupRow> for Backup {
    fn from(row: BackupRow) -> Self {
        Self {
            backup_id: BackupId::from_uuid(row.id),
            label: row.label,
            size_bytes: row.size_bytes,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct CountersRow {
    journals: i64,
    active_journals: i64,
    issues: i64,
    published_issues: i64,
    pending_reviews: i64,
    users: i64,
}

#[derive(Debug, FromRow)]
struct StatusCountRow {
    status: String,
    total: i64,
}

fn count_to_u64(count: i64) -> u64 {
    u64::try_from(count).unwrap_or_default()
}

#[async_trait]
impl BackupRepository for PostgresReportingRepository {
    async fn list_backups(&self, page: PageQuery) -> AppResult<Vec<Backup>> {
        let rows = sqlx::query_as::<_, BackupRow>(
            r#"
            SELECT id, label, size_bytes, created_at
            FROM backups
            ORDER BY created_at DESC
            LIMIT $1
            OFFSET $2
            "#,
        )
        .bind(i64::from(page.limit))
        .bind(i64::from(page.offset))
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list backups: {error}")))?;

        Ok(rows.into_iter().map(Backup::from).collect())
    }
}

#[async_trait]
impl DashboardRepository for PostgresReportingRepository {
    async fn dashboard_stats(&self) -> AppResult<DashboardStats> {
        let counters = sqlx::query_as::<_, CountersRow>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM journals) AS journals,
                (SELECT COUNT(*) FROM journals WHERE is_active) AS active_journals,
                (SELECT COUNT(*) FROM issues) AS issues,
                (SELECT COUNT(*) FROM issues WHERE is_published) AS published_issues,
                (SELECT COUNT(*) FROM review_assignments WHERE status = 'pending')
                    AS pending_reviews,
                (SELECT COUNT(*) FROM users) AS users
            "#,
        )
        .fetch_one(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to compute dashboard counters: {error}"))
        })?;

        let statuses = sqlx::query_as::<_, StatusCountRow>(
            r#"
            SELECT status, COUNT(*) AS total
            FROM submissions
            GROUP BY status
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to count submissions by status: {error}"))
        })?;

        let submissions_by_status: BTreeMap<String, u64> = statuses
            .into_iter()
            .map(|row| (row.status, count_to_u64(row.total)))
            .collect();

        Ok(DashboardStats {
            journals: count_to_u64(counters.journals),
            active_journals: count_to_u64(counters.active_journals),
            issues: count_to_u64(counters.issues),
            published_issues: count_to_u64(counters.published_issues),
            submissions_by_status,
            pending_reviews: count_to_u64(counters.pending_reviews),
            users: count_to_u64(counters.users),
        })
    }
}
