use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

use scholaris_application::{JournalListQuery, JournalRepository};
use scholaris_core::{AppError, AppResult, JournalId, TenantId};
use scholaris_domain::{Journal, JournalContact};

use super::{PostgresEditorialRepository, count_to_u64, dependent_rows_or_internal};

#[derive(Debug, FromRow)]
struct JournalRow {
    id: uuid::Uuid,
    tenant_id: uuid::Uuid,
    path: String,
    title: String,
    description: Option<String>,
    online_issn: Option<String>,
    print_issn: Option<String>,
    contact_name: Option<String>,
    contact_email: Option<String>,
    is_active: bool,
    created_at: DateTime<Utc>,
}

impl From<JournalRow> for Journal {
    fn from(row: JournalRow) -> Self {
        Self {
            journal_id: JournalId::from_uuid(row.id),
            tenant_id: TenantId::from_uuid(row.tenant_id),
            path: row.path,
            title: row.title,
            description: row.description,
            online_issn: row.online_issn,
            print_issn: row.print_issn,
            contact: JournalContact {
                name: row.contact_name,
                email: row.contact_email,
            },
            is_active: row.is_active,
            created_at: row.created_at,
        }
    }
}

const JOURNAL_COLUMNS: &str = "id, tenant_id, path, title, description, online_issn, print_issn, \
     contact_name, contact_email, is_active, created_at";

fn path_conflict_or_internal(error: sqlx::Error, path: &str, operation: &str) -> AppError {
    if let sqlx::Error::Database(ref database_error) = error
        && database_error.code().as_deref() == Some("23505")
    {
        return AppError::Conflict(format!("journal path '{path}' is already taken"));
    }

    AppError::Internal(format!("failed to {operation}: {error}"))
}

#[async_trait]
impl JournalRepository for PostgresEditorialRepository {
    async fn list_journals(&self, query: JournalListQuery) -> AppResult<Vec<Journal>> {
        let rows = sqlx::query_as::<_, JournalRow>(&format!(
            r#"
            SELECT {JOURNAL_COLUMNS}
            FROM journals
            WHERE ($1::UUID IS NULL OR tenant_id = $1)
                AND ($2 OR is_active)
            ORDER BY title, path
            LIMIT $3
            OFFSET $4
            "#
        ))
        .bind(query.tenant_id.map(|tenant_id| tenant_id.as_uuid()))
        .bind(query.include_inactive)
        .bind(i64::from(query.page.limit))
        .bind(i64::from(query.page.offset))
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list journals: {error}")))?;

        Ok(rows.into_iter().map(Journal::from).collect())
    }

    async fn find_journal(&self, journal_id: JournalId) -> AppResult<Option<Journal>> {
        let row = sqlx::query_as::<_, JournalRow>(&format!(
            "SELECT {JOURNAL_COLUMNS} FROM journals WHERE id = $1"
        ))
        .bind(journal_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find journal: {error}")))?;

        Ok(row.map(Journal::from))
    }

    async fn find_journal_by_path(&self, path: &str) -> AppResult<Option<Journal>> {
        let row = sqlx::query_as::<_, JournalRow>(&format!(
            "SELECT {JOURNAL_COLUMNS} FROM journals WHERE path = $1"
        ))
        .bind(path)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to find journal by path: {error}"))
        })?;

        Ok(row.map(Journal::from))
    }

    async fn insert_journal(&self, journal: &Journal) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO journals (
                id, tenant_id, path, title, description, online_issn, print_issn,
                contact_name, contact_email, is_active, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(journal.journal_id.as_uuid())
        .bind(journal.tenant_id.as_uuid())
        .bind(journal.path.as_str())
        .bind(journal.title.as_str())
        .bind(journal.description.as_deref())
        .bind(journal.online_issn.as_deref())
        .bind(journal.print_issn.as_deref())
        .bind(journal.contact.name.as_deref())
        .bind(journal.contact.email.as_deref())
        .bind(journal.is_active)
        .bind(journal.created_at)
        .execute(&self.pool)
        .await
        .map_err(|error| {
            path_conflict_or_internal(error, journal.path.as_str(), "insert journal")
        })?;

        Ok(())
    }

    async fn save_journal(&self, journal: &Journal) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE journals
            SET path = $2,
                title = $3,
                description = $4,
                online_issn = $5,
                print_issn = $6,
                contact_name = $7,
                contact_email = $8,
                is_active = $9
            WHERE id = $1
            "#,
        )
        .bind(journal.journal_id.as_uuid())
        .bind(journal.path.as_str())
        .bind(journal.title.as_str())
        .bind(journal.description.as_deref())
        .bind(journal.online_issn.as_deref())
        .bind(journal.print_issn.as_deref())
        .bind(journal.contact.name.as_deref())
        .bind(journal.contact.email.as_deref())
        .bind(journal.is_active)
        .execute(&self.pool)
        .await
        .map_err(|error| {
            path_conflict_or_internal(error, journal.path.as_str(), "update journal")
        })?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_journal(&self, journal_id: JournalId) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM journals WHERE id = $1")
            .bind(journal_id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|error| {
                dependent_rows_or_internal(error, "delete journal", "issues or submissions")
            })?;

        Ok(result.rows_affected() > 0)
    }

    async fn count_issues(&self, journal_id: JournalId) -> AppResult<u64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM issues WHERE journal_id = $1")
            .bind(journal_id.as_uuid())
            .fetch_one(&self.pool)
            .await
            .map_err(|error| AppError::Internal(format!("failed to count issues: {error}")))?;

        Ok(count_to_u64(count))
    }

    async fn tenant_exists(&self, tenant_id: TenantId) -> AppResult<bool> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM tenants WHERE id = $1)")
            .bind(tenant_id.as_uuid())
            .fetch_one(&self.pool)
            .await
            .map_err(|error| AppError::Internal(format!("failed to look up tenant: {error}")))
    }
}
