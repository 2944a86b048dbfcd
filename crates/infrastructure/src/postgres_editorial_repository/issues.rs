use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

use scholaris_application::{IssueListQuery, IssueRepository};
use scholaris_core::{AppError, AppResult, JournalId};
use scholaris_domain::{Issue, IssueId};

use super::{PostgresEditorialRepository, count_to_u64, dependent_rows_or_internal};

#[derive(Debug, FromRow)]
struct IssueRow {
    id: uuid::Uuid,
    journal_id: uuid::Uuid,
    volume: Option<i32>,
    number: Option<String>,
    year: Option<i32>,
    title: Option<String>,
    is_published: bool,
    published_date: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl From<IssueRow> for Issue {
    fn from(row: IssueRow) -> Self {
        Self {
            issue_id: IssueId::from_uuid(row.id),
            journal_id: JournalId::from_uuid(row.journal_id),
            volume: row.volume,
            number: row.number,
            year: row.year,
            title: row.title,
            is_published: row.is_published,
            published_date: row.published_date,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl IssueRepository for PostgresEditorialRepository {
    async fn list_issues(&self, query: IssueListQuery) -> AppResult<Vec<Issue>> {
        let rows = sqlx::query_as::<_, IssueRow>(
            r#"
            SELECT id, journal_id, volume, number, year, title, is_published,
                   published_date, created_at
            FROM issues
            WHERE journal_id = $1
                AND ($2::BOOLEAN IS NULL OR is_published = $2)
            ORDER BY year DESC NULLS LAST, volume DESC NULLS LAST, created_at DESC
            LIMIT $3
            OFFSET $4
            "#,
        )
        .bind(query.journal_id.as_uuid())
        .bind(query.published)
        .bind(i64::from(query.page.limit))
        .bind(i64::from(query.page.offset))
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list issues: {error}")))?;

        Ok(rows.into_iter().map(Issue::from).collect())
    }

    async fn find_issue(&self, issue_id: IssueId) -> AppResult<Option<Issue>> {
        let row = sqlx::query_as::<_, IssueRow>(
            r#"
            SELECT id, journal_id, volume, number, year, title, is_published,
                   published_date, created_at
            FROM issues
            WHERE id = $1
            "#,
        )
        .bind(issue_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find issue: {error}")))?;

        Ok(row.map(Issue::from))
    }

    async fn insert_issue(&self, issue: &Issue) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO issues (
                id, journal_id, volume, number, year, title, is_published,
                published_date, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(issue.issue_id.as_uuid())
        .bind(issue.journal_id.as_uuid())
        .bind(issue.volume)
        .bind(issue.number.as_deref())
        .bind(issue.year)
        .bind(issue.title.as_deref())
        .bind(issue.is_published)
        .bind(issue.published_date)
        .bind(issue.created_at)
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to insert issue: {error}")))?;

        Ok(())
    }

    async fn save_issue(&self, issue: &Issue) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE issues
            SET volume = $2,
                number = $3,
                year = $4,
                title = $5,
                is_published = $6,
                published_date = $7
            WHERE id = $1
            "#,
        )
        .bind(issue.issue_id.as_uuid())
        .bind(issue.volume)
        .bind(issue.number.as_deref())
        .bind(issue.year)
        .bind(issue.title.as_deref())
        .bind(issue.is_published)
        .bind(issue.published_date)
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to update issue: {error}")))?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_issue(&self, issue_id: IssueId) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM issues WHERE id = $1")
            .bind(issue_id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|error| dependent_rows_or_internal(error, "delete issue", "articles"))?;

        Ok(result.rows_affected() > 0)
    }

    async fn count_articles(&self, issue_id: IssueId) -> AppResult<u64> {
        let count =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM submissions WHERE issue_id = $1")
                .bind(issue_id.as_uuid())
                .fetch_one(&self.pool)
                .await
                .map_err(|error| {
                    AppError::Internal(format!("failed to count issue articles: {error}"))
                })?;

        Ok(count_to_u64(count))
    }
}
