use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

use scholaris_application::{SubmissionListQuery, SubmissionRepository};
use scholaris_core::{AppError, AppResult, JournalId, UserId};
use scholaris_domain::{IssueId, Submission, SubmissionId, SubmissionStatus};

use super::PostgresEditorialRepository;

#[derive(Debug, FromRow)]
struct SubmissionRow {
    id: uuid::Uuid,
    journal_id: uuid::Uuid,
    title: String,
    abstract_text: Option<String>,
    submitter_id: uuid::Uuid,
    issue_id: Option<uuid::Uuid>,
    status: String,
    submitted_at: Option<DateTime<Utc>>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<SubmissionRow> for Submission {
    type Error = AppError;

    fn try_from(row: SubmissionRow) -> Result<Self, Self::Error> {
        let status = SubmissionStatus::from_str(row.status.as_str()).map_err(|error| {
            AppError::Internal(format!(
                "failed to decode status of submission '{}': {error}",
                row.id
            ))
        })?;

        Ok(Self {
            submission_id: SubmissionId::from_uuid(row.id),
            journal_id: JournalId::from_uuid(row.journal_id),
            title: row.title,
            abstract_text: row.abstract_text,
            submitter_id: UserId::from_uuid(row.submitter_id),
            issue_id: row.issue_id.map(IssueId::from_uuid),
            status,
            submitted_at: row.submitted_at,
            updated_at: row.updated_at,
        })
    }
}

#[async_trait]
impl SubmissionRepository for PostgresEditorialRepository {
    async fn list_submissions(&self, query: SubmissionListQuery) -> AppResult<Vec<Submission>> {
        let rows = sqlx::query_as::<_, SubmissionRow>(
            r#"
            SELECT id, journal_id, title, abstract_text, submitter_id, issue_id, status,
                   submitted_at, updated_at
            FROM submissions
            WHERE journal_id = $1
                AND ($2::TEXT IS NULL OR status = $2)
            ORDER BY updated_at DESC
            LIMIT $3
            OFFSET $4
            "#,
        )
        .bind(query.journal_id.as_uuid())
        .bind(query.status.map(|status| status.as_str()))
        .bind(i64::from(query.page.limit))
        .bind(i64::from(query.page.offset))
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list submissions: {error}")))?;

        rows.into_iter().map(Submission::try_from).collect()
    }

    async fn find_submission(&self, submission_id: SubmissionId) -> AppResult<Option<Submission>> {
        let row = sqlx::query_as::<_, SubmissionRow>(
            r#"
            SELECT id, journal_id, title, abstract_text, submitter_id, issue_id, status,
                   submitted_at, updated_at
            FROM submissions
            WHERE id = $1
            "#,
        )
        .bind(submission_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find submission: {error}")))?;

        row.map(Submission::try_from).transpose()
    }

    async fn save_submission(&self, submission: &Submission) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE submissions
            SET title = $2,
                abstract_text = $3,
                issue_id = $4,
                status = $5,
                submitted_at = $6,
                updated_at = $7
            WHERE id = $1
            "#,
        )
        .bind(submission.submission_id.as_uuid())
        .bind(submission.title.as_str())
        .bind(submission.abstract_text.as_deref())
        .bind(submission.issue_id.map(|issue_id| issue_id.as_uuid()))
        .bind(submission.status.as_str())
        .bind(submission.submitted_at)
        .bind(submission.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to update submission: {error}")))?;

        Ok(result.rows_affected() > 0)
    }
}
