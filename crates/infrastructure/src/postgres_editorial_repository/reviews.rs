use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

use scholaris_application::ReviewRepository;
use scholaris_core::{AppError, AppResult, UserId};
use scholaris_domain::{
    ReviewAssignment, ReviewAssignmentId, ReviewRecommendation, ReviewStatus, SubmissionId,
};

use super::PostgresEditorialRepository;

#[derive(Debug, FromRow)]
struct ReviewRow {
    id: uuid::Uuid,
    submission_id: uuid::Uuid,
    reviewer_id: uuid::Uuid,
    status: String,
    recommendation: Option<String>,
    comments: Option<String>,
    due_at: Option<DateTime<Utc>>,
    assigned_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl TryFrom<ReviewRow> for ReviewAssignment {
    type Error = AppError;

    fn try_from(row: ReviewRow) -> Result<Self, Self::Error> {
        let decode_error = |field: &str, error: AppError| {
            AppError::Internal(format!(
                "failed to decode {field} of review assignment '{}': {error}",
                row.id
            ))
        };
        let status = ReviewStatus::from_str(row.status.as_str())
            .map_err(|error| decode_error("status", error))?;
        let recommendation = row
            .recommendation
            .as_deref()
            .map(ReviewRecommendation::from_str)
            .transpose()
            .map_err(|error| decode_error("recommendation", error))?;

        Ok(Self {
            review_id: ReviewAssignmentId::from_uuid(row.id),
            submission_id: SubmissionId::from_uuid(row.submission_id),
            reviewer_id: UserId::from_uuid(row.reviewer_id),
            status,
            recommendation,
            comments: row.comments,
            due_at: row.due_at,
            assigned_at: row.assigned_at,
            completed_at: row.completed_at,
        })
    }
}

#[async_trait]
impl ReviewRepository for PostgresEditorialRepository {
    async fn list_review_assignments(
        &self,
        submission_id: SubmissionId,
    ) -> AppResult<Vec<ReviewAssignment>> {
        let rows = sqlx::query_as::<_, ReviewRow>(
            r#"
            SELECT id, submission_id, reviewer_id, status, recommendation, comments,
                   due_at, assigned_at, completed_at
            FROM review_assignments
            WHERE submission_id = $1
            ORDER BY assigned_at
            "#,
        )
        .bind(submission_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to list review assignments: {error}"))
        })?;

        rows.into_iter().map(ReviewAssignment::try_from).collect()
    }

    async fn find_review_assignment(
        &self,
        review_id: ReviewAssignmentId,
    ) -> AppResult<Option<ReviewAssignment>> {
        let row = sqlx::query_as::<_, ReviewRow>(
            r#"
            SELECT id, submission_id, reviewer_id, status, recommendation, comments,
                   due_at, assigned_at, completed_at
            FROM review_assignments
            WHERE id = $1
            "#,
        )
        .bind(review_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to find review assignment: {error}"))
        })?;

        row.map(ReviewAssignment::try_from).transpose()
    }

    async fn insert_review_assignment(&self, review: &ReviewAssignment) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO review_assignments (
                id, submission_id, reviewer_id, status, recommendation, comments,
                due_at, assigned_at, completed_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(review.review_id.as_uuid())
        .bind(review.submission_id.as_uuid())
        .bind(review.reviewer_id.as_uuid())
        .bind(review.status.as_str())
        .bind(review.recommendation.map(|recommendation| recommendation.as_str()))
        .bind(review.comments.as_deref())
        .bind(review.due_at)
        .bind(review.assigned_at)
        .bind(review.completed_at)
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to insert review assignment: {error}"))
        })?;

        Ok(())
    }

    async fn save_review_assignment(&self, review: &ReviewAssignment) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE review_assignments
            SET status = $2,
                recommendation = $3,
                comments = $4,
                due_at = $5,
                completed_at = $6
            WHERE id = $1
            "#,
        )
        .bind(review.review_id.as_uuid())
        .bind(review.status.as_str())
        .bind(review.recommendation.map(|recommendation| recommendation.as_str()))
        .bind(review.comments.as_deref())
        .bind(review.due_at)
        .bind(review.completed_at)
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to update review assignment: {error}"))
        })?;

        Ok(result.rows_affected() > 0)
    }
}
