use async_trait::async_trait;
use scholaris_core::{AppResult, JournalId};
use scholaris_domain::{
    ReviewAssignment, ReviewAssignmentId, Submission, SubmissionId, SubmissionStatus,
};

use crate::PageQuery;

/// Filters for submission listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmissionListQuery {
    /// Journal the submissions belong to.
    pub journal_id: JournalId,
    /// Restrict to one status.
    pub status: Option<SubmissionStatus>,
    /// Pagination window.
    pub page: PageQuery,
}

/// Repository port for submissions.
#[async_trait]
pub trait SubmissionRepository: Send + Sync {
    /// Lists submissions, most recently updated first.
    async fn list_submissions(&self, query: SubmissionListQuery) -> AppResult<Vec<Submission>>;

    /// Finds one submission.
    async fn find_submission(&self, submission_id: SubmissionId) -> AppResult<Option<Submission>>;

    /// Overwrites a submission row, returning `false` when it does not exist.
    async fn save_submission(&self, submission: &Submission) -> AppResult<bool>;
}

/// Repository port for review assignments.
#[async_trait]
pub trait ReviewRepository: Send + Sync {
    /// Lists assignments of one submission, oldest first.
    async fn list_review_assignments(
        &self,
        submission_id: SubmissionId,
    ) -> AppResult<Vec<ReviewAssignment>>;

    /// Finds one assignment.
    async fn find_review_assignment(
        &self,
        review_id: ReviewAssignmentId,
    ) -> AppResult<Option<ReviewAssignment>>;

    /// Inserts an assignment.
    async fn insert_review_assignment(&self, review: &ReviewAssignment) -> AppResult<()>;

    /// Overwrites an assignment row, returning `false` when it does not exist.
    async fn save_review_assignment(&self, review: &ReviewAssignment) -> AppResult<bool>;
}
