use std::sync::Arc;

use chrono::{DateTime, Utc};
use scholaris_core::{AppError, AppResult, Credential, FieldErrors, UserId};
use scholaris_domain::{
    AuditAction, ReviewAssignment, ReviewAssignmentId, ReviewRecommendation, ReviewStatus,
    Submission, SubmissionId, SubmissionStatus, ViewPath,
};
use serde::Deserialize;
use tracing::warn;
use validator::Validate;

use crate::validation::{finish_fields, trimmed_optional};
use crate::{
    AccessRequirement, ActionEnvelope, ActionOutcome, AuditDraft, Completed, EDITORIAL_ROLES,
    InputSchema, ReviewRepository, SubmissionRepository, UserRepository,
};

/// Request listing the review assignments of one submission.
#[derive(Debug, Clone, Copy, Deserialize, Validate)]
pub struct ListReviewAssignmentsRequest {
    /// Reviewed submission.
    pub submission_id: SubmissionId,
}

impl InputSchema for ListReviewAssignmentsRequest {
    type Valid = SubmissionId;

    fn into_valid(self) -> AppResult<Self::Valid> {
        Ok(self.submission_id)
    }
}

/// Request inviting a reviewer.
#[derive(Debug, Clone, Copy, Deserialize, Validate)]
pub struct AssignReviewerRequest {
    /// Submission under review.
    pub submission_id: SubmissionId,
    /// Invited reviewer.
    pub reviewer_id: UserId,
    /// Requested completion date.
    pub due_at: Option<DateTime<Utc>>,
}

impl InputSchema for AssignReviewerRequest {
    type Valid = Self;

    fn into_valid(self) -> AppResult<Self::Valid> {
        let mut errors = FieldErrors::default();
        if self.due_at.is_some_and(|due_at| due_at <= Utc::now()) {
            errors.push("due_at", "due date must be in the future");
        }
        finish_fields(errors)?;
        Ok(self)
    }
}

/// Request recording a reviewer's recommendation.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CompleteReviewRequest {
    /// Review assignment identifier.
    pub review_id: ReviewAssignmentId,
    /// Recommendation.
    pub recommendation: ReviewRecommendation,
    /// Comments for the editor.
    #[validate(length(max = 10000, message = "comments must not exceed 10000 characters"))]
    pub comments: Option<String>,
}

/// Sanitized review completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewCompletion {
    review_id: ReviewAssignmentId,
    recommendation: ReviewRecommendation,
    comments: Option<String>,
}

impl InputSchema for CompleteReviewRequest {
    type Valid = ReviewCompletion;

    fn into_valid(self) -> AppResult<Self::Valid> {
        Ok(ReviewCompletion {
            review_id: self.review_id,
            recommendation: self.recommendation,
            comments: trimmed_optional(self.comments),
        })
    }
}

fn submission_not_found(submission_id: SubmissionId) -> AppError {
    AppError::NotFound(format!("submission '{submission_id}' was not found"))
}

fn review_not_found(review_id: ReviewAssignmentId) -> AppError {
    AppError::NotFound(format!("review '{review_id}' was not found"))
}

/// Peer review coordination.
#[derive(Clone)]
pub struct ReviewService {
    envelope: ActionEnvelope,
    submissions: Arc<dyn SubmissionRepository>,
    reviews: Arc<dyn ReviewRepository>,
    users: Arc<dyn UserRepository>,
}

impl ReviewService {
    /// Creates the service.
    #[must_use]
    pub fn new(
        envelope: ActionEnvelope,
        submissions: Arc<dyn SubmissionRepository>,
        reviews: Arc<dyn ReviewRepository>,
        users: Arc<dyn UserRepository>,
    ) -> Self {
        Self {
            envelope,
            submissions,
            reviews,
            users,
        }
    }

    /// Lists review assignments of one submission.
    pub async fn list_review_assignments(
        &self,
        credential: Option<&Credential>,
        request: ListReviewAssignmentsRequest,
    ) -> ActionOutcome<Vec<ReviewAssignment>> {
        self.envelope
            .run_scoped(
                credential,
                request,
                |submission_id| self.submission_requirement(*submission_id),
                |_, submission_id| self.list_review_assignments_impl(submission_id),
            )
            .await
    }

    /// Invites a reviewer and opens the review round.
    pub async fn assign_reviewer(
        &self,
        credential: Option<&Credential>,
        request: AssignReviewerRequest,
    ) -> ActionOutcome<ReviewAssignment> {
        self.envelope
            .run_scoped(
                credential,
                request,
                |request| self.submission_requirement(request.submission_id),
                |_, request| self.assign_reviewer_impl(request),
            )
            .await
    }

    /// Records a recommendation; the assigned reviewer may complete their own review.
    pub async fn complete_review(
        &self,
        credential: Option<&Credential>,
        request: CompleteReviewRequest,
    ) -> ActionOutcome<ReviewAssignment> {
        self.envelope
            .run_scoped(
                credential,
                request,
                |completion| self.review_requirement(completion.review_id),
                |_, completion| self.complete_review_impl(completion),
            )
            .await
    }

    async fn submission_requirement(
        &self,
        submission_id: SubmissionId,
    ) -> AppResult<AccessRequirement> {
        let submission = self.find_submission(submission_id).await?;
        Ok(AccessRequirement::journal(
            submission.journal_id,
            EDITORIAL_ROLES,
        ))
    }

    async fn review_requirement(
        &self,
        review_id: ReviewAssignmentId,
    ) -> AppResult<AccessRequirement> {
        let review = self.find_review(review_id).await?;
        let submission = self.find_submission(review.submission_id).await?;
        Ok(
            AccessRequirement::journal(submission.journal_id, EDITORIAL_ROLES)
                .or_self(review.reviewer_id),
        )
    }

    async fn find_submission(&self, submission_id: SubmissionId) -> AppResult<Submission> {
        self.submissions
            .find_submission(submission_id)
            .await?
            .ok_or_else(|| submission_not_found(submission_id))
    }

    async fn find_review(&self, review_id: ReviewAssignmentId) -> AppResult<ReviewAssignment> {
        self.reviews
            .find_review_assignment(review_id)
            .await?
            .ok_or_else(|| review_not_found(review_id))
    }

    async fn advance(
        &self,
        submission: &mut Submission,
        status: SubmissionStatus,
        now: DateTime<Utc>,
    ) -> AppResult<()> {
        submission.transition_to(status, now)?;
        if !self.submissions.save_submission(submission).await? {
            return Err(submission_not_found(submission.submission_id));
        }
        Ok(())
    }

    /// Moves the submission to `review_completed` once no review is pending.
    /// The flag reports whether the status changed.
    async fn close_review_round(
        &self,
        submission_id: SubmissionId,
        now: DateTime<Utc>,
    ) -> AppResult<(Submission, bool)> {
        let mut submission = self.find_submission(submission_id).await?;
        let still_pending = self
            .reviews
            .list_review_assignments(submission_id)
            .await?
            .iter()
            .any(|other| other.status == ReviewStatus::Pending);
        if still_pending || submission.status != SubmissionStatus::UnderReview {
            return Ok((submission, false));
        }

        self.advance(&mut submission, SubmissionStatus::ReviewCompleted, now)
            .await?;
        Ok((submission, true))
    }

    async fn list_review_assignments_impl(
        &self,
        submission_id: SubmissionId,
    ) -> AppResult<Completed<Vec<ReviewAssignment>>> {
        let reviews = self.reviews.list_review_assignments(submission_id).await?;
        Ok(Completed::read(reviews))
    }

    async fn assign_reviewer_impl(
        &self,
        request: AssignReviewerRequest,
    ) -> AppResult<Completed<ReviewAssignment>> {
        let mut submission = self.find_submission(request.submission_id).await?;
        if !matches!(
            submission.status,
            SubmissionStatus::Submitted
                | SubmissionStatus::UnderReview
                | SubmissionStatus::ReviewCompleted
        ) {
            return Err(AppError::Conflict(format!(
                "submission '{}' is not open for review (status '{}')",
                submission.submission_id,
                submission.status.as_str()
            )));
        }

        let reviewer = self
            .users
            .find_user(request.reviewer_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("user '{}' was not found", request.reviewer_id))
            })?;
        if !reviewer.is_active {
            return Err(AppError::Conflict(format!(
                "user '{}' is deactivated",
                reviewer.user_id
            )));
        }

        let existing = self
            .reviews
            .list_review_assignments(submission.submission_id)
            .await?;
        if existing.iter().any(|review| {
            review.reviewer_id == reviewer.user_id && review.status == ReviewStatus::Pending
        }) {
            return Err(AppError::Conflict(format!(
                "reviewer '{}' already has a pending review for submission '{}'",
                reviewer.user_id, submission.submission_id
            )));
        }

        let now = Utc::now();
        let review = ReviewAssignment {
            review_id: ReviewAssignmentId::new(),
            submission_id: submission.submission_id,
            reviewer_id: reviewer.user_id,
            status: ReviewStatus::Pending,
            recommendation: None,
            comments: None,
            due_at: request.due_at,
            assigned_at: now,
            completed_at: None,
        };
        self.reviews.insert_review_assignment(&review).await?;

        let mut views = vec![ViewPath::submission_reviews(submission.submission_id)];
        if submission.status != SubmissionStatus::UnderReview {
            match self.advance(&mut submission, SubmissionStatus::UnderReview, now).await {
                Ok(()) => views.push(ViewPath::admin_submissions(submission.journal_id)),
                Err(error) => {
                    warn!(
                        %error,
                        review_id = %review.review_id,
                        submission_id = %submission.submission_id,
                        "reviewer assigned but submission was not moved to under_review"
                    );
                }
            }
        }

        let audit = AuditDraft::new(AuditAction::ReviewAssigned, "review", review.review_id)
            .with_details(serde_json::json!({
                "submission_id": review.submission_id,
                "reviewer_id": review.reviewer_id,
                "due_at": review.due_at,
            }));
        Ok(Completed::changed(review, audit).invalidating(views))
    }

    async fn complete_review_impl(
        &self,
        completion: ReviewCompletion,
    ) -> AppResult<Completed<ReviewAssignment>> {
        let mut review = self.find_review(completion.review_id).await?;
        let now = Utc::now();
        review.complete(completion.recommendation, completion.comments, now)?;
        if !self.reviews.save_review_assignment(&review).await? {
            return Err(review_not_found(review.review_id));
        }

        let mut views = vec![
            ViewPath::submission_reviews(review.submission_id),
            ViewPath::admin(),
        ];
        let submission_status = match self.close_review_round(review.submission_id, now).await {
            Ok((submission, advanced)) => {
                if advanced {
                    views.push(ViewPath::admin_submissions(submission.journal_id));
                }
                Some(submission.status.as_str())
            }
            Err(error) => {
                warn!(
                    %error,
                    review_id = %review.review_id,
                    submission_id = %review.submission_id,
                    "review completed but submission status was not updated"
                );
                None
            }
        };

        let audit = AuditDraft::new(AuditAction::ReviewCompleted, "review", review.review_id)
            .with_details(serde_json::json!({
                "submission_id": review.submission_id,
                "recommendation": completion.recommendation.as_str(),
                "submission_status": submission_status,
            }));
        Ok(Completed::changed(review, audit).invalidating(views))
    }
}

#[cfg(test)]
mod tests;
