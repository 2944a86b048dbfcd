use std::str::FromStr;

use chrono::{DateTime, Utc};
use scholaris_core::{AppError, AppResult, JournalId, UserId};
use serde::{Deserialize, Serialize};

use crate::IssueId;

record_identifier!(
    /// Submission identifier.
    SubmissionId
);

record_identifier!(
    /// Review assignment identifier.
    ReviewAssignmentId
);

/// Editorial lifecycle of a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    /// Being prepared by the author.
    Draft,
    /// Handed in, awaiting editorial triage.
    Submitted,
    /// Out for peer review.
    UnderReview,
    /// All reviews are in.
    ReviewCompleted,
    /// Accepted for publication.
    Accepted,
    /// Rejected; terminal.
    Declined,
    /// Published in an issue; terminal.
    Published,
}

impl SubmissionStatus {
    /// Returns a stable storage value for this status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Submitted => "submitted",
            Self::UnderReview => "under_review",
            Self::ReviewCompleted => "review_completed",
            Self::Accepted => "accepted",
            Self::Declined => "declined",
            Self::Published => "published",
        }
    }

    /// Returns all statuses in lifecycle order.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[SubmissionStatus] = &[
            SubmissionStatus::Draft,
            SubmissionStatus::Submitted,
            SubmissionStatus::UnderReview,
            SubmissionStatus::ReviewCompleted,
            SubmissionStatus::Accepted,
            SubmissionStatus::Declined,
            SubmissionStatus::Published,
        ];

        ALL
    }

    /// Returns whether no further transition is allowed.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Declined | Self::Published)
    }

    /// Returns whether the lifecycle allows moving to `next`.
    #[must_use]
    pub fn can_transition_to(&self, next: Self) -> bool {
        use SubmissionStatus::{
            Accepted, Declined, Draft, Published, ReviewCompleted, Submitted, UnderReview,
        };

        matches!(
            (self, next),
            (Draft, Submitted)
                | (Submitted, UnderReview)
                | (Submitted, Declined)
                | (UnderReview, ReviewCompleted)
                | (UnderReview, Declined)
                | (ReviewCompleted, UnderReview)
                | (ReviewCompleted, Accepted)
                | (ReviewCompleted, Declined)
                | (Accepted, Published)
        )
    }
}

impl FromStr for SubmissionStatus {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|status| status.as_str() == value)
            .ok_or_else(|| AppError::Validation(format!("unknown submission status '{value}'")))
    }
}

/// Manuscript handed in to a journal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    /// Submission identifier.
    pub submission_id: SubmissionId,
    /// Journal the manuscript was submitted to.
    pub journal_id: JournalId,
    /// Manuscript title.
    pub title: String,
    /// Abstract text.
    pub abstract_text: Option<String>,
    /// Submitting author.
    pub submitter_id: UserId,
    /// Issue the article is scheduled in.
    pub issue_id: Option<IssueId>,
    /// Lifecycle status.
    pub status: SubmissionStatus,
    /// When the manuscript left draft.
    pub submitted_at: Option<DateTime<Utc>>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Submission {
    /// Moves the submission to a new lifecycle status.
    pub fn transition_to(&mut self, next: SubmissionStatus, now: DateTime<Utc>) -> AppResult<()> {
        if !self.status.can_transition_to(next) {
            return Err(AppError::Conflict(format!(
                "submission '{}' cannot move from '{}' to '{}'",
                self.submission_id,
                self.status.as_str(),
                next.as_str()
            )));
        }

        if next == SubmissionStatus::Submitted && self.submitted_at.is_none() {
            self.submitted_at = Some(now);
        }
        self.status = next;
        self.updated_at = now;
        Ok(())
    }

    /// Schedules the article in an issue.
    pub fn schedule_in(&mut self, issue_id: IssueId, now: DateTime<Utc>) -> AppResult<()> {
        if !matches!(
            self.status,
            SubmissionStatus::Accepted | SubmissionStatus::Published
        ) {
            return Err(AppError::Conflict(format!(
                "submission '{}' must be accepted before it can be scheduled (status '{}')",
                self.submission_id,
                self.status.as_str()
            )));
        }

        self.issue_id = Some(issue_id);
        self.updated_at = now;
        Ok(())
    }
}

/// Progress of one review assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewStatus {
    /// Awaiting the reviewer.
    Pending,
    /// Review delivered.
    Completed,
    /// Reviewer declined the invitation.
    Declined,
}

impl ReviewStatus {
    /// Returns a stable storage value for this status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Declined => "declined",
        }
    }
}

impl FromStr for ReviewStatus {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "pending" => Ok(Self::Pending),
            "completed" => Ok(Self::Completed),
            "declined" => Ok(Self::Declined),
            _ => Err(AppError::Validation(format!(
                "unknown review status '{value}'"
            ))),
        }
    }
}

/// Reviewer recommendation recorded when a review completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewRecommendation {
    /// Accept as is.
    Accept,
    /// Accept after small changes.
    MinorRevisions,
    /// Substantial changes needed.
    MajorRevisions,
    /// Resubmit for a new review round.
    Resubmit,
    /// Reject.
    Decline,
}

impl ReviewRecommendation {
    /// Returns a stable storage value for this recommendation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Accept => "accept",
            Self::MinorRevisions => "minor_revisions",
            Self::MajorRevisions => "major_revisions",
            Self::Resubmit => "resubmit",
            Self::Decline => "decline",
        }
    }
}

impl FromStr for ReviewRecommendation {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "accept" => Ok(Self::Accept),
            "minor_revisions" => Ok(Self::MinorRevisions),
            "major_revisions" => Ok(Self::MajorRevisions),
            "resubmit" => Ok(Self::Resubmit),
            "decline" => Ok(Self::Decline),
            _ => Err(AppError::Validation(format!(
                "unknown review recommendation '{value}'"
            ))),
        }
    }
}

/// Invitation of a reviewer to a submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewAssignment {
    /// Assignment identifier.
    pub review_id: ReviewAssignmentId,
    /// Reviewed submission.
    pub submission_id: SubmissionId,
    /// Invited reviewer.
    pub reviewer_id: UserId,
    /// Progress.
    pub status: ReviewStatus,
    /// Recommendation, present once completed.
    pub recommendation: Option<ReviewRecommendation>,
    /// Comments for the editor.
    pub comments: Option<String>,
    /// Requested completion date.
    pub due_at: Option<DateTime<Utc>>,
    /// Invitation timestamp.
    pub assigned_at: DateTime<Utc>,
    /// Completion timestamp.
    pub completed_at: Option<DateTime<Utc>>,
}

impl ReviewAssignment {
    /// Records the reviewer's recommendation.
    pub fn complete(
        &mut self,
        recommendation: ReviewRecommendation,
        comments: Option<String>,
        now: DateTime<Utc>,
    ) -> AppResult<()> {
        if self.status != ReviewStatus::Pending {
            return Err(AppError::Conflict(format!(
                "review '{}' is already {}",
                self.review_id,
                self.status.as_str()
            )));
        }

        self.status = ReviewStatus::Completed;
        self.recommendation = Some(recommendation);
        self.comments = comments;
        self.completed_at = Some(now);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use proptest::prelude::*;
    use scholaris_core::{AppError, JournalId, UserId};

    use super::{
        ReviewAssignment, ReviewAssignmentId, ReviewRecommendation, ReviewStatus, Submission,
        SubmissionId, SubmissionStatus,
    };
    use crate::IssueId;

    fn draft_submission() -> Submission {
        Submission {
            submission_id: SubmissionId::new(),
            journal_id: JournalId::new(),
            title: "On Borrow Checking".to_owned(),
            abstract_text: None,
            submitter_id: UserId::new(),
            issue_id: None,
            status: SubmissionStatus::Draft,
            submitted_at: None,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn happy_path_reaches_published() {
        let mut submission = draft_submission();
        for next in [
            SubmissionStatus::Submitted,
            SubmissionStatus::UnderReview,
            SubmissionStatus::ReviewCompleted,
            SubmissionStatus::Accepted,
            SubmissionStatus::Published,
        ] {
            assert!(submission.transition_to(next, Utc::now()).is_ok());
        }
        assert!(submission.submitted_at.is_some());
        assert!(submission.status.is_terminal());
    }

    #[test]
    fn skipping_review_is_rejected() {
        let mut submission = draft_submission();
        let result = submission.transition_to(SubmissionStatus::Accepted, Utc::now());
        assert!(matches!(result, Err(AppError::Conflict(_))));
        assert_eq!(submission.status, SubmissionStatus::Draft);
    }

    #[test]
    fn scheduling_requires_acceptance() {
        let mut submission = draft_submission();
        assert!(submission.schedule_in(IssueId::new(), Utc::now()).is_err());

        submission.status = SubmissionStatus::Accepted;
        let issue_id = IssueId::new();
        assert!(submission.schedule_in(issue_id, Utc::now()).is_ok());
        assert_eq!(submission.issue_id, Some(issue_id));
    }

    #[test]
    fn completing_review_twice_is_conflict() {
        let mut review = ReviewAssignment {
            review_id: ReviewAssignmentId::new(),
            submission_id: SubmissionId::new(),
            reviewer_id: UserId::new(),
            status: ReviewStatus::Pending,
            recommendation: None,
            comments: None,
            due_at: None,
            assigned_at: Utc::now(),
            completed_at: None,
        };

        assert!(
            review
                .complete(ReviewRecommendation::MinorRevisions, None, Utc::now())
                .is_ok()
        );
        assert_eq!(
            review.recommendation,
            Some(ReviewRecommendation::MinorRevisions)
        );
        assert!(
            review
                .complete(ReviewRecommendation::Accept, None, Utc::now())
                .is_err()
        );
        assert_eq!(
            review.recommendation,
            Some(ReviewRecommendation::MinorRevisions)
        );
    }

    fn status_strategy() -> impl Strategy<Value = SubmissionStatus> {
        prop::sample::select(SubmissionStatus::all().to_vec())
    }

    proptest! {
        #[test]
        fn terminal_statuses_never_change(steps in prop::collection::vec(status_strategy(), 0..32)) {
            let mut submission = draft_submission();
            for next in steps {
                let before = submission.status;
                let result = submission.transition_to(next, Utc::now());
                if before.is_terminal() {
                    prop_assert!(result.is_err());
                    prop_assert_eq!(submission.status, before);
                }
                if result.is_err() {
                    prop_assert_eq!(submission.status, before);
                }
            }
        }

        #[test]
        fn storage_values_roundtrip(status in status_strategy()) {
            prop_assert_eq!(status.as_str().parse::<SubmissionStatus>().ok(), Some(status));
        }
    }
}
