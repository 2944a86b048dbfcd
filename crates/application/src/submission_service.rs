use std::sync::Arc;

use chrono::Utc;
use scholaris_core::{AppError, AppResult, Credential, JournalId};
use scholaris_domain::{
    AuditAction, IssueId, RoleKind, Submission, SubmissionId, SubmissionStatus, ViewPath,
};
use serde::Deserialize;
use tracing::warn;
use validator::Validate;

use crate::validation::trimmed_optional;
use crate::{
    AccessRequirement, ActionEnvelope, ActionOutcome, AuditDraft, Completed, EDITORIAL_ROLES,
    ISSUE_MANAGER_ROLES, InputSchema, IssueRepository, JournalRepository, PageQuery,
    SubmissionListQuery, SubmissionRepository,
};

/// Listing request for the submissions of one journal.
#[derive(Debug, Clone, Copy, Deserialize, Validate)]
pub struct ListSubmissionsRequest {
    /// Owning journal.
    pub journal_id: JournalId,
    /// Restrict to one status.
    pub status: Option<SubmissionStatus>,
    /// Page size.
    #[validate(range(min = 1, max = 200, message = "limit must be between 1 and 200"))]
    pub limit: Option<u32>,
    /// Rows skipped.
    pub offset: Option<u32>,
}

impl InputSchema for ListSubmissionsRequest {
    type Valid = SubmissionListQuery;

    fn into_valid(self) -> AppResult<Self::Valid> {
        Ok(SubmissionListQuery {
            journal_id: self.journal_id,
            status: self.status,
            page: PageQuery::from_parts(self.limit, self.offset),
        })
    }
}

/// Request moving a submission through its lifecycle.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ChangeSubmissionStatusRequest {
    /// Submission identifier.
    pub submission_id: SubmissionId,
    /// Target status.
    pub status: SubmissionStatus,
    /// Editorial note stored with the audit record.
    #[validate(length(max = 2000, message = "note must not exceed 2000 characters"))]
    pub note: Option<String>,
}

/// Sanitized status change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusChange {
    submission_id: SubmissionId,
    status: SubmissionStatus,
    note: Option<String>,
}

impl InputSchema for ChangeSubmissionStatusRequest {
    type Valid = StatusChange;

    fn into_valid(self) -> AppResult<Self::Valid> {
        Ok(StatusChange {
            submission_id: self.submission_id,
            status: self.status,
            note: trimmed_optional(self.note),
        })
    }
}

/// Request scheduling an accepted submission in an issue.
#[derive(Debug, Clone, Copy, Deserialize, Validate)]
pub struct AssignSubmissionToIssueRequest {
    /// Submission identifier.
    pub submission_id: SubmissionId,
    /// Target issue of the same journal.
    pub issue_id: IssueId,
}

impl InputSchema for AssignSubmissionToIssueRequest {
    type Valid = Self;

    fn into_valid(self) -> AppResult<Self::Valid> {
        Ok(self)
    }
}

fn submission_not_found(submission_id: SubmissionId) -> AppError {
    AppError::NotFound(format!("submission '{submission_id}' was not found"))
}

/// Editorial workflow over submissions.
#[derive(Clone)]
pub struct SubmissionService {
    envelope: ActionEnvelope,
    submissions: Arc<dyn SubmissionRepository>,
    issues: Arc<dyn IssueRepository>,
    journals: Arc<dyn JournalRepository>,
}

impl SubmissionService {
    /// Creates the service.
    #[must_use]
    pub fn new(
        envelope: ActionEnvelope,
        submissions: Arc<dyn SubmissionRepository>,
        issues: Arc<dyn IssueRepository>,
        journals: Arc<dyn JournalRepository>,
    ) -> Self {
        Self {
            envelope,
            submissions,
            issues,
            journals,
        }
    }

    /// Lists submissions of one journal.
    pub async fn list_submissions(
        &self,
        credential: Option<&Credential>,
        request: ListSubmissionsRequest,
    ) -> ActionOutcome<Vec<Submission>> {
        self.envelope
            .run(
                credential,
                request,
                |query| AccessRequirement::journal(query.journal_id, EDITORIAL_ROLES),
                |_, query| self.list_submissions_impl(query),
            )
            .await
    }

    /// Applies a lifecycle transition; illegal moves are conflicts.
    pub async fn change_submission_status(
        &self,
        credential: Option<&Credential>,
        request: ChangeSubmissionStatusRequest,
    ) -> ActionOutcome<Submission> {
        self.envelope
            .run_scoped(
                credential,
                request,
                |change| self.submission_requirement(change.submission_id, EDITORIAL_ROLES),
                |_, change| self.change_submission_status_impl(change),
            )
            .await
    }

    /// Links an accepted submission to an issue of the same journal.
    pub async fn assign_submission_to_issue(
        &self,
        credential: Option<&Credential>,
        request: AssignSubmissionToIssueRequest,
    ) -> ActionOutcome<Submission> {
        self.envelope
            .run_scoped(
                credential,
                request,
                |request| self.submission_requirement(request.submission_id, ISSUE_MANAGER_ROLES),
                |_, request| self.assign_submission_to_issue_impl(request),
            )
            .await
    }

    async fn submission_requirement(
        &self,
        submission_id: SubmissionId,
        roles: &'static [RoleKind],
    ) -> AppResult<AccessRequirement> {
        let submission = self.find_submission(submission_id).await?;
        Ok(AccessRequirement::journal(submission.journal_id, roles))
    }

    async fn find_submission(&self, submission_id: SubmissionId) -> AppResult<Submission> {
        self.submissions
            .find_submission(submission_id)
            .await?
            .ok_or_else(|| submission_not_found(submission_id))
    }

    async fn list_submissions_impl(
        &self,
        query: SubmissionListQuery,
    ) -> AppResult<Completed<Vec<Submission>>> {
        let submissions = self.submissions.list_submissions(query).await?;
        Ok(Completed::read(submissions))
    }

    async fn change_submission_status_impl(
        &self,
        change: StatusChange,
    ) -> AppResult<Completed<Submission>> {
        let mut submission = self.find_submission(change.submission_id).await?;
        let previous = submission.status;
        submission.transition_to(change.status, Utc::now())?;

        if !self.submissions.save_submission(&submission).await? {
            return Err(submission_not_found(change.submission_id));
        }

        let audit = AuditDraft::new(
            AuditAction::SubmissionStatusChanged,
            "submission",
            submission.submission_id,
        )
        .with_details(serde_json::json!({
            "from": previous.as_str(),
            "to": submission.status.as_str(),
            "note": change.note,
        }));
        let list = ViewPath::admin_submissions(submission.journal_id);
        Ok(Completed::changed(submission, audit).invalidating([list, ViewPath::admin()]))
    }

    async fn assign_submission_to_issue_impl(
        &self,
        request: AssignSubmissionToIssueRequest,
    ) -> AppResult<Completed<Submission>> {
        let mut submission = self.find_submission(request.submission_id).await?;
        let issue = self
            .issues
            .find_issue(request.issue_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("issue '{}' was not found", request.issue_id))
            })?;
        if issue.journal_id != submission.journal_id {
            return Err(AppError::Conflict(format!(
                "issue '{}' belongs to another journal",
                issue.issue_id
            )));
        }

        let previous_issue = submission.issue_id;
        submission.schedule_in(issue.issue_id, Utc::now())?;
        if !self.submissions.save_submission(&submission).await? {
            return Err(submission_not_found(request.submission_id));
        }

        let mut views = vec![ViewPath::admin_submissions(submission.journal_id)];
        match self.journals.find_journal(issue.journal_id).await {
            Ok(Some(journal)) => views.push(ViewPath::public_issue(&journal.path, issue.issue_id)),
            Ok(None) => {}
            Err(error) => {
                warn!(%error, issue_id = %issue.issue_id, "journal lookup failed after scheduling");
            }
        }
        let audit = AuditDraft::new(
            AuditAction::SubmissionScheduled,
            "submission",
            submission.submission_id,
        )
        .with_details(serde_json::json!({
            "issue_id": issue.issue_id,
            "previous_issue_id": previous_issue,
        }));
        Ok(Completed::changed(submission, audit).invalidating(views))
    }
}
