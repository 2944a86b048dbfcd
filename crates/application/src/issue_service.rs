use std::sync::Arc;

use chrono::Utc;
use scholaris_core::{AppError, AppResult, Credential, FieldErrors, JournalId};
use scholaris_domain::{AuditAction, Issue, IssueId, RoleKind, ViewPath};
use serde::Deserialize;
use tracing::warn;
use validator::Validate;

use crate::validation::{finish_fields, trimmed_optional};
use crate::{
    AccessRequirement, ActionEnvelope, ActionOutcome, AuditDraft, Completed, EDITORIAL_ROLES,
    ISSUE_MANAGER_ROLES, InputSchema, IssueListQuery, IssueRepository, JOURNAL_ADMIN_ROLES,
    JournalRepository, PageQuery,
};

/// Listing request for the issues of one journal.
#[derive(Debug, Clone, Copy, Deserialize, Validate)]
pub struct ListIssuesRequest {
    /// Owning journal.
    pub journal_id: JournalId,
    /// Restrict to published or unpublished issues.
    pub published: Option<bool>,
    /// Page size.
    #[validate(range(min = 1, max = 200, message = "limit must be between 1 and 200"))]
    pub limit: Option<u32>,
    /// Rows skipped.
    pub offset: Option<u32>,
}

impl InputSchema for ListIssuesRequest {
    type Valid = IssueListQuery;

    fn into_valid(self) -> AppResult<Self::Valid> {
        Ok(IssueListQuery {
            journal_id: self.journal_id,
            published: self.published,
            page: PageQuery::from_parts(self.limit, self.offset),
        })
    }
}

/// Request addressing one issue.
#[derive(Debug, Clone, Copy, Deserialize, Validate)]
pub struct IssueTarget {
    /// Issue identifier.
    pub issue_id: IssueId,
}

impl InputSchema for IssueTarget {
    type Valid = IssueId;

    fn into_valid(self) -> AppResult<Self::Valid> {
        Ok(self.issue_id)
    }
}

/// Request creating an issue.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateIssueRequest {
    /// Owning journal.
    pub journal_id: JournalId,
    /// Volume number.
    #[validate(range(min = 1, max = 9999, message = "volume must be between 1 and 9999"))]
    pub volume: Option<i32>,
    /// Issue number within the volume, e.g. `2` or `S1`.
    #[validate(length(max = 40, message = "number must not exceed 40 characters"))]
    pub number: Option<String>,
    /// Publication year.
    #[validate(range(min = 1600, max = 3000, message = "year must be between 1600 and 3000"))]
    pub year: Option<i32>,
    /// Optional title.
    #[validate(length(max = 255, message = "title must not exceed 255 characters"))]
    pub title: Option<String>,
}

/// Sanitized issue creation values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewIssue {
    journal_id: JournalId,
    volume: Option<i32>,
    number: Option<String>,
    year: Option<i32>,
    title: Option<String>,
}

impl InputSchema for CreateIssueRequest {
    type Valid = NewIssue;

    fn into_valid(self) -> AppResult<Self::Valid> {
        let number = trimmed_optional(self.number);
        let title = trimmed_optional(self.title);

        ensure_identified(self.volume, number.as_deref(), self.year, title.as_deref())?;

        Ok(NewIssue {
            journal_id: self.journal_id,
            volume: self.volume,
            number,
            year: self.year,
            title,
        })
    }
}

/// Request updating issue identification. Absent fields are kept; blank
/// text fields are cleared.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateIssueRequest {
    /// Issue identifier.
    pub issue_id: IssueId,
    /// New volume number.
    #[validate(range(min = 1, max = 9999, message = "volume must be between 1 and 9999"))]
    pub volume: Option<i32>,
    /// New issue number.
    #[validate(length(max = 40, message = "number must not exceed 40 characters"))]
    pub number: Option<String>,
    /// New publication year.
    #[validate(range(min = 1600, max = 3000, message = "year must be between 1600 and 3000"))]
    pub year: Option<i32>,
    /// New title.
    #[validate(length(max = 255, message = "title must not exceed 255 characters"))]
    pub title: Option<String>,
}

/// Sanitized issue patch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuePatch {
    issue_id: IssueId,
    volume: Option<i32>,
    number: Option<Option<String>>,
    year: Option<i32>,
    title: Option<Option<String>>,
}

impl InputSchema for UpdateIssueRequest {
    type Valid = IssuePatch;

    fn into_valid(self) -> AppResult<Self::Valid> {
        Ok(IssuePatch {
            issue_id: self.issue_id,
            volume: self.volume,
            number: self.number.map(|value| trimmed_optional(Some(value))),
            year: self.year,
            title: self.title.map(|value| trimmed_optional(Some(value))),
        })
    }
}

fn ensure_identified(
    volume: Option<i32>,
    number: Option<&str>,
    year: Option<i32>,
    title: Option<&str>,
) -> AppResult<()> {
    let mut errors = FieldErrors::default();
    if volume.is_none() && number.is_none() && year.is_none() && title.is_none() {
        errors.push("title", "an issue needs a volume, number, year or title");
    }
    finish_fields(errors)
}

fn issue_not_found(issue_id: IssueId) -> AppError {
    AppError::NotFound(format!("issue '{issue_id}' was not found"))
}

/// Issue management inside one journal.
#[derive(Clone)]
pub struct IssueService {
    envelope: ActionEnvelope,
    issues: Arc<dyn IssueRepository>,
    journals: Arc<dyn JournalRepository>,
}

impl IssueService {
    /// Creates the service.
    #[must_use]
    pub fn new(
        envelope: ActionEnvelope,
        issues: Arc<dyn IssueRepository>,
        journals: Arc<dyn JournalRepository>,
    ) -> Self {
        Self {
            envelope,
            issues,
            journals,
        }
    }

    /// Lists issues of one journal.
    pub async fn list_issues(
        &self,
        credential: Option<&Credential>,
        request: ListIssuesRequest,
    ) -> ActionOutcome<Vec<Issue>> {
        self.envelope
            .run(
                credential,
                request,
                |query| AccessRequirement::journal(query.journal_id, EDITORIAL_ROLES),
                |_, query| self.list_issues_impl(query),
            )
            .await
    }

    /// Creates an unpublished issue.
    pub async fn create_issue(
        &self,
        credential: Option<&Credential>,
        request: CreateIssueRequest,
    ) -> ActionOutcome<Issue> {
        self.envelope
            .run(
                credential,
                request,
                |new_issue| AccessRequirement::journal(new_issue.journal_id, ISSUE_MANAGER_ROLES),
                |_, new_issue| self.create_issue_impl(new_issue),
            )
            .await
    }

    /// Updates volume, number, year or title.
    pub async fn update_issue(
        &self,
        credential: Option<&Credential>,
        request: UpdateIssueRequest,
    ) -> ActionOutcome<Issue> {
        self.envelope
            .run_scoped(
                credential,
                request,
                |patch| self.issue_requirement(patch.issue_id, ISSUE_MANAGER_ROLES),
                |_, patch| self.update_issue_impl(patch),
            )
            .await
    }

    /// Publishes an issue; the first publication date is kept on republish.
    pub async fn publish_issue(
        &self,
        credential: Option<&Credential>,
        request: IssueTarget,
    ) -> ActionOutcome<Issue> {
        self.envelope
            .run_scoped(
                credential,
                request,
                |issue_id| self.issue_requirement(*issue_id, ISSUE_MANAGER_ROLES),
                |_, issue_id| self.set_published_impl(issue_id, true),
            )
            .await
    }

    /// Withdraws a published issue.
    pub async fn unpublish_issue(
        &self,
        credential: Option<&Credential>,
        request: IssueTarget,
    ) -> ActionOutcome<Issue> {
        self.envelope
            .run_scoped(
                credential,
                request,
                |issue_id| self.issue_requirement(*issue_id, ISSUE_MANAGER_ROLES),
                |_, issue_id| self.set_published_impl(issue_id, false),
            )
            .await
    }

    /// Deletes an issue that contains no articles.
    pub async fn delete_issue(
        &self,
        credential: Option<&Credential>,
        request: IssueTarget,
    ) -> ActionOutcome<IssueId> {
        self.envelope
            .run_scoped(
                credential,
                request,
                |issue_id| self.issue_requirement(*issue_id, JOURNAL_ADMIN_ROLES),
                |_, issue_id| self.delete_issue_impl(issue_id),
            )
            .await
    }

    async fn issue_requirement(
        &self,
        issue_id: IssueId,
        roles: &'static [RoleKind],
    ) -> AppResult<AccessRequirement> {
        let issue = self.find_issue(issue_id).await?;
        Ok(AccessRequirement::journal(issue.journal_id, roles))
    }

    async fn find_issue(&self, issue_id: IssueId) -> AppResult<Issue> {
        self.issues
            .find_issue(issue_id)
            .await?
            .ok_or_else(|| issue_not_found(issue_id))
    }

    /// Public views of the issue and its journal, when the journal can be read.
    async fn public_views(&self, issue: &Issue) -> Vec<ViewPath> {
        match self.journals.find_journal(issue.journal_id).await {
            Ok(Some(journal)) => vec![
                ViewPath::public_issue(&journal.path, issue.issue_id),
                ViewPath::journal_home(&journal.path),
            ],
            Ok(None) => Vec::new(),
            Err(error) => {
                warn!(%error, issue_id = %issue.issue_id, "journal lookup failed after issue change");
                Vec::new()
            }
        }
    }

    async fn list_issues_impl(&self, query: IssueListQuery) -> AppResult<Completed<Vec<Issue>>> {
        let issues = self.issues.list_issues(query).await?;
        Ok(Completed::read(issues))
    }

    async fn create_issue_impl(&self, new_issue: NewIssue) -> AppResult<Completed<Issue>> {
        if self
            .journals
            .find_journal(new_issue.journal_id)
            .await?
            .is_none()
        {
            return Err(AppError::NotFound(format!(
                "journal '{}' was not found",
                new_issue.journal_id
            )));
        }

        let issue = Issue {
            issue_id: IssueId::new(),
            journal_id: new_issue.journal_id,
            volume: new_issue.volume,
            number: new_issue.number,
            year: new_issue.year,
            title: new_issue.title,
            is_published: false,
            published_date: None,
            created_at: Utc::now(),
        };
        self.issues.insert_issue(&issue).await?;

        let audit = AuditDraft::new(AuditAction::IssueCreated, "issue", issue.issue_id)
            .with_details(serde_json::json!({
                "journal_id": issue.journal_id,
                "label": issue.label(),
            }));
        let list = ViewPath::admin_issues(issue.journal_id);
        Ok(Completed::changed(issue, audit).invalidating([list]))
    }

    async fn update_issue_impl(&self, patch: IssuePatch) -> AppResult<Completed<Issue>> {
        let mut issue = self.find_issue(patch.issue_id).await?;

        if let Some(volume) = patch.volume {
            issue.volume = Some(volume);
        }
        if let Some(number) = patch.number {
            issue.number = number;
        }
        if let Some(year) = patch.year {
            issue.year = Some(year);
        }
        if let Some(title) = patch.title {
            issue.title = title;
        }
        ensure_identified(
            issue.volume,
            issue.number.as_deref(),
            issue.year,
            issue.title.as_deref(),
        )?;

        if !self.issues.save_issue(&issue).await? {
            return Err(issue_not_found(issue.issue_id));
        }

        let mut views = vec![ViewPath::admin_issues(issue.journal_id)];
        views.extend(self.public_views(&issue).await.into_iter().take(1));
        let audit = AuditDraft::new(AuditAction::IssueUpdated, "issue", issue.issue_id)
            .with_details(serde_json::json!({ "label": issue.label() }));
        Ok(Completed::changed(issue, audit).invalidating(views))
    }

    async fn set_published_impl(
        &self,
        issue_id: IssueId,
        publish: bool,
    ) -> AppResult<Completed<Issue>> {
        let mut issue = self.find_issue(issue_id).await?;
        let action = if publish {
            issue.publish(Utc::now())?;
            AuditAction::IssuePublished
        } else {
            issue.unpublish()?;
            AuditAction::IssueUnpublished
        };

        if !self.issues.save_issue(&issue).await? {
            return Err(issue_not_found(issue_id));
        }

        let mut views = vec![ViewPath::admin_issues(issue.journal_id)];
        views.extend(self.public_views(&issue).await);
        let audit = AuditDraft::new(action, "issue", issue_id).with_details(serde_json::json!({
            "label": issue.label(),
            "published_date": issue.published_date,
        }));
        Ok(Completed::changed(issue, audit).invalidating(views))
    }

    async fn delete_issue_impl(&self, issue_id: IssueId) -> AppResult<Completed<IssueId>> {
        let issue = self.find_issue(issue_id).await?;
        let article_count = self.issues.count_articles(issue_id).await?;
        issue.ensure_deletable(article_count)?;

        if !self.issues.delete_issue(issue_id).await? {
            return Err(issue_not_found(issue_id));
        }

        let audit = AuditDraft::new(AuditAction::IssueDeleted, "issue", issue_id)
            .with_details(serde_json::json!({
                "journal_id": issue.journal_id,
                "label": issue.label(),
            }));
        Ok(Completed::changed(issue_id, audit)
            .invalidating([ViewPath::admin_issues(issue.journal_id)]))
    }
}
