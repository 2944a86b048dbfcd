use std::fmt::{Display, Formatter};

use scholaris_core::{AppError, AppResult, JournalId};
use serde::{Deserialize, Serialize};

use crate::{IssueId, SubmissionId};

/// Logical identifier of a cached page or listing, e.g. `/admin/journals`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ViewPath(String);

impl ViewPath {
    /// Creates a view path from an absolute path.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        if !value.starts_with('/') || value.contains(char::is_whitespace) {
            return Err(AppError::Validation(format!(
                "view path '{value}' must be absolute and contain no whitespace"
            )));
        }

        Ok(Self(value))
    }

    fn fixed(value: &'static str) -> Self {
        Self(value.to_owned())
    }

    /// Public site root.
    #[must_use]
    pub fn site_root() -> Self {
        Self::fixed("/")
    }

    /// Admin dashboard.
    #[must_use]
    pub fn admin() -> Self {
        Self::fixed("/admin")
    }

    /// Admin journal listing.
    #[must_use]
    pub fn admin_journals() -> Self {
        Self::fixed("/admin/journals")
    }

    /// Admin user listing.
    #[must_use]
    pub fn admin_users() -> Self {
        Self::fixed("/admin/users")
    }

    /// Admin API key listing.
    #[must_use]
    pub fn admin_api_keys() -> Self {
        Self::fixed("/admin/api-keys")
    }

    /// Admin site settings.
    #[must_use]
    pub fn admin_settings() -> Self {
        Self::fixed("/admin/settings")
    }

    /// Admin navigation editor.
    #[must_use]
    pub fn admin_navigation() -> Self {
        Self::fixed("/admin/navigation")
    }

    /// Admin email template listing.
    #[must_use]
    pub fn admin_email_templates() -> Self {
        Self::fixed("/admin/email-templates")
    }

    /// Admin plugin listing.
    #[must_use]
    pub fn admin_plugins() -> Self {
        Self::fixed("/admin/plugins")
    }

    /// Admin activity log.
    #[must_use]
    pub fn admin_activity() -> Self {
        Self::fixed("/admin/activity")
    }

    /// Issue listing of one journal.
    #[must_use]
    pub fn admin_issues(journal_id: JournalId) -> Self {
        Self(format!("/admin/journals/{journal_id}/issues"))
    }

    /// Submission listing of one journal.
    #[must_use]
    pub fn admin_submissions(journal_id: JournalId) -> Self {
        Self(format!("/admin/journals/{journal_id}/submissions"))
    }

    /// Review overview of one submission.
    #[must_use]
    pub fn submission_reviews(submission_id: SubmissionId) -> Self {
        Self(format!("/admin/submissions/{submission_id}/reviews"))
    }

    /// Public journal home page.
    #[must_use]
    pub fn journal_home(journal_path: &str) -> Self {
        Self(format!("/journals/{journal_path}"))
    }

    /// Public issue page.
    #[must_use]
    pub fn public_issue(journal_path: &str, issue_id: IssueId) -> Self {
        Self(format!("/journals/{journal_path}/issues/{issue_id}"))
    }

    /// Returns the path string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for ViewPath {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.0.as_str())
    }
}
