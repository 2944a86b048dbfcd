use async_trait::async_trait;
use scholaris_core::{AppResult, JournalId};
use scholaris_domain::{Issue, IssueId};

use crate::PageQuery;

/// Filters for issue listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IssueListQuery {
    /// Owning journal.
    pub journal_id: JournalId,
    /// Restrict to published or unpublished issues.
    pub published: Option<bool>,
    /// Pagination window.
    pub page: PageQuery,
}

/// Repository port for issues.
#[async_trait]
pub trait IssueRepository: Send + Sync {
    /// Lists issues, newest year and volume first.
    async fn list_issues(&self, query: IssueListQuery) -> AppResult<Vec<Issue>>;

    /// Finds one issue.
    async fn find_issue(&self, issue_id: IssueId) -> AppResult<Option<Issue>>;

    /// Inserts an issue.
    async fn insert_issue(&self, issue: &Issue) -> AppResult<()>;

    /// Overwrites an issue row, returning `false` when it does not exist.
    async fn save_issue(&self, issue: &Issue) -> AppResult<bool>;

    /// Deletes an issue, returning `false` when it does not exist.
    async fn delete_issue(&self, issue_id: IssueId) -> AppResult<bool>;

    /// Counts submissions scheduled in an issue.
    async fn count_articles(&self, issue_id: IssueId) -> AppResult<u64>;
}
