use async_trait::async_trait;
use scholaris_application::{
    IssueListQuery, IssueRepository, JournalListQuery, JournalRepository, ReviewRepository,
    SubmissionListQuery, SubmissionRepository,
};
use scholaris_core::{AppError, AppResult, JournalId, TenantId};
use scholaris_domain::{
    Issue, IssueId, Journal, ReviewAssignment, ReviewAssignmentId, Submission, SubmissionId,
};

use super::{InMemoryStore, count, page, replace};

#[async_trait]
impl JournalRepository for InMemoryStore {
    async fn list_journals(&self, query: JournalListQuery) -> AppResult<Vec<Journal>> {
        let mut journals: Vec<Journal> = self
            .tables
            .read()
            .await
            .journals
            .iter()
            .filter(|journal| {
                query
                    .tenant_id
                    .is_none_or(|tenant_id| journal.tenant_id == tenant_id)
            })
            .filter(|journal| query.include_inactive || journal.is_active)
            .cloned()
            .collect();
        journals.sort_by(|left, right| {
            left.title
                .cmp(&right.title)
                .then_with(|| left.path.cmp(&right.path))
        });
        Ok(page(journals, query.page))
    }

    async fn find_journal(&self, journal_id: JournalId) -> AppResult<Option<Journal>> {
        Ok(self
            .tables
            .read()
            .await
            .journals
            .iter()
            .find(|journal| journal.journal_id == journal_id)
            .cloned())
    }

    async fn find_journal_by_path(&self, path: &str) -> AppResult<Option<Journal>> {
        Ok(self
            .tables
            .read()
            .await
            .journals
            .iter()
            .find(|journal| journal.path == path)
            .cloned())
    }

    async fn insert_journal(&self, journal: &Journal) -> AppResult<()> {
        let mut tables = self.tables.write().await;
        if tables.journals.iter().any(|row| row.path == journal.path) {
            return Err(AppError::Conflict(format!(
                "journal path '{}' is already taken",
                journal.path
            )));
        }

        tables.journals.push(journal.clone());
        Ok(())
    }

    async fn save_journal(&self, journal: &Journal) -> AppResult<bool> {
        let mut tables = self.tables.write().await;
        if tables
            .journals
            .iter()
            .any(|row| row.path == journal.path && row.journal_id != journal.journal_id)
        {
            return Err(AppError::Conflict(format!(
                "journal path '{}' is already taken",
                journal.path
            )));
        }

        Ok(replace(
            &mut tables.journals,
            |row| row.journal_id == journal.journal_id,
            journal.clone(),
        ))
    }

    async fn delete_journal(&self, journal_id: JournalId) -> AppResult<bool> {
        let mut tables = self.tables.write().await;
        let has_dependents = tables.issues.iter().any(|issue| issue.journal_id == journal_id)
            || tables
                .submissions
                .iter()
                .any(|submission| submission.journal_id == journal_id);
        if has_dependents {
            return Err(AppError::Conflict(
                "cannot delete journal while it still has issues or submissions".to_owned(),
            ));
        }

        let before = tables.journals.len();
        tables.journals.retain(|journal| journal.journal_id != journal_id);
        tables.settings.retain(|setting| setting.scope.journal_id() != Some(journal_id));
        tables.plugins.retain(|plugin| plugin.scope.journal_id() != Some(journal_id));
        tables.templates.retain(|template| template.journal_id != Some(journal_id));
        Ok(tables.journals.len() != before)
    }

    async fn count_issues(&self, journal_id: JournalId) -> AppResult<u64> {
        Ok(count(
            self.tables
                .read()
                .await
                .issues
                .iter()
                .filter(|issue| issue.journal_id == journal_id),
        ))
    }

    async fn tenant_exists(&self, tenant_id: TenantId) -> AppResult<bool> {
        Ok(self.tables.read().await.tenants.contains(&tenant_id))
    }
}

#[async_trait]
impl IssueRepository for InMemoryStore {
    async fn list_issues(&self, query: IssueListQuery) -> AppResult<Vec<Issue>> {
        let mut issues: Vec<Issue> = self
            .tables
            .read()
            .await
            .issues
            .iter()
            .filter(|issue| issue.journal_id == query.journal_id)
            .filter(|issue| {
                query
                    .published
                    .is_none_or(|published| issue.is_published == published)
            })
            .cloned()
            .collect();
        // `None` orders below `Some`, so descending keeps undated issues last.
        issues.sort_by(|left, right| {
            right
                .year
                .cmp(&left.year)
                .then_with(|| right.volume.cmp(&left.volume))
                .then_with(|| right.created_at.cmp(&left.created_at))
        });
        Ok(page(issues, query.page))
    }

    async fn find_issue(&self, issue_id: IssueId) -> AppResult<Option<Issue>> {
        Ok(self
            .tables
            .read()
            .await
            .issues
            .iter()
            .find(|issue| issue.issue_id == issue_id)
            .cloned())
    }

    async fn insert_issue(&self, issue: &Issue) -> AppResult<()> {
        self.tables.write().await.issues.push(issue.clone());
        Ok(())
    }

    async fn save_issue(&self, issue: &Issue) -> AppResult<bool> {
        let mut tables = self.tables.write().await;
        Ok(replace(
            &mut tables.issues,
            |row| row.issue_id == issue.issue_id,
            issue.clone(),
        ))
    }

    async fn delete_issue(&self, issue_id: IssueId) -> AppResult<bool> {
        let mut tables = self.tables.write().await;
        if tables
            .submissions
            .iter()
            .any(|submission| submission.issue_id == Some(issue_id))
        {
            return Err(AppError::Conflict(
                "cannot delete issue while it still has articles".to_owned(),
            ));
        }

        let before = tables.issues.len();
        tables.issues.retain(|issue| issue.issue_id != issue_id);
        Ok(tables.issues.len() != before)
    }

    async fn count_articles(&self, issue_id: IssueId) -> AppResult<u64> {
        Ok(count(
            self.tables
                .read()
                .await
                .submissions
                .iter()
                .filter(|submission| submission.issue_id == Some(issue_id)),
        ))
    }
}

#[async_trait]
impl SubmissionRepository for InMemoryStore {
    async fn list_submissions(&self, query: SubmissionListQuery) -> AppResult<Vec<Submission>> {
        let mut submissions: Vec<Submission> = self
            .tables
            .read()
            .await
            .submissions
            .iter()
            .filter(|submission| submission.journal_id == query.journal_id)
            .filter(|submission| query.status.is_none_or(|status| submission.status == status))
            .cloned()
            .collect();
        submissions.sort_by(|left, right| right.updated_at.cmp(&left.updated_at));
        Ok(page(submissions, query.page))
    }

    async fn find_submission(&self, submission_id: SubmissionId) -> AppResult<Option<Submission>> {
        Ok(self
            .tables
            .read()
            .await
            .submissions
            .iter()
            .find(|submission| submission.submission_id == submission_id)
            .cloned())
    }

    async fn save_submission(&self, submission: &Submission) -> AppResult<bool> {
        let mut tables = self.tables.write().await;
        Ok(replace(
            &mut tables.submissions,
            |row| row.submission_id == submission.submission_id,
            submission.clone(),
        ))
    }
}

#[async_trait]
impl ReviewRepository for InMemoryStore {
    async fn list_review_assignments(
        &self,
        submission_id: SubmissionId,
    ) -> AppResult<Vec<ReviewAssignment>> {
        let mut reviews: Vec<ReviewAssignment> = self
            .tables
            .read()
            .await
            .reviews
            .iter()
            .filter(|review| review.submission_id == submission_id)
            .cloned()
            .collect();
        reviews.sort_by_key(|review| review.assigned_at);
        Ok(reviews)
    }

    async fn find_review_assignment(
        &self,
        review_id: ReviewAssignmentId,
    ) -> AppResult<Option<ReviewAssignment>> {
        Ok(self
            .tables
            .read()
            .await
            .reviews
            .iter()
            .find(|review| review.review_id == review_id)
            .cloned())
    }

    async fn insert_review_assignment(&self, review: &ReviewAssignment) -> AppResult<()> {
        self.tables.write().await.reviews.push(review.clone());
        Ok(())
    }

    async fn save_review_assignment(&self, review: &ReviewAssignment) -> AppResult<bool> {
        let mut tables = self.tables.write().await;
        Ok(replace(
            &mut tables.reviews,
            |row| row.review_id == review.review_id,
            review.clone(),
        ))
    }
}
