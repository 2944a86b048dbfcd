use async_trait::async_trait;
use scholaris_core::{AppResult, JournalId, TenantId};
use scholaris_domain::Journal;

use crate::PageQuery;

/// Filters for journal listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct JournalListQuery {
    /// Restrict to one tenant.
    pub tenant_id: Option<TenantId>,
    /// Include deactivated journals.
    pub include_inactive: bool,
    /// Pagination window.
    pub page: PageQuery,
}

/// Repository port for journals.
#[async_trait]
pub trait JournalRepository: Send + Sync {
    /// Lists journals ordered by title.
    async fn list_journals(&self, query: JournalListQuery) -> AppResult<Vec<Journal>>;

    /// Finds one journal.
    async fn find_journal(&self, journal_id: JournalId) -> AppResult<Option<Journal>>;

    /// Finds a journal by its unique URL path.
    async fn find_journal_by_path(&self, path: &str) -> AppResult<Option<Journal>>;

    /// Inserts a journal; a taken path is a conflict.
    async fn insert_journal(&self, journal: &Journal) -> AppResult<()>;

    /// Overwrites a journal row, returning `false` when it does not exist.
    async fn save_journal(&self, journal: &Journal) -> AppResult<bool>;

    /// Deletes a journal, returning `false` when it does not exist.
    async fn delete_journal(&self, journal_id: JournalId) -> AppResult<bool>;

    /// Counts issues owned by a journal.
    async fn count_issues(&self, journal_id: JournalId) -> AppResult<u64>;

    /// Returns whether a tenant exists.
    async fn tenant_exists(&self, tenant_id: TenantId) -> AppResult<bool>;
}
