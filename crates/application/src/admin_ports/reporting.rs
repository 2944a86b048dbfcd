use std::collections::BTreeMap;

use async_trait::async_trait;
use scholaris_core::AppResult;
use scholaris_domain::Backup;
use serde::Serialize;

use crate::PageQuery;

/// Read port for the optional backups table.
#[async_trait]
pub trait BackupRepository: Send + Sync {
    /// Lists backups, newest first.
    async fn list_backups(&self, page: PageQuery) -> AppResult<Vec<Backup>>;
}

/// Counters shown on the admin dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    /// All journals.
    pub journals: u64,
    /// Journals with `is_active`.
    pub active_journals: u64,
    /// All issues.
    pub issues: u64,
    /// Published issues.
    pub published_issues: u64,
    /// Submission count per status storage value.
    pub submissions_by_status: BTreeMap<String, u64>,
    /// Review assignments still pending.
    pub pending_reviews: u64,
    /// Registered users.
    pub users: u64,
}

/// Aggregate port for dashboard counters.
#[async_trait]
pub trait DashboardRepository: Send + Sync {
    /// Computes all dashboard counters.
    async fn dashboard_stats(&self) -> AppResult<DashboardStats>;
}
