use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use scholaris_core::{AppResult, UserId};
use scholaris_domain::{AuditAction, AuditRecord};
use tracing::warn;

use crate::PageQuery;

/// Audit payload emitted by application services.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEvent {
    /// Stable action identifier.
    pub action: AuditAction,
    /// Entity type label.
    pub entity_type: String,
    /// Entity identifier.
    pub entity_id: String,
    /// Structured details.
    pub details: serde_json::Value,
    /// Acting user.
    pub actor_id: Option<UserId>,
}

/// Port for persisting append-only audit events.
#[async_trait]
pub trait AuditRepository: Send + Sync {
    /// Persists one audit event.
    async fn append_event(&self, event: AuditEvent) -> AppResult<()>;
}

/// Filters for activity listings.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AuditLogQuery {
    /// Pagination window.
    pub page: PageQuery,
    /// Optional action filter.
    pub action: Option<AuditAction>,
    /// Optional entity type filter.
    pub entity_type: Option<String>,
}

/// Read and maintenance port for the activity log.
#[async_trait]
pub trait AuditLogRepository: Send + Sync {
    /// Lists most recent records first.
    async fn list_recent(&self, query: AuditLogQuery) -> AppResult<Vec<AuditRecord>>;

    /// Deletes records created strictly before `cutoff`, returning the count.
    async fn purge_older_than(&self, cutoff: DateTime<Utc>) -> AppResult<u64>;
}

/// Best-effort audit writer.
#[derive(Clone)]
pub struct AuditLogger {
    repository: Arc<dyn AuditRepository>,
}

impl AuditLogger {
    /// Creates a logger over an audit repository.
    #[must_use]
    pub fn new(repository: Arc<dyn AuditRepository>) -> Self {
        Self { repository }
    }

    /// Appends an event; failures are logged and swallowed.
    pub async fn record(&self, event: AuditEvent) {
        let action = event.action.as_str();
        let entity_id = event.entity_id.clone();
        if let Err(error) = self.repository.append_event(event).await {
            warn!(%error, action, entity_id = %entity_id, "failed to append audit event");
        }
    }
}
