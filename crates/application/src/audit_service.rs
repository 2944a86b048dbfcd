use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use scholaris_core::{AppResult, Credential, FieldErrors};
use scholaris_domain::{AuditAction, AuditRecord, ViewPath};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::validation::{finish_fields, trimmed_optional};
use crate::{
    AccessRequirement, ActionEnvelope, ActionOutcome, AuditDraft, AuditLogQuery,
    AuditLogRepository, Completed, InputSchema, PageQuery,
};

/// Activity log listing request.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ListActivityRequest {
    /// Maximum rows returned.
    #[validate(range(min = 1, max = 200, message = "limit must be between 1 and 200"))]
    pub limit: Option<u32>,
    /// Rows skipped.
    pub offset: Option<u32>,
    /// Stored action name such as `journal.created`.
    pub action: Option<String>,
    /// Entity type such as `journal`.
    #[validate(length(max = 64, message = "entity_type must be at most 64 characters"))]
    pub entity_type: Option<String>,
}

impl InputSchema for ListActivityRequest {
    type Valid = AuditLogQuery;

    fn into_valid(self) -> AppResult<Self::Valid> {
        let mut errors = FieldErrors::default();
        let action = match trimmed_optional(self.action) {
            Some(action) => match AuditAction::from_str(&action) {
                Ok(action) => Some(action),
                Err(_) => {
                    errors.push("action", format!("unknown audit action '{action}'"));
                    None
                }
            },
            None => None,
        };
        finish_fields(errors)?;

        Ok(AuditLogQuery {
            page: PageQuery::from_parts(self.limit, self.offset),
            action,
            entity_type: trimmed_optional(self.entity_type),
        })
    }
}

/// Request deleting old activity records.
#[derive(Debug, Clone, Copy, Deserialize, Validate)]
pub struct PurgeActivityRequest {
    /// Records older than this many days are deleted.
    #[validate(range(min = 1, max = 3650, message = "days must be between 1 and 3650"))]
    pub days: u32,
}

impl InputSchema for PurgeActivityRequest {
    type Valid = u32;

    fn into_valid(self) -> AppResult<Self::Valid> {
        Ok(self.days)
    }
}

/// Result of a purge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PurgeSummary {
    /// Deleted records.
    pub deleted: u64,
    /// Records created before this instant were deleted.
    pub cutoff: DateTime<Utc>,
}

/// Activity log browsing and retention.
#[derive(Clone)]
pub struct AuditService {
    envelope: ActionEnvelope,
    audit_log: Arc<dyn AuditLogRepository>,
}

impl AuditService {
    /// Creates the service.
    #[must_use]
    pub fn new(envelope: ActionEnvelope, audit_log: Arc<dyn AuditLogRepository>) -> Self {
        Self {
            envelope,
            audit_log,
        }
    }

    /// Lists the most recent activity records.
    pub async fn list_activity(
        &self,
        credential: Option<&Credential>,
        request: ListActivityRequest,
    ) -> ActionOutcome<Vec<AuditRecord>> {
        self.envelope
            .run(
                credential,
                request,
                |_| AccessRequirement::super_admin(),
                |_, query| self.list_activity_impl(query),
            )
            .await
    }

    /// Deletes records older than the given number of days.
    pub async fn purge_activity(
        &self,
        credential: Option<&Credential>,
        request: PurgeActivityRequest,
    ) -> ActionOutcome<PurgeSummary> {
        self.envelope
            .run(
                credential,
                request,
                |_| AccessRequirement::super_admin(),
                |_, days| self.purge_activity_impl(days),
            )
            .await
    }

    async fn list_activity_impl(
        &self,
        query: AuditLogQuery,
    ) -> AppResult<Completed<Vec<AuditRecord>>> {
        let records = self.audit_log.list_recent(query).await?;
        Ok(Completed::read(records))
    }

    async fn purge_activity_impl(&self, days: u32) -> AppResult<Completed<PurgeSummary>> {
        let cutoff = Utc::now() - Duration::days(i64::from(days));
        let deleted = self.audit_log.purge_older_than(cutoff).await?;

        let summary = PurgeSummary { deleted, cutoff };
        let audit = AuditDraft::new(AuditAction::ActivityLogPurged, "activity_log", "all")
            .with_details(serde_json::json!({
                "days": days,
                "cutoff": cutoff,
                "deleted": deleted,
            }));
        Ok(Completed::changed(summary, audit)
            .invalidating([ViewPath::admin_activity(), ViewPath::admin()]))
    }
}

#[cfg(test)]
mod tests;
