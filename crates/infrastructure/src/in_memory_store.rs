//! In-process adapter behind every storage port.
//!
//! Backs local runs without PostgreSQL and the API router tests. Tokens are
//! keyed by credential fingerprint, as in the `access_tokens` table.

mod administration;
mod editorial;

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use scholaris_application::{
    ActorResolver, AuditEvent, AuditLogQuery, AuditLogRepository, AuditRepository, PageQuery,
    RoleAssignmentRepository,
};
use scholaris_core::{Actor, AppError, AppResult, Credential, JournalId, TenantId, UserId};
use scholaris_domain::{
    ApiKey, AuditRecord, AuditRecordId, Backup, EmailAddress, EmailTemplate, Issue, Journal,
    NavigationMenu, NavigationMenuItem, PluginSetting, ReviewAssignment, RoleAssignment,
    RoleAssignmentId, RoleKind, RoleScope, SiteSetting, Submission, UserAccount,
};
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct StoreTables {
    tokens: HashMap<String, (UserId, Option<DateTime<Utc>>)>,
    tenants: Vec<TenantId>,
    users: Vec<UserAccount>,
    assignments: Vec<RoleAssignment>,
    journals: Vec<Journal>,
    issues: Vec<Issue>,
    submissions: Vec<Submission>,
    reviews: Vec<ReviewAssignment>,
    api_keys: Vec<(ApiKey, String)>,
    settings: Vec<SiteSetting>,
    menus: Vec<NavigationMenu>,
    menu_items: Vec<NavigationMenuItem>,
    templates: Vec<EmailTemplate>,
    plugins: Vec<PluginSetting>,
    audit: Vec<AuditRecord>,
    backups: Vec<Backup>,
}

/// In-memory implementation of every repository port.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    tables: RwLock<StoreTables>,
}

impl InMemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a tenant.
    pub async fn insert_tenant(&self, tenant_id: TenantId) {
        let mut tables = self.tables.write().await;
        if !tables.tenants.contains(&tenant_id) {
            tables.tenants.push(tenant_id);
        }
    }

    /// Registers an active user account.
    pub async fn insert_user(&self, display_name: &str, email: &str) -> AppResult<UserId> {
        let email = EmailAddress::new(email)?;
        let mut tables = self.tables.write().await;
        if tables
            .users
            .iter()
            .any(|user| user.email.as_str() == email.as_str())
        {
            return Err(AppError::Conflict(format!(
                "email '{}' is already registered",
                email.as_str()
            )));
        }

        let user_id = UserId::new();
        tables.users.push(UserAccount {
            user_id,
            display_name: display_name.to_owned(),
            email,
            is_active: true,
            roles: Vec::new(),
            created_at: Utc::now(),
        });
        Ok(user_id)
    }

    /// Stores an access token for a user.
    pub async fn issue_token(
        &self,
        user_id: UserId,
        credential: &Credential,
        expires_at: Option<DateTime<Utc>>,
    ) {
        self.tables
            .write()
            .await
            .tokens
            .insert(credential.fingerprint(), (user_id, expires_at));
    }

    /// Grants an active role assignment.
    pub async fn grant_role(
        &self,
        user_id: UserId,
        role: RoleKind,
        scope: RoleScope,
    ) -> RoleAssignmentId {
        let assignment_id = RoleAssignmentId::new();
        self.tables.write().await.assignments.push(RoleAssignment {
            assignment_id,
            user_id,
            role,
            scope,
            is_active: true,
        });
        assignment_id
    }

    /// Seeds a shipped email template.
    pub async fn insert_email_template(&self, template: EmailTemplate) {
        self.tables.write().await.templates.push(template);
    }

    /// Seeds a submission.
    pub async fn insert_submission(&self, submission: Submission) {
        self.tables.write().await.submissions.push(submission);
    }

    /// Seeds a backup row.
    pub async fn insert_backup(&self, backup: Backup) {
        self.tables.write().await.backups.push(backup);
    }
}

fn page<T>(rows: Vec<T>, page: PageQuery) -> Vec<T> {
    rows.into_iter()
        .skip(usize::try_from(page.offset).unwrap_or(usize::MAX))
        .take(usize::try_from(page.limit).unwrap_or(usize::MAX))
        .collect()
}

fn replace<T>(rows: &mut [T], matches: impl Fn(&T) -> bool, value: T) -> bool {
    match rows.iter_mut().find(|row| matches(row)) {
        Some(row) => {
            *row = value;
            true
        }
        None => false,
    }
}

fn count<T>(rows: impl Iterator<Item = T>) -> u64 {
    u64::try_from(rows.count()).unwrap_or(u64::MAX)
}

#[async_trait]
impl ActorResolver for InMemoryStore {
    async fn resolve_actor(&self, credential: &Credential) -> AppResult<Option<Actor>> {
        let tables = self.tables.read().await;
        let Some((user_id, expires_at)) = tables.tokens.get(&credential.fingerprint()) else {
            return Ok(None);
        };
        if expires_at.is_some_and(|expires_at| expires_at <= Utc::now()) {
            return Ok(None);
        }

        Ok(tables
            .users
            .iter()
            .find(|user| user.user_id == *user_id && user.is_active)
            .map(|user| {
                Actor::new(
                    user.user_id,
                    user.display_name.clone(),
                    Some(user.email.as_str().to_owned()),
                )
            }))
    }
}

#[async_trait]
impl RoleAssignmentRepository for InMemoryStore {
    async fn list_active_assignments(&self, user_id: UserId) -> AppResult<Vec<RoleAssignment>> {
        Ok(self
            .tables
            .read()
            .await
            .assignments
            .iter()
            .filter(|assignment| assignment.user_id == user_id && assignment.is_active)
            .cloned()
            .collect())
    }

    async fn journal_tenant(&self, journal_id: JournalId) -> AppResult<Option<TenantId>> {
        Ok(self
            .tables
            .read()
            .await
            .journals
            .iter()
            .find(|journal| journal.journal_id == journal_id)
            .map(|journal| journal.tenant_id))
    }
}

#[async_trait]
impl AuditRepository for InMemoryStore {
    async fn append_event(&self, event: AuditEvent) -> AppResult<()> {
        self.tables.write().await.audit.push(AuditRecord {
            record_id: AuditRecordId::new(),
            action: event.action,
            entity_type: event.entity_type,
            entity_id: event.entity_id,
            details: event.details,
            actor_id: event.actor_id,
            created_at: Utc::now(),
        });
        Ok(())
    }
}

#[async_trait]
impl AuditLogRepository for InMemoryStore {
    async fn list_recent(&self, query: AuditLogQuery) -> AppResult<Vec<AuditRecord>> {
        let mut records: Vec<AuditRecord> = self
            .tables
            .read()
            .await
            .audit
            .iter()
            .filter(|record| query.action.is_none_or(|action| record.action == action))
            .filter(|record| {
                query
                    .entity_type
                    .as_deref()
                    .is_none_or(|entity_type| record.entity_type == entity_type)
            })
            .cloned()
            .collect();
        records.sort_by(|left, right| right.created_at.cmp(&left.created_at));
        Ok(page(records, query.page))
    }

    async fn purge_older_than(&self, cutoff: DateTime<Utc>) -> AppResult<u64> {
        let mut tables = self.tables.write().await;
        let before = tables.audit.len();
        tables.audit.retain(|record| record.created_at >= cutoff);
        Ok(count(0..before - tables.audit.len()))
    }
}
