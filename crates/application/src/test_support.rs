use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use scholaris_core::{
    Actor, AppError, AppResult, Credential, JournalId, TenantId, UserId,
};
use scholaris_domain::{
    ApiKey, ApiKeyId, AuditAction, AuditRecord, AuditRecordId, Backup, EmailAddress,
    EmailTemplate, EmailTemplateId, Issue, IssueId, Journal, JournalContact, NavigationMenu,
    NavigationMenuId, NavigationMenuItem, NavigationMenuItemId, PluginSetting, ReviewAssignment,
    ReviewAssignmentId, ReviewStatus, RoleAssignment, RoleAssignmentId, RoleKind, RoleScope,
    SettingScope, SiteSetting, Submission, SubmissionId, SubmissionStatus, UserAccount, ViewPath,
};
use tokio::sync::Mutex;

use crate::{
    ActionEnvelope, ActorResolver, ApiKeyRepository, AuditEvent, AuditLogQuery,
    AuditLogRepository, AuditLogger, AuditRepository, AuthorizationGuard, BackupRepository,
    DashboardRepository, DashboardStats, EmailTemplateRepository, IssueListQuery,
    IssueRepository, JournalListQuery, JournalRepository, NavigationRepository, PageQuery,
    PluginRepository, ReviewRepository, RoleAssignmentRepository, SiteSettingsRepository,
    SubmissionListQuery, SubmissionRepository, UserListQuery, UserRepository,
    ViewCacheInvalidator,
};

#[derive(Default)]
pub(crate) struct FakeState {
    pub(crate) tokens: HashMap<String, UserId>,
    pub(crate) tenants: Vec<TenantId>,
    pub(crate) users: Vec<UserAccount>,
    pub(crate) assignments: Vec<RoleAssignment>,
    pub(crate) journals: Vec<Journal>,
    pub(crate) issues: Vec<Issue>,
    pub(crate) submissions: Vec<Submission>,
    pub(crate) reviews: Vec<ReviewAssignment>,
    pub(crate) api_keys: Vec<(ApiKey, String)>,
    pub(crate) settings: Vec<SiteSetting>,
    pub(crate) menus: Vec<NavigationMenu>,
    pub(crate) menu_items: Vec<NavigationMenuItem>,
    pub(crate) templates: Vec<EmailTemplate>,
    pub(crate) plugins: Vec<PluginSetting>,
    pub(crate) audit: Vec<AuditRecord>,
    pub(crate) backups: Vec<Backup>,
}

/// Single in-process fake behind every port.
#[derive(Default)]
pub(crate) struct FakeStore {
    pub(crate) state: Mutex<FakeState>,
    pub(crate) writes: AtomicUsize,
    pub(crate) actor_lookups: AtomicUsize,
    pub(crate) fail_audit: AtomicBool,
    pub(crate) fail_journal_reads: AtomicBool,
    pub(crate) fail_submission_saves: AtomicBool,
    pub(crate) failing_menu_item: Mutex<Option<NavigationMenuItemId>>,
}

impl FakeStore {
    fn wrote(&self) {
        self.writes.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Default)]
pub(crate) struct RecordingViewCache {
    pub(crate) paths: Mutex<Vec<ViewPath>>,
    pub(crate) fail: AtomicBool,
}

#[async_trait]
impl ViewCacheInvalidator for RecordingViewCache {
    async fn invalidate(&self, paths: &[ViewPath]) -> AppResult<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::Internal("cache unreachable".to_owned()));
        }
        self.paths.lock().await.extend_from_slice(paths);
        Ok(())
    }
}

pub(crate) fn credential(token: &str) -> Credential {
    Credential::bearer(token).unwrap_or_else(|| panic!("test token must not be blank"))
}

pub(crate) struct TestWorld {
    pub(crate) store: Arc<FakeStore>,
    pub(crate) views: Arc<RecordingViewCache>,
}

impl TestWorld {
    pub(crate) fn new() -> Self {
        Self {
            store: Arc::new(FakeStore::default()),
            views: Arc::new(RecordingViewCache::default()),
        }
    }

    pub(crate) fn envelope(&self) -> ActionEnvelope {
        let guard = AuthorizationGuard::new(self.store.clone(), self.store.clone());
        ActionEnvelope::new(guard, AuditLogger::new(self.store.clone()), self.views.clone())
    }

    pub(crate) fn writes(&self) -> usize {
        self.store.writes.load(Ordering::SeqCst)
    }

    pub(crate) fn actor_lookups(&self) -> usize {
        self.store.actor_lookups.load(Ordering::SeqCst)
    }

    pub(crate) async fn add_user(&self, name: &str) -> (UserId, Credential) {
        let user_id = UserId::new();
        let email = EmailAddress::new(format!("{name}@journals.test"))
            .unwrap_or_else(|error| panic!("invalid test email: {error}"));
        let mut state = self.store.state.lock().await;
        state.users.push(UserAccount {
            user_id,
            display_name: name.to_owned(),
            email,
            is_active: true,
            roles: Vec::new(),
            created_at: Utc::now(),
        });
        let token = format!("token-{name}-{user_id}");
        state.tokens.insert(token.clone(), user_id);
        (user_id, credential(&token))
    }

    pub(crate) async fn grant(&self, user_id: UserId, role: RoleKind, scope: RoleScope) {
        self.store.state.lock().await.assignments.push(RoleAssignment {
            assignment_id: RoleAssignmentId::new(),
            user_id,
            role,
            scope,
            is_active: true,
        });
    }

    pub(crate) async fn login_as(&self, name: &str, role: RoleKind, scope: RoleScope) -> Credential {
        let (user_id, credential) = self.add_user(name).await;
        self.grant(user_id, role, scope).await;
        credential
    }

    pub(crate) async fn super_admin(&self) -> Credential {
        self.login_as("root", RoleKind::SuperAdmin, RoleScope::Global)
            .await
    }

    pub(crate) async fn seed_journal(&self, tenant_id: TenantId, path: &str) -> Journal {
        let journal = Journal {
            journal_id: JournalId::new(),
            tenant_id,
            path: path.to_owned(),
            title: format!("Journal {path}"),
            description: None,
            online_issn: None,
            print_issn: None,
            contact: JournalContact::default(),
            is_active: true,
            created_at: Utc::now(),
        };
        let mut state = self.store.state.lock().await;
        if !state.tenants.contains(&tenant_id) {
            state.tenants.push(tenant_id);
        }
        state.journals.push(journal.clone());
        journal
    }

    pub(crate) async fn seed_issue(&self, journal_id: JournalId) -> Issue {
        let issue = Issue {
            issue_id: IssueId::new(),
            journal_id,
            volume: Some(1),
            number: Some("1".to_owned()),
            year: Some(2025),
            title: None,
            is_published: false,
            published_date: None,
            created_at: Utc::now(),
        };
        self.store.state.lock().await.issues.push(issue.clone());
        issue
    }

    pub(crate) async fn seed_submission(
        &self,
        journal_id: JournalId,
        status: SubmissionStatus,
    ) -> Submission {
        let submission = Submission {
            submission_id: SubmissionId::new(),
            journal_id,
            title: "Lifetimes in Practice".to_owned(),
            abstract_text: None,
            submitter_id: UserId::new(),
            issue_id: None,
            status,
            submitted_at: None,
            updated_at: Utc::now(),
        };
        self.store
            .state
            .lock()
            .await
            .submissions
            .push(submission.clone());
        submission
    }

    pub(crate) async fn seed_audit(&self, action: AuditAction, created_at: DateTime<Utc>) {
        self.store.state.lock().await.audit.push(AuditRecord {
            record_id: AuditRecordId::new(),
            action,
            entity_type: "journal".to_owned(),
            entity_id: "seed".to_owned(),
            details: serde_json::Value::Null,
            actor_id: None,
            created_at,
        });
    }

    pub(crate) async fn audit_actions(&self) -> Vec<AuditAction> {
        self.store
            .state
            .lock()
            .await
            .audit
            .iter()
            .map(|record| record.action)
            .collect()
    }

    pub(crate) async fn invalidated(&self) -> Vec<String> {
        self.views
            .paths
            .lock()
            .await
            .iter()
            .map(|path| path.as_str().to_owned())
            .collect()
    }
}

fn page<T: Clone>(rows: Vec<T>, page: PageQuery) -> Vec<T> {
    rows.into_iter()
        .skip(page.offset as usize)
        .take(page.limit as usize)
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

#[async_trait]
impl ActorResolver for FakeStore {
    async fn resolve_actor(&self, credential: &Credential) -> AppResult<Option<Actor>> {
        self.actor_lookups.fetch_add(1, Ordering::SeqCst);
        let state = self.state.lock().await;
        let Some(user_id) = state.tokens.get(credential.token()) else {
            return Ok(None);
        };
        Ok(state
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
impl RoleAssignmentRepository for FakeStore {
    async fn list_active_assignments(&self, user_id: UserId) -> AppResult<Vec<RoleAssignment>> {
        Ok(self
            .state
            .lock()
            .await
            .assignments
            .iter()
            .filter(|assignment| assignment.user_id == user_id && assignment.is_active)
            .cloned()
            .collect())
    }

    async fn journal_tenant(&self, journal_id: JournalId) -> AppResult<Option<TenantId>> {
        Ok(self
            .state
            .lock()
            .await
            .journals
            .iter()
            .find(|journal| journal.journal_id == journal_id)
            .map(|journal| journal.tenant_id))
    }
}

#[async_trait]
impl AuditRepository for FakeStore {
    async fn append_event(&self, event: AuditEvent) -> AppResult<()> {
        if self.fail_audit.load(Ordering::SeqCst) {
            return Err(AppError::Internal("audit table is read-only".to_owned()));
        }
        self.state.lock().await.audit.push(AuditRecord {
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
impl AuditLogRepository for FakeStore {
    async fn list_recent(&self, query: AuditLogQuery) -> AppResult<Vec<AuditRecord>> {
        let mut records: Vec<AuditRecord> = self
            .state
            .lock()
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
        let mut state = self.state.lock().await;
        let before = state.audit.len();
        state.audit.retain(|record| record.created_at >= cutoff);
        Ok((before - state.audit.len()) as u64)
    }
}

#[async_trait]
impl JournalRepository for FakeStore {
    async fn list_journals(&self, query: JournalListQuery) -> AppResult<Vec<Journal>> {
        let mut journals: Vec<Journal> = self
            .state
            .lock()
            .await
            .journals
            .iter()
            .filter(|journal| query.tenant_id.is_none_or(|tenant_id| journal.tenant_id == tenant_id))
            .filter(|journal| query.include_inactive || journal.is_active)
            .cloned()
            .collect();
        journals.sort_by(|left, right| left.title.cmp(&right.title));
        Ok(page(journals, query.page))
    }

    async fn find_journal(&self, journal_id: JournalId) -> AppResult<Option<Journal>> {
        if self.fail_journal_reads.load(Ordering::SeqCst) {
            return Err(AppError::Internal("journals unreachable".to_owned()));
        }
        Ok(self
            .state
            .lock()
            .await
            .journals
            .iter()
            .find(|journal| journal.journal_id == journal_id)
            .cloned())
    }

    async fn find_journal_by_path(&self, path: &str) -> AppResult<Option<Journal>> {
        Ok(self
            .state
            .lock()
            .await
            .journals
            .iter()
            .find(|journal| journal.path == path)
            .cloned())
    }

    async fn insert_journal(&self, journal: &Journal) -> AppResult<()> {
        self.wrote();
        self.state.lock().await.journals.push(journal.clone());
        Ok(())
    }

    async fn save_journal(&self, journal: &Journal) -> AppResult<bool> {
        self.wrote();
        let mut state = self.state.lock().await;
        Ok(replace(
            &mut state.journals,
            |row| row.journal_id == journal.journal_id,
            journal.clone(),
        ))
    }

    async fn delete_journal(&self, journal_id: JournalId) -> AppResult<bool> {
        self.wrote();
        let mut state = self.state.lock().await;
        let before = state.journals.len();
        state.journals.retain(|journal| journal.journal_id != journal_id);
        Ok(state.journals.len() != before)
    }

    async fn count_issues(&self, journal_id: JournalId) -> AppResult<u64> {
        Ok(self
            .state
            .lock()
            .await
            .issues
            .iter()
            .filter(|issue| issue.journal_id == journal_id)
            .count() as u64)
    }

    async fn tenant_exists(&self, tenant_id: TenantId) -> AppResult<bool> {
        Ok(self.state.lock().await.tenants.contains(&tenant_id))
    }
}

#[async_trait]
impl IssueRepository for FakeStore {
    async fn list_issues(&self, query: IssueListQuery) -> AppResult<Vec<Issue>> {
        let issues: Vec<Issue> = self
            .state
            .lock()
            .await
            .issues
            .iter()
            .filter(|issue| issue.journal_id == query.journal_id)
            .filter(|issue| query.published.is_none_or(|published| issue.is_published == published))
            .cloned()
            .collect();
        Ok(page(issues, query.page))
    }

    async fn find_issue(&self, issue_id: IssueId) -> AppResult<Option<Issue>> {
        Ok(self
            .state
            .lock()
            .await
            .issues
            .iter()
            .find(|issue| issue.issue_id == issue_id)
            .cloned())
    }

    async fn insert_issue(&self, issue: &Issue) -> AppResult<()> {
        self.wrote();
        self.state.lock().await.issues.push(issue.clone());
        Ok(())
    }

    async fn save_issue(&self, issue: &Issue) -> AppResult<bool> {
        self.wrote();
        let mut state = self.state.lock().await;
        Ok(replace(
            &mut state.issues,
            |row| row.issue_id == issue.issue_id,
            issue.clone(),
        ))
    }

    async fn delete_issue(&self, issue_id: IssueId) -> AppResult<bool> {
        self.wrote();
        let mut state = self.state.lock().await;
        let before = state.issues.len();
        state.issues.retain(|issue| issue.issue_id != issue_id);
        Ok(state.issues.len() != before)
    }

    async fn count_articles(&self, issue_id: IssueId) -> AppResult<u64> {
        Ok(self
            .state
            .lock()
            .await
            .submissions
            .iter()
            .filter(|submission| submission.issue_id == Some(issue_id))
            .count() as u64)
    }
}

#[async_trait]
impl SubmissionRepository for FakeStore {
    async fn list_submissions(&self, query: SubmissionListQuery) -> AppResult<Vec<Submission>> {
        let submissions: Vec<Submission> = self
            .state
            .lock()
            .await
            .submissions
            .iter()
            .filter(|submission| submission.journal_id == query.journal_id)
            .filter(|submission| query.status.is_none_or(|status| submission.status == status))
            .cloned()
            .collect();
        Ok(page(submissions, query.page))
    }

    async fn find_submission(&self, submission_id: SubmissionId) -> AppResult<Option<Submission>> {
        Ok(self
            .state
            .lock()
            .await
            .submissions
            .iter()
            .find(|submission| submission.submission_id == submission_id)
            .cloned())
    }

    async fn save_submission(&self, submission: &Submission) -> AppResult<bool> {
        if self.fail_submission_saves.load(Ordering::SeqCst) {
            return Err(AppError::Internal("submissions unavailable".to_owned()));
        }
        self.wrote();
        let mut state = self.state.lock().await;
        Ok(replace(
            &mut state.submissions,
            |row| row.submission_id == submission.submission_id,
            submission.clone(),
        ))
    }
}

#[async_trait]
impl ReviewRepository for FakeStore {
    async fn list_review_assignments(
        &self,
        submission_id: SubmissionId,
    ) -> AppResult<Vec<ReviewAssignment>> {
        Ok(self
            .state
            .lock()
            .await
            .reviews
            .iter()
            .filter(|review| review.submission_id == submission_id)
            .cloned()
            .collect())
    }

    async fn find_review_assignment(
        &self,
        review_id: ReviewAssignmentId,
    ) -> AppResult<Option<ReviewAssignment>> {
        Ok(self
            .state
            .lock()
            .await
            .reviews
            .iter()
            .find(|review| review.review_id == review_id)
            .cloned())
    }

    async fn insert_review_assignment(&self, review: &ReviewAssignment) -> AppResult<()> {
        self.wrote();
        self.state.lock().await.reviews.push(review.clone());
        Ok(())
    }

    async fn save_review_assignment(&self, review: &ReviewAssignment) -> AppResult<bool> {
        self.wrote();
        let mut state = self.state.lock().await;
        Ok(replace(
            &mut state.reviews,
            |row| row.review_id == review.review_id,
            review.clone(),
        ))
    }
}

#[async_trait]
impl UserRepository for FakeStore {
    async fn list_users(&self, query: UserListQuery) -> AppResult<Vec<UserAccount>> {
        let state = self.state.lock().await;
        let needle = query.search.as_deref().map(str::to_lowercase);
        let users: Vec<UserAccount> = state
            .users
            .iter()
            .filter(|user| {
                needle.as_deref().is_none_or(|needle| {
                    user.display_name.to_lowercase().contains(needle)
                        || user.email.as_str().contains(needle)
                })
            })
            .map(|user| with_roles(user, &state.assignments))
            .collect();
        Ok(page(users, query.page))
    }

    async fn find_user(&self, user_id: UserId) -> AppResult<Option<UserAccount>> {
        let state = self.state.lock().await;
        Ok(state
            .users
            .iter()
            .find(|user| user.user_id == user_id)
            .map(|user| with_roles(user, &state.assignments)))
    }

    async fn set_user_active(&self, user_id: UserId, is_active: bool) -> AppResult<bool> {
        self.wrote();
        let mut state = self.state.lock().await;
        match state.users.iter_mut().find(|user| user.user_id == user_id) {
            Some(user) => {
                user.is_active = is_active;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn insert_role_assignment(&self, assignment: &RoleAssignment) -> AppResult<()> {
        let mut state = self.state.lock().await;
        if state.assignments.iter().any(|existing| {
            existing.user_id == assignment.user_id
                && existing.role == assignment.role
                && existing.scope == assignment.scope
        }) {
            return Err(AppError::Conflict("role already assigned".to_owned()));
        }
        self.wrote();
        state.assignments.push(assignment.clone());
        Ok(())
    }

    async fn find_role_assignment(
        &self,
        assignment_id: RoleAssignmentId,
    ) -> AppResult<Option<RoleAssignment>> {
        Ok(self
            .state
            .lock()
            .await
            .assignments
            .iter()
            .find(|assignment| assignment.assignment_id == assignment_id)
            .cloned())
    }

    async fn delete_role_assignment(&self, assignment_id: RoleAssignmentId) -> AppResult<bool> {
        self.wrote();
        let mut state = self.state.lock().await;
        let before = state.assignments.len();
        state
            .assignments
            .retain(|assignment| assignment.assignment_id != assignment_id);
        Ok(state.assignments.len() != before)
    }
}

fn with_roles(user: &UserAccount, assignments: &[RoleAssignment]) -> UserAccount {
    UserAccount {
        roles: assignments
            .iter()
            .filter(|assignment| assignment.user_id == user.user_id)
            .cloned()
            .collect(),
        ..user.clone()
    }
}

#[async_trait]
impl ApiKeyRepository for FakeStore {
    async fn list_api_keys(&self, user_id: Option<UserId>) -> AppResult<Vec<ApiKey>> {
        Ok(self
            .state
            .lock()
            .await
            .api_keys
            .iter()
            .filter(|(key, _)| user_id.is_none_or(|user_id| key.user_id == user_id))
            .map(|(key, _)| key.clone())
            .collect())
    }

    async fn find_api_key(&self, api_key_id: ApiKeyId) -> AppResult<Option<ApiKey>> {
        Ok(self
            .state
            .lock()
            .await
            .api_keys
            .iter()
            .find(|(key, _)| key.api_key_id == api_key_id)
            .map(|(key, _)| key.clone()))
    }

    async fn insert_api_key(&self, api_key: &ApiKey, secret_hash: &str) -> AppResult<()> {
        self.wrote();
        self.state
            .lock()
            .await
            .api_keys
            .push((api_key.clone(), secret_hash.to_owned()));
        Ok(())
    }

    async fn rotate_api_key_secret(
        &self,
        api_key_id: ApiKeyId,
        display_prefix: &str,
        secret_hash: &str,
    ) -> AppResult<bool> {
        self.wrote();
        let mut state = self.state.lock().await;
        match state
            .api_keys
            .iter_mut()
            .find(|(key, _)| key.api_key_id == api_key_id)
        {
            Some((key, hash)) => {
                display_prefix.clone_into(&mut key.display_prefix);
                secret_hash.clone_into(hash);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn set_api_key_enabled(&self, api_key_id: ApiKeyId, is_enabled: bool) -> AppResult<bool> {
        self.wrote();
        let mut state = self.state.lock().await;
        match state
            .api_keys
            .iter_mut()
            .find(|(key, _)| key.api_key_id == api_key_id)
        {
            Some((key, _)) => {
                key.is_enabled = is_enabled;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_api_key(&self, api_key_id: ApiKeyId) -> AppResult<bool> {
        self.wrote();
        let mut state = self.state.lock().await;
        let before = state.api_keys.len();
        state.api_keys.retain(|(key, _)| key.api_key_id != api_key_id);
        Ok(state.api_keys.len() != before)
    }
}

#[async_trait]
impl SiteSettingsRepository for FakeStore {
    async fn list_site_settings(&self, scope: SettingScope) -> AppResult<Vec<SiteSetting>> {
        let mut settings: Vec<SiteSetting> = self
            .state
            .lock()
            .await
            .settings
            .iter()
            .filter(|setting| setting.scope == scope)
            .cloned()
            .collect();
        settings.sort_by(|left, right| left.key.cmp(&right.key));
        Ok(settings)
    }

    async fn upsert_site_setting(&self, setting: &SiteSetting) -> AppResult<()> {
        self.wrote();
        let mut state = self.state.lock().await;
        let replaced = replace(
            &mut state.settings,
            |row| row.scope == setting.scope && row.key == setting.key,
            setting.clone(),
        );
        if !replaced {
            state.settings.push(setting.clone());
        }
        Ok(())
    }
}

#[async_trait]
impl NavigationRepository for FakeStore {
    async fn list_menus(&self, journal_id: Option<JournalId>) -> AppResult<Vec<NavigationMenu>> {
        Ok(self
            .state
            .lock()
            .await
            .menus
            .iter()
            .filter(|menu| menu.journal_id == journal_id)
            .cloned()
            .collect())
    }

    async fn list_menu_items(
        &self,
        menu_id: NavigationMenuId,
    ) -> AppResult<Vec<NavigationMenuItem>> {
        let mut items: Vec<NavigationMenuItem> = self
            .state
            .lock()
            .await
            .menu_items
            .iter()
            .filter(|item| item.menu_id == menu_id)
            .cloned()
            .collect();
        items.sort_by_key(|item| item.sequence);
        Ok(items)
    }

    async fn find_menu(&self, menu_id: NavigationMenuId) -> AppResult<Option<NavigationMenu>> {
        Ok(self
            .state
            .lock()
            .await
            .menus
            .iter()
            .find(|menu| menu.menu_id == menu_id)
            .cloned())
    }

    async fn insert_menu(&self, menu: &NavigationMenu) -> AppResult<()> {
        self.wrote();
        self.state.lock().await.menus.push(menu.clone());
        Ok(())
    }

    async fn delete_menu(&self, menu_id: NavigationMenuId) -> AppResult<bool> {
        self.wrote();
        let mut state = self.state.lock().await;
        let before = state.menus.len();
        state.menus.retain(|menu| menu.menu_id != menu_id);
        state.menu_items.retain(|item| item.menu_id != menu_id);
        Ok(state.menus.len() != before)
    }

    async fn insert_menu_item(&self, item: &NavigationMenuItem) -> AppResult<()> {
        self.wrote();
        self.state.lock().await.menu_items.push(item.clone());
        Ok(())
    }

    async fn update_menu_item_sequence(
        &self,
        item_id: NavigationMenuItemId,
        sequence: i32,
    ) -> AppResult<bool> {
        if *self.failing_menu_item.lock().await == Some(item_id) {
            return Err(AppError::Internal("row lock timeout".to_owned()));
        }
        self.wrote();
        let mut state = self.state.lock().await;
        match state.menu_items.iter_mut().find(|item| item.item_id == item_id) {
            Some(item) => {
                item.sequence = sequence;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl EmailTemplateRepository for FakeStore {
    async fn list_email_templates(
        &self,
        journal_id: Option<JournalId>,
    ) -> AppResult<Vec<EmailTemplate>> {
        Ok(self
            .state
            .lock()
            .await
            .templates
            .iter()
            .filter(|template| template.journal_id == journal_id)
            .cloned()
            .collect())
    }

    async fn find_email_template(
        &self,
        template_id: EmailTemplateId,
    ) -> AppResult<Option<EmailTemplate>> {
        Ok(self
            .state
            .lock()
            .await
            .templates
            .iter()
            .find(|template| template.template_id == template_id)
            .cloned())
    }

    async fn save_email_template(&self, template: &EmailTemplate) -> AppResult<bool> {
        self.wrote();
        let mut state = self.state.lock().await;
        Ok(replace(
            &mut state.templates,
            |row| row.template_id == template.template_id,
            template.clone(),
        ))
    }
}

#[async_trait]
impl PluginRepository for FakeStore {
    async fn list_plugins(&self, scope: SettingScope) -> AppResult<Vec<PluginSetting>> {
        Ok(self
            .state
            .lock()
            .await
            .plugins
            .iter()
            .filter(|plugin| plugin.scope == scope)
            .cloned()
            .collect())
    }

    async fn find_plugin(
        &self,
        plugin_name: &str,
        scope: SettingScope,
    ) -> AppResult<Option<PluginSetting>> {
        Ok(self
            .state
            .lock()
            .await
            .plugins
            .iter()
            .find(|plugin| plugin.plugin_name == plugin_name && plugin.scope == scope)
            .cloned())
    }

    async fn upsert_plugin(&self, plugin: &PluginSetting) -> AppResult<()> {
        self.wrote();
        let mut state = self.state.lock().await;
        let replaced = replace(
            &mut state.plugins,
            |row| row.plugin_name == plugin.plugin_name && row.scope == plugin.scope,
            plugin.clone(),
        );
        if !replaced {
            state.plugins.push(plugin.clone());
        }
        Ok(())
    }
}

#[async_trait]
impl BackupRepository for FakeStore {
    async fn list_backups(&self, page_query: PageQuery) -> AppResult<Vec<Backup>> {
        Ok(page(self.state.lock().await.backups.clone(), page_query))
    }
}

#[async_trait]
impl DashboardRepository for FakeStore {
    async fn dashboard_stats(&self) -> AppResult<DashboardStats> {
        let state = self.state.lock().await;
        let mut submissions_by_status = BTreeMap::new();
        for submission in &state.submissions {
            *submissions_by_status
                .entry(submission.status.as_str().to_owned())
                .or_insert(0) += 1;
        }

        Ok(DashboardStats {
            journals: state.journals.len() as u64,
            active_journals: state.journals.iter().filter(|journal| journal.is_active).count()
                as u64,
            issues: state.issues.len() as u64,
            published_issues: state.issues.iter().filter(|issue| issue.is_published).count()
                as u64,
            submissions_by_status,
            pending_reviews: state
                .reviews
                .iter()
                .filter(|review| review.status == ReviewStatus::Pending)
                .count() as u64,
            users: state.users.len() as u64,
        })
    }
}
