use std::collections::BTreeMap;

use async_trait::async_trait;
use scholaris_application::{
    ApiKeyRepository, BackupRepository, DashboardRepository, DashboardStats,
    EmailTemplateRepository, NavigationRepository, PageQuery, PluginRepository,
    SiteSettingsRepository, UserListQuery, UserRepository,
};
use scholaris_core::{AppError, AppResult, JournalId, UserId};
use scholaris_domain::{
    ApiKey, ApiKeyId, Backup, EmailTemplate, EmailTemplateId, NavigationMenu, NavigationMenuId,
    NavigationMenuItem, NavigationMenuItemId, PluginSetting, ReviewStatus, RoleAssignment,
    RoleAssignmentId, SettingScope, SiteSetting, UserAccount,
};

use super::{InMemoryStore, count, page, replace};

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
impl UserRepository for InMemoryStore {
    async fn list_users(&self, query: UserListQuery) -> AppResult<Vec<UserAccount>> {
        let tables = self.tables.read().await;
        let needle = query.search.as_deref().map(str::to_lowercase);
        let mut users: Vec<UserAccount> = tables
            .users
            .iter()
            .filter(|user| {
                needle.as_deref().is_none_or(|needle| {
                    user.display_name.to_lowercase().contains(needle)
                        || user.email.as_str().to_lowercase().contains(needle)
                })
            })
            .map(|user| with_roles(user, &tables.assignments))
            .collect();
        users.sort_by(|left, right| {
            left.display_name
                .cmp(&right.display_name)
                .then_with(|| left.email.as_str().cmp(right.email.as_str()))
        });
        Ok(page(users, query.page))
    }

    async fn find_user(&self, user_id: UserId) -> AppResult<Option<UserAccount>> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .iter()
            .find(|user| user.user_id == user_id)
            .map(|user| with_roles(user, &tables.assignments)))
    }

    async fn set_user_active(&self, user_id: UserId, is_active: bool) -> AppResult<bool> {
        let mut tables = self.tables.write().await;
        match tables.users.iter_mut().find(|user| user.user_id == user_id) {
            Some(user) => {
                user.is_active = is_active;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn insert_role_assignment(&self, assignment: &RoleAssignment) -> AppResult<()> {
        let mut tables = self.tables.write().await;
        if tables.assignments.iter().any(|existing| {
            existing.user_id == assignment.user_id
                && existing.role == assignment.role
                && existing.scope == assignment.scope
        }) {
            return Err(AppError::Conflict(
                "the user already holds this role in this scope".to_owned(),
            ));
        }

        tables.assignments.push(assignment.clone());
        Ok(())
    }

    async fn find_role_assignment(
        &self,
        assignment_id: RoleAssignmentId,
    ) -> AppResult<Option<RoleAssignment>> {
        Ok(self
            .tables
            .read()
            .await
            .assignments
            .iter()
            .find(|assignment| assignment.assignment_id == assignment_id)
            .cloned())
    }

    async fn delete_role_assignment(&self, assignment_id: RoleAssignmentId) -> AppResult<bool> {
        let mut tables = self.tables.write().await;
        let before = tables.assignments.len();
        tables
            .assignments
            .retain(|assignment| assignment.assignment_id != assignment_id);
        Ok(tables.assignments.len() != before)
    }
}

#[async_trait]
impl ApiKeyRepository for InMemoryStore {
    async fn list_api_keys(&self, user_id: Option<UserId>) -> AppResult<Vec<ApiKey>> {
        let mut keys: Vec<ApiKey> = self
            .tables
            .read()
            .await
            .api_keys
            .iter()
            .filter(|(key, _)| user_id.is_none_or(|user_id| key.user_id == user_id))
            .map(|(key, _)| key.clone())
            .collect();
        keys.sort_by(|left, right| right.created_at.cmp(&left.created_at));
        Ok(keys)
    }

    async fn find_api_key(&self, api_key_id: ApiKeyId) -> AppResult<Option<ApiKey>> {
        Ok(self
            .tables
            .read()
            .await
            .api_keys
            .iter()
            .find(|(key, _)| key.api_key_id == api_key_id)
            .map(|(key, _)| key.clone()))
    }

    async fn insert_api_key(&self, api_key: &ApiKey, secret_hash: &str) -> AppResult<()> {
        let mut tables = self.tables.write().await;
        if tables.api_keys.iter().any(|(_, hash)| hash == secret_hash) {
            return Err(AppError::Conflict(
                "an API key with this secret already exists".to_owned(),
            ));
        }

        tables
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
        let mut tables = self.tables.write().await;
        match tables
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
        let mut tables = self.tables.write().await;
        match tables
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
        let mut tables = self.tables.write().await;
        let before = tables.api_keys.len();
        tables
            .api_keys
            .retain(|(key, _)| key.api_key_id != api_key_id);
        Ok(tables.api_keys.len() != before)
    }
}

#[async_trait]
impl SiteSettingsRepository for InMemoryStore {
    async fn list_site_settings(&self, scope: SettingScope) -> AppResult<Vec<SiteSetting>> {
        let mut settings: Vec<SiteSetting> = self
            .tables
            .read()
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
        let mut tables = self.tables.write().await;
        let replaced = replace(
            &mut tables.settings,
            |row| row.scope == setting.scope && row.key == setting.key,
            setting.clone(),
        );
        if !replaced {
            tables.settings.push(setting.clone());
        }
        Ok(())
    }
}

#[async_trait]
impl NavigationRepository for InMemoryStore {
    async fn list_menus(&self, journal_id: Option<JournalId>) -> AppResult<Vec<NavigationMenu>> {
        let mut menus: Vec<NavigationMenu> = self
            .tables
            .read()
            .await
            .menus
            .iter()
            .filter(|menu| menu.journal_id == journal_id)
            .cloned()
            .collect();
        menus.sort_by(|left, right| {
            left.area
                .cmp(&right.area)
                .then_with(|| left.title.cmp(&right.title))
        });
        Ok(menus)
    }

    async fn list_menu_items(
        &self,
        menu_id: NavigationMenuId,
    ) -> AppResult<Vec<NavigationMenuItem>> {
        let mut items: Vec<NavigationMenuItem> = self
            .tables
            .read()
            .await
            .menu_items
            .iter()
            .filter(|item| item.menu_id == menu_id)
            .cloned()
            .collect();
        items.sort_by(|left, right| {
            left.sequence
                .cmp(&right.sequence)
                .then_with(|| left.label.cmp(&right.label))
        });
        Ok(items)
    }

    async fn find_menu(&self, menu_id: NavigationMenuId) -> AppResult<Option<NavigationMenu>> {
        Ok(self
            .tables
            .read()
            .await
            .menus
            .iter()
            .find(|menu| menu.menu_id == menu_id)
            .cloned())
    }

    async fn insert_menu(&self, menu: &NavigationMenu) -> AppResult<()> {
        self.tables.write().await.menus.push(menu.clone());
        Ok(())
    }

    async fn delete_menu(&self, menu_id: NavigationMenuId) -> AppResult<bool> {
        let mut tables = self.tables.write().await;
        let before = tables.menus.len();
        tables.menus.retain(|menu| menu.menu_id != menu_id);
        tables.menu_items.retain(|item| item.menu_id != menu_id);
        Ok(tables.menus.len() != before)
    }

    async fn insert_menu_item(&self, item: &NavigationMenuItem) -> AppResult<()> {
        self.tables.write().await.menu_items.push(item.clone());
        Ok(())
    }

    async fn update_menu_item_sequence(
        &self,
        item_id: NavigationMenuItemId,
        sequence: i32,
    ) -> AppResult<bool> {
        let mut tables = self.tables.write().await;
        match tables
            .menu_items
            .iter_mut()
            .find(|item| item.item_id == item_id)
        {
            Some(item) => {
                item.sequence = sequence;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl EmailTemplateRepository for InMemoryStore {
    async fn list_email_templates(
        &self,
        journal_id: Option<JournalId>,
    ) -> AppResult<Vec<EmailTemplate>> {
        let mut templates: Vec<EmailTemplate> = self
            .tables
            .read()
            .await
            .templates
            .iter()
            .filter(|template| template.journal_id == journal_id)
            .cloned()
            .collect();
        templates.sort_by(|left, right| left.key.cmp(&right.key));
        Ok(templates)
    }

    async fn find_email_template(
        &self,
        template_id: EmailTemplateId,
    ) -> AppResult<Option<EmailTemplate>> {
        Ok(self
            .tables
            .read()
            .await
            .templates
            .iter()
            .find(|template| template.template_id == template_id)
            .cloned())
    }

    async fn save_email_template(&self, template: &EmailTemplate) -> AppResult<bool> {
        let mut tables = self.tables.write().await;
        Ok(replace(
            &mut tables.templates,
            |row| row.template_id == template.template_id,
            template.clone(),
        ))
    }
}

#[async_trait]
impl PluginRepository for InMemoryStore {
    async fn list_plugins(&self, scope: SettingScope) -> AppResult<Vec<PluginSetting>> {
        let mut plugins: Vec<PluginSetting> = self
            .tables
            .read()
            .await
            .plugins
            .iter()
            .filter(|plugin| plugin.scope == scope)
            .cloned()
            .collect();
        plugins.sort_by(|left, right| left.plugin_name.cmp(&right.plugin_name));
        Ok(plugins)
    }

    async fn find_plugin(
        &self,
        plugin_name: &str,
        scope: SettingScope,
    ) -> AppResult<Option<PluginSetting>> {
        Ok(self
            .tables
            .read()
            .await
            .plugins
            .iter()
            .find(|plugin| plugin.plugin_name == plugin_name && plugin.scope == scope)
            .cloned())
    }

    async fn upsert_plugin(&self, plugin: &PluginSetting) -> AppResult<()> {
        let mut tables = self.tables.write().await;
        let replaced = replace(
            &mut tables.plugins,
            |row| row.plugin_name == plugin.plugin_name && row.scope == plugin.scope,
            plugin.clone(),
        );
        if !replaced {
            tables.plugins.push(plugin.clone());
        }
        Ok(())
    }
}

#[async_trait]
impl BackupRepository for InMemoryStore {
    async fn list_backups(&self, page_query: PageQuery) -> AppResult<Vec<Backup>> {
        let mut backups = self.tables.read().await.backups.clone();
        backups.sort_by(|left, right| right.created_at.cmp(&left.created_at));
        Ok(page(backups, page_query))
    }
}

#[async_trait]
impl DashboardRepository for InMemoryStore {
    async fn dashboard_stats(&self) -> AppResult<DashboardStats> {
        let tables = self.tables.read().await;
        let mut submissions_by_status: BTreeMap<String, u64> = BTreeMap::new();
        for submission in &tables.submissions {
            *submissions_by_status
                .entry(submission.status.as_str().to_owned())
                .or_default() += 1;
        }

        Ok(DashboardStats {
            journals: count(tables.journals.iter()),
            active_journals: count(tables.journals.iter().filter(|journal| journal.is_active)),
            issues: count(tables.issues.iter()),
            published_issues: count(tables.issues.iter().filter(|issue| issue.is_published)),
            submissions_by_status,
            pending_reviews: count(
                tables
                    .reviews
                    .iter()
                    .filter(|review| review.status == ReviewStatus::Pending),
            ),
            users: count(tables.users.iter()),
        })
    }
}
