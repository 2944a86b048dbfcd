use async_trait::async_trait;
use scholaris_core::{AppResult, JournalId};
use scholaris_domain::{
    EmailTemplate, EmailTemplateId, NavigationMenu, NavigationMenuId, NavigationMenuItem,
    NavigationMenuItemId, PluginSetting, SettingScope, SiteSetting,
};

/// Repository port for key/value site settings.
#[async_trait]
pub trait SiteSettingsRepository: Send + Sync {
    /// Lists settings of one scope ordered by key.
    async fn list_site_settings(&self, scope: SettingScope) -> AppResult<Vec<SiteSetting>>;

    /// Inserts or replaces one setting.
    async fn upsert_site_setting(&self, setting: &SiteSetting) -> AppResult<()>;
}

/// Repository port for navigation menus and items.
#[async_trait]
pub trait NavigationRepository: Send + Sync {
    /// Lists menus of a journal, or site menus when `journal_id` is `None`.
    async fn list_menus(&self, journal_id: Option<JournalId>) -> AppResult<Vec<NavigationMenu>>;

    /// Lists items of one menu ordered by sequence.
    async fn list_menu_items(&self, menu_id: NavigationMenuId)
    -> AppResult<Vec<NavigationMenuItem>>;

    /// Finds one menu.
    async fn find_menu(&self, menu_id: NavigationMenuId) -> AppResult<Option<NavigationMenu>>;

    /// Inserts a menu.
    async fn insert_menu(&self, menu: &NavigationMenu) -> AppResult<()>;

    /// Deletes a menu and, by cascade, its items.
    async fn delete_menu(&self, menu_id: NavigationMenuId) -> AppResult<bool>;

    /// Inserts an item.
    async fn insert_menu_item(&self, item: &NavigationMenuItem) -> AppResult<()>;

    /// Stores one item position, returning `false` when the item does not exist.
    async fn update_menu_item_sequence(
        &self,
        item_id: NavigationMenuItemId,
        sequence: i32,
    ) -> AppResult<bool>;
}

/// Repository port for email templates.
#[async_trait]
pub trait EmailTemplateRepository: Send + Sync {
    /// Lists templates of a journal, or site defaults when `journal_id` is `None`.
    async fn list_email_templates(
        &self,
        journal_id: Option<JournalId>,
    ) -> AppResult<Vec<EmailTemplate>>;

    /// Finds one template.
    async fn find_email_template(
        &self,
        template_id: EmailTemplateId,
    ) -> AppResult<Option<EmailTemplate>>;

    /// Overwrites a template row, returning `false` when it does not exist.
    async fn save_email_template(&self, template: &EmailTemplate) -> AppResult<bool>;
}

/// Repository port for plugin settings.
#[async_trait]
pub trait PluginRepository: Send + Sync {
    /// Lists plugin rows of one scope ordered by name.
    async fn list_plugins(&self, scope: SettingScope) -> AppResult<Vec<PluginSetting>>;

    /// Finds the row of one plugin in one scope.
    async fn find_plugin(
        &self,
        plugin_name: &str,
        scope: SettingScope,
    ) -> AppResult<Option<PluginSetting>>;

    /// Inserts or replaces one plugin row.
    async fn upsert_plugin(&self, plugin: &PluginSetting) -> AppResult<()>;
}
