//! Navigation menus of the site and of individual journals.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use scholaris_core::{AppError, AppResult, Credential, FieldErrors, JournalId};
use scholaris_domain::{
    AuditAction, MenuItemSequence, NavigationMenu, NavigationMenuId, NavigationMenuItem,
    NavigationMenuItemId, ViewPath,
};
use serde::{Deserialize, Serialize};
use tokio::task::JoinSet;
use tracing::warn;
use validator::Validate;

use crate::validation::{check_field, finish_fields, trimmed_required};
use crate::{
    AccessRequirement, ActionEnvelope, ActionOutcome, AuditDraft, Completed, InputSchema,
    JOURNAL_ADMIN_ROLES, JournalRepository, NavigationRepository,
};

/// Menu together with its items ordered by sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MenuWithItems {
    /// Menu row.
    #[serde(flatten)]
    pub menu: NavigationMenu,
    /// Items of the menu.
    pub items: Vec<NavigationMenuItem>,
}

/// Listing request for menus of one scope.
#[derive(Debug, Clone, Copy, Default, Deserialize, Validate)]
pub struct ListMenusRequest {
    /// Journal scope; site menus when absent.
    pub journal_id: Option<JournalId>,
}

impl InputSchema for ListMenusRequest {
    type Valid = Option<JournalId>;

    fn into_valid(self) -> AppResult<Self::Valid> {
        Ok(self.journal_id)
    }
}

/// Request addressing one menu.
#[derive(Debug, Clone, Copy, Deserialize, Validate)]
pub struct MenuTarget {
    /// Menu identifier.
    pub menu_id: NavigationMenuId,
}

impl InputSchema for MenuTarget {
    type Valid = NavigationMenuId;

    fn into_valid(self) -> AppResult<Self::Valid> {
        Ok(self.menu_id)
    }
}

/// Request creating a menu.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateMenuRequest {
    /// Journal scope; site-wide when absent.
    pub journal_id: Option<JournalId>,
    /// Menu title.
    #[validate(length(min = 1, max = 100, message = "title must be 1 to 100 characters"))]
    pub title: String,
    /// Template area such as `primary`.
    #[validate(length(min = 1, max = 64, message = "area must be 1 to 64 characters"))]
    pub area: String,
}

/// Sanitized menu values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMenu {
    journal_id: Option<JournalId>,
    title: String,
    area: String,
}

impl InputSchema for CreateMenuRequest {
    type Valid = NewMenu;

    fn into_valid(self) -> AppResult<Self::Valid> {
        let area = self.area.trim().to_lowercase();
        let mut errors = FieldErrors::default();
        if area.is_empty()
            || !area
                .chars()
                .all(|character| character.is_ascii_lowercase() || character == '_')
        {
            errors.push("area", "area may only contain lowercase letters and underscores");
        }
        finish_fields(errors)?;

        Ok(NewMenu {
            journal_id: self.journal_id,
            title: trimmed_required("title", self.title)?,
            area,
        })
    }
}

/// Request adding an item to a menu.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateMenuItemRequest {
    /// Owning menu.
    pub menu_id: NavigationMenuId,
    /// Parent item of the same menu.
    pub parent_id: Option<NavigationMenuItemId>,
    /// Link label.
    #[validate(length(min = 1, max = 255, message = "label must be 1 to 255 characters"))]
    pub label: String,
    /// Relative path or http(s) URL.
    #[validate(length(min = 1, max = 2048, message = "url must be 1 to 2048 characters"))]
    pub url: String,
    /// Position; appended after the last item when absent.
    #[validate(range(min = 0, message = "sequence must not be negative"))]
    pub sequence: Option<i32>,
}

/// Sanitized menu item values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMenuItem {
    menu_id: NavigationMenuId,
    parent_id: Option<NavigationMenuItemId>,
    label: String,
    url: String,
    sequence: Option<i32>,
}

impl InputSchema for CreateMenuItemRequest {
    type Valid = NewMenuItem;

    fn into_valid(self) -> AppResult<Self::Valid> {
        let url = self.url.trim().to_owned();
        let mut errors = FieldErrors::default();
        check_field(&mut errors, "url", NavigationMenuItem::validate_url(&url));
        finish_fields(errors)?;

        Ok(NewMenuItem {
            menu_id: self.menu_id,
            parent_id: self.parent_id,
            label: trimmed_required("label", self.label)?,
            url,
            sequence: self.sequence,
        })
    }
}

/// New position of one item.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Validate)]
pub struct SequenceEntry {
    /// Item to move.
    pub item_id: NavigationMenuItemId,
    /// New position.
    #[validate(range(min = 0, message = "sequence must not be negative"))]
    pub sequence: i32,
}

/// Request storing new positions for several items of one menu.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ReorderMenuItemsRequest {
    /// Owning menu.
    pub menu_id: NavigationMenuId,
    /// Item positions, in any order.
    #[validate(
        length(min = 1, max = 500, message = "between 1 and 500 items are required"),
        nested
    )]
    pub items: Vec<SequenceEntry>,
}

/// Sanitized reorder batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuReorder {
    menu_id: NavigationMenuId,
    items: Vec<MenuItemSequence>,
}

impl InputSchema for ReorderMenuItemsRequest {
    type Valid = MenuReorder;

    fn into_valid(self) -> AppResult<Self::Valid> {
        let items: Vec<MenuItemSequence> = self
            .items
            .iter()
            .map(|entry| MenuItemSequence {
                item_id: entry.item_id,
                sequence: entry.sequence,
            })
            .collect();

        let mut errors = FieldErrors::default();
        check_field(&mut errors, "items", MenuItemSequence::ensure_distinct(&items));
        finish_fields(errors)?;

        Ok(MenuReorder {
            menu_id: self.menu_id,
            items,
        })
    }
}

fn menu_not_found(menu_id: NavigationMenuId) -> AppError {
    AppError::NotFound(format!("menu '{menu_id}' was not found"))
}

/// Navigation menu management.
#[derive(Clone)]
pub struct NavigationService {
    envelope: ActionEnvelope,
    navigation: Arc<dyn NavigationRepository>,
    journals: Arc<dyn JournalRepository>,
}

impl NavigationService {
    /// Creates the service.
    #[must_use]
    pub fn new(
        envelope: ActionEnvelope,
        navigation: Arc<dyn NavigationRepository>,
        journals: Arc<dyn JournalRepository>,
    ) -> Self {
        Self {
            envelope,
            navigation,
            journals,
        }
    }

    /// Lists menus of one scope with their items.
    pub async fn list_menus(
        &self,
        credential: Option<&Credential>,
        request: ListMenusRequest,
    ) -> ActionOutcome<Vec<MenuWithItems>> {
        self.envelope
            .run(
                credential,
                request,
                |journal_id| AccessRequirement::journal_or_site(*journal_id, JOURNAL_ADMIN_ROLES),
                |_, journal_id| self.list_menus_impl(journal_id),
            )
            .await
    }

    /// Creates an empty menu.
    pub async fn create_menu(
        &self,
        credential: Option<&Credential>,
        request: CreateMenuRequest,
    ) -> ActionOutcome<NavigationMenu> {
        self.envelope
            .run(
                credential,
                request,
                |menu| AccessRequirement::journal_or_site(menu.journal_id, JOURNAL_ADMIN_ROLES),
                |_, menu| self.create_menu_impl(menu),
            )
            .await
    }

    /// Deletes a menu; its items go with it.
    pub async fn delete_menu(
        &self,
        credential: Option<&Credential>,
        request: MenuTarget,
    ) -> ActionOutcome<NavigationMenuId> {
        self.envelope
            .run_scoped(
                credential,
                request,
                |menu_id| self.menu_requirement(*menu_id),
                |_, menu_id| self.delete_menu_impl(menu_id),
            )
            .await
    }

    /// Adds an item, optionally nested under another item of the same menu.
    pub async fn create_menu_item(
        &self,
        credential: Option<&Credential>,
        request: CreateMenuItemRequest,
    ) -> ActionOutcome<NavigationMenuItem> {
        self.envelope
            .run_scoped(
                credential,
                request,
                |item| self.menu_requirement(item.menu_id),
                |_, item| self.create_menu_item_impl(item),
            )
            .await
    }

    /// Stores new item positions.
    ///
    /// Updates run concurrently and are not rolled back: when any of them
    /// fails the call reports one aggregate failure and the successful rows
    /// keep their new position.
    pub async fn reorder_menu_items(
        &self,
        credential: Option<&Credential>,
        request: ReorderMenuItemsRequest,
    ) -> ActionOutcome<Vec<NavigationMenuItem>> {
        self.envelope
            .run_scoped(
                credential,
                request,
                |reorder| self.menu_requirement(reorder.menu_id),
                |_, reorder| self.reorder_menu_items_impl(reorder),
            )
            .await
    }

    async fn menu_requirement(&self, menu_id: NavigationMenuId) -> AppResult<AccessRequirement> {
        let menu = self.find_menu(menu_id).await?;
        Ok(AccessRequirement::journal_or_site(
            menu.journal_id,
            JOURNAL_ADMIN_ROLES,
        ))
    }

    async fn find_menu(&self, menu_id: NavigationMenuId) -> AppResult<NavigationMenu> {
        self.navigation
            .find_menu(menu_id)
            .await?
            .ok_or_else(|| menu_not_found(menu_id))
    }

    /// Views rendering menus of one scope. Runs after the write, so a failed
    /// journal lookup only narrows the invalidation to the admin listing.
    async fn views_for(&self, journal_id: Option<JournalId>) -> Vec<ViewPath> {
        let mut views = vec![ViewPath::admin_navigation()];
        match journal_id {
            Some(journal_id) => match self.journals.find_journal(journal_id).await {
                Ok(Some(journal)) => views.push(ViewPath::journal_home(&journal.path)),
                Ok(None) => {}
                Err(error) => {
                    warn!(%error, journal_id = %journal_id, "journal lookup failed after menu change");
                }
            },
            None => views.push(ViewPath::site_root()),
        }
        views
    }

    async fn list_menus_impl(
        &self,
        journal_id: Option<JournalId>,
    ) -> AppResult<Completed<Vec<MenuWithItems>>> {
        let menus = self.navigation.list_menus(journal_id).await?;
        let mut listed = Vec::with_capacity(menus.len());
        for menu in menus {
            let items = self.navigation.list_menu_items(menu.menu_id).await?;
            listed.push(MenuWithItems { menu, items });
        }
        Ok(Completed::read(listed))
    }

    async fn create_menu_impl(&self, new_menu: NewMenu) -> AppResult<Completed<NavigationMenu>> {
        let menu = NavigationMenu {
            menu_id: NavigationMenuId::new(),
            journal_id: new_menu.journal_id,
            title: new_menu.title,
            area: new_menu.area,
            created_at: Utc::now(),
        };
        self.navigation.insert_menu(&menu).await?;

        let views = self.views_for(menu.journal_id).await;
        let audit = AuditDraft::new(AuditAction::NavigationMenuCreated, "navigation_menu", menu.menu_id)
            .with_details(serde_json::json!({
                "journal_id": menu.journal_id,
                "title": menu.title,
                "area": menu.area,
            }));
        Ok(Completed::changed(menu, audit).invalidating(views))
    }

    async fn delete_menu_impl(
        &self,
        menu_id: NavigationMenuId,
    ) -> AppResult<Completed<NavigationMenuId>> {
        let menu = self.find_menu(menu_id).await?;
        if !self.navigation.delete_menu(menu_id).await? {
            return Err(menu_not_found(menu_id));
        }

        let views = self.views_for(menu.journal_id).await;
        let audit = AuditDraft::new(AuditAction::NavigationMenuDeleted, "navigation_menu", menu_id)
            .with_details(serde_json::json!({ "title": menu.title }));
        Ok(Completed::changed(menu_id, audit).invalidating(views))
    }

    async fn create_menu_item_impl(
        &self,
        new_item: NewMenuItem,
    ) -> AppResult<Completed<NavigationMenuItem>> {
        let menu = self.find_menu(new_item.menu_id).await?;
        let siblings = self.navigation.list_menu_items(menu.menu_id).await?;
        if let Some(parent_id) = new_item.parent_id
            && !siblings.iter().any(|item| item.item_id == parent_id)
        {
            return Err(AppError::NotFound(format!(
                "parent item '{parent_id}' is not part of menu '{}'",
                menu.menu_id
            )));
        }

        let sequence = new_item.sequence.unwrap_or_else(|| {
            siblings
                .iter()
                .filter(|item| item.parent_id == new_item.parent_id)
                .map(|item| item.sequence + 1)
                .max()
                .unwrap_or(0)
        });
        let item = NavigationMenuItem {
            item_id: NavigationMenuItemId::new(),
            menu_id: menu.menu_id,
            parent_id: new_item.parent_id,
            label: new_item.label,
            url: new_item.url,
            sequence,
        };
        self.navigation.insert_menu_item(&item).await?;

        let views = self.views_for(menu.journal_id).await;
        let audit = AuditDraft::new(
            AuditAction::NavigationItemCreated,
            "navigation_menu_item",
            item.item_id,
        )
        .with_details(serde_json::json!({
            "menu_id": item.menu_id,
            "label": item.label,
            "url": item.url,
        }));
        Ok(Completed::changed(item, audit).invalidating(views))
    }

    async fn reorder_menu_items_impl(
        &self,
        reorder: MenuReorder,
    ) -> AppResult<Completed<Vec<NavigationMenuItem>>> {
        let menu = self.find_menu(reorder.menu_id).await?;
        let current = self.navigation.list_menu_items(menu.menu_id).await?;
        let known: HashSet<NavigationMenuItemId> =
            current.iter().map(|item| item.item_id).collect();
        if let Some(stranger) = reorder
            .items
            .iter()
            .find(|entry| !known.contains(&entry.item_id))
        {
            return Err(AppError::NotFound(format!(
                "menu item '{}' is not part of menu '{}'",
                stranger.item_id, menu.menu_id
            )));
        }

        let total = reorder.items.len();
        let mut updates = JoinSet::new();
        for entry in reorder.items.iter().copied() {
            let navigation = Arc::clone(&self.navigation);
            updates.spawn(async move {
                let result = navigation
                    .update_menu_item_sequence(entry.item_id, entry.sequence)
                    .await;
                (entry.item_id, result)
            });
        }

        let mut failed = 0_usize;
        while let Some(joined) = updates.join_next().await {
            match joined {
                Ok((_, Ok(true))) => {}
                Ok((item_id, Ok(false))) => {
                    warn!(item_id = %item_id, "menu item vanished during reorder");
                    failed += 1;
                }
                Ok((item_id, Err(error))) => {
                    warn!(%error, item_id = %item_id, "menu item reorder failed");
                    failed += 1;
                }
                Err(error) => {
                    warn!(%error, "menu item reorder task aborted");
                    failed += 1;
                }
            }
        }
        if failed > 0 {
            return Err(AppError::Internal(format!(
                "failed to reorder menu items: {failed} of {total} updates failed"
            )));
        }

        let items = match self.navigation.list_menu_items(menu.menu_id).await {
            Ok(items) => items,
            Err(error) => {
                warn!(%error, menu_id = %menu.menu_id, "menu reload failed after reorder");
                apply_sequences(current, &reorder.items)
            }
        };
        let views = self.views_for(menu.journal_id).await;
        let audit = AuditDraft::new(
            AuditAction::NavigationItemsReordered,
            "navigation_menu",
            menu.menu_id,
        )
        .with_details(serde_json::json!({ "items": total }));
        Ok(Completed::changed(items, audit).invalidating(views))
    }
}

/// Applies stored positions to a previously read item list, in listing order.
fn apply_sequences(
    mut items: Vec<NavigationMenuItem>,
    sequences: &[MenuItemSequence],
) -> Vec<NavigationMenuItem> {
    for entry in sequences {
        if let Some(item) = items.iter_mut().find(|item| item.item_id == entry.item_id) {
            item.sequence = entry.sequence;
        }
    }
    items.sort_by(|left, right| {
        left.sequence
            .cmp(&right.sequence)
            .then_with(|| left.label.cmp(&right.label))
    });
    items
}
