use std::collections::HashSet;

use chrono::{DateTime, Utc};
use scholaris_core::{AppError, AppResult, JournalId};
use serde::{Deserialize, Serialize};

record_identifier!(
    /// Navigation menu identifier.
    NavigationMenuId
);

record_identifier!(
    /// Navigation menu item identifier.
    NavigationMenuItemId
);

/// Menu rendered in one area of a journal (or the site when unscoped).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationMenu {
    /// Menu identifier.
    pub menu_id: NavigationMenuId,
    /// Owning journal; `None` for site-wide menus.
    pub journal_id: Option<JournalId>,
    /// Menu title.
    pub title: String,
    /// Template area, e.g. `primary` or `footer`.
    pub area: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Entry of a navigation menu; items nest through `parent_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationMenuItem {
    /// Item identifier.
    pub item_id: NavigationMenuItemId,
    /// Owning menu.
    pub menu_id: NavigationMenuId,
    /// Parent item for nested entries.
    pub parent_id: Option<NavigationMenuItemId>,
    /// Link label.
    pub label: String,
    /// Relative path or absolute http(s) URL.
    pub url: String,
    /// Position among siblings.
    pub sequence: i32,
}

impl NavigationMenuItem {
    /// Accepts site-relative paths and absolute http(s) URLs.
    pub fn validate_url(url: &str) -> AppResult<()> {
        let relative = url.starts_with('/') && !url.starts_with("//");
        let absolute = url.starts_with("https://") || url.starts_with("http://");
        if !(relative || absolute) {
            return Err(AppError::Validation(format!(
                "menu item url '{url}' must be a relative path or an http(s) URL"
            )));
        }

        Ok(())
    }
}

/// Requested position for one menu item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuItemSequence {
    /// Item to move.
    pub item_id: NavigationMenuItemId,
    /// New position.
    pub sequence: i32,
}

impl MenuItemSequence {
    /// Rejects batches that mention one item more than once.
    pub fn ensure_distinct(batch: &[Self]) -> AppResult<()> {
        let mut seen = HashSet::with_capacity(batch.len());
        for entry in batch {
            if !seen.insert(entry.item_id) {
                return Err(AppError::Validation(format!(
                    "menu item '{}' appears more than once",
                    entry.item_id
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{MenuItemSequence, NavigationMenuItem, NavigationMenuItemId};

    #[test]
    fn menu_urls() {
        assert!(NavigationMenuItem::validate_url("/about").is_ok());
        assert!(NavigationMenuItem::validate_url("https://doaj.org").is_ok());
        assert!(NavigationMenuItem::validate_url("//evil.example").is_err());
        assert!(NavigationMenuItem::validate_url("javascript:alert(1)").is_err());
    }

    #[test]
    fn duplicate_items_in_batch_are_rejected() {
        let item_id = NavigationMenuItemId::new();
        let batch = [
            MenuItemSequence {
                item_id,
                sequence: 1,
            },
            MenuItemSequence {
                item_id,
                sequence: 2,
            },
        ];
        assert!(MenuItemSequence::ensure_distinct(&batch).is_err());
        assert!(MenuItemSequence::ensure_distinct(&batch[..1]).is_ok());
    }
}
