use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

use scholaris_application::NavigationRepository;
use scholaris_core::{AppError, AppResult, JournalId};
use scholaris_domain::{
    NavigationMenu, NavigationMenuId, NavigationMenuItem, NavigationMenuItemId,
};

use super::PostgresConfigurationRepository;

#[derive(Debug, FromRow)]
struct MenuRow {
    id: uuid::Uuid,
    journal_id: Option<uuid::Uuid>,
    title: String,
    area: String,
    created_at: DateTime<Utc>,
}

impl From<MenuRow> for NavigationMenu {
    fn from(row: MenuRow) -> Self {
        Self {
            menu_id: NavigationMenuId::from_uuid(row.id),
            journal_id: row.journal_id.map(JournalId::from_uuid),
            title: row.title,
            area: row.area,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct MenuItemRow {
    id: uuid::Uuid,
    menu_id: uuid::Uuid,
    parent_id: Option<uuid::Uuid>,
    label: String,
    url: String,
    sequence: i32,
}

impl From<MenuItemRow> for NavigationMenuItem {
    fn from(row: MenuItemRow) -> Self {
        Self {
            item_id: NavigationMenuItemId::from_uuid(row.id),
            menu_id: NavigationMenuId::from_uuid(row.menu_id),
            parent_id: row.parent_id.map(NavigationMenuItemId::from_uuid),
            label: row.label,
            url: row.url,
            sequence: row.sequence,
        }
    }
}

#[async_trait]
impl NavigationRepository for PostgresConfigurationRepository {
    async fn list_menus(&self, journal_id: Option<JournalId>) -> AppResult<Vec<NavigationMenu>> {
        let rows = sqlx::query_as::<_, MenuRow>(
            r#"
            SELECT id, journal_id, title, area, created_at
            FROM navigation_menus
            WHERE journal_id IS NOT DISTINCT FROM $1
            ORDER BY area, title
            "#,
        )
        .bind(journal_id.map(|journal_id| journal_id.as_uuid()))
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to list navigation menus: {error}"))
        })?;

        Ok(rows.into_iter().map(NavigationMenu::from).collect())
    }

    async fn list_menu_items(
        &self,
        menu_id: NavigationMenuId,
    ) -> AppResult<Vec<NavigationMenuItem>> {
        let rows = sqlx::query_as::<_, MenuItemRow>(
            r#"
            SELECT id, menu_id, parent_id, label, url, sequence
            FROM navigation_menu_items
            WHERE menu_id = $1
            ORDER BY sequence, label
            "#,
        )
        .bind(menu_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list menu items: {error}")))?;

        Ok(rows.into_iter().map(NavigationMenuItem::from).collect())
    }

    async fn find_menu(&self, menu_id: NavigationMenuId) -> AppResult<Option<NavigationMenu>> {
        let row = sqlx::query_as::<_, MenuRow>(
            r#"
            SELECT id, journal_id, title, area, created_at
            FROM navigation_menus
            WHERE id = $1
            "#,
        )
        .bind(menu_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find navigation menu: {error}")))?;

        Ok(row.map(NavigationMenu::from))
    }

    async fn insert_menu(&self, menu: &NavigationMenu) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO navigation_menus (id, journal_id, title, area, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(menu.menu_id.as_uuid())
        .bind(menu.journal_id.map(|journal_id| journal_id.as_uuid()))
        .bind(menu.title.as_str())
        .bind(menu.area.as_str())
        .bind(menu.created_at)
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to insert navigation menu: {error}"))
        })?;

        Ok(())
    }

    async fn delete_menu(&self, menu_id: NavigationMenuId) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM navigation_menus WHERE id = $1")
            .bind(menu_id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to delete navigation menu: {error}"))
            })?;

        Ok(result.rows_affected() > 0)
    }

    async fn insert_menu_item(&self, item: &NavigationMenuItem) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO navigation_menu_items (id, menu_id, parent_id, label, url, sequence)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(item.item_id.as_uuid())
        .bind(item.menu_id.as_uuid())
        .bind(item.parent_id.map(|parent_id| parent_id.as_uuid()))
        .bind(item.label.as_str())
        .bind(item.url.as_str())
        .bind(item.sequence)
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to insert menu item: {error}")))?;

        Ok(())
    }

    async fn update_menu_item_sequence(
        &self,
        item_id: NavigationMenuItemId,
        sequence: i32,
    ) -> AppResult<bool> {
        let result = sqlx::query("UPDATE navigation_menu_items SET sequence = $2 WHERE id = $1")
            .bind(item_id.as_uuid())
            .bind(sequence)
            .execute(&self.pool)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to update menu item sequence: {error}"))
            })?;

        Ok(result.rows_affected() > 0)
    }
}
