// ============================================================================
// QRest Infrastructure - PostgreSQL Menu Repositories
// File: crates/qrest-infrastructure/src/database/postgres/menu_repo_impl.rs
// Description: Menus, categories, items and menu view tracking
// ============================================================================

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, PgPool};
use tracing::{debug, info};
use uuid::Uuid;

use qrest_core::domain::{
    Category, CategoryWithCount, CategoryWithItems, DailyCount, Menu, MenuItem, MenuSummary,
    MenuView, NamedCount, ViewType,
};
use qrest_core::error::DomainError;
use qrest_core::repositories::{
    CategoryRepository, MenuFilter, MenuItemRepository, MenuRepository, MenuViewRepository,
};
use qrest_shared::Pagination;

use crate::database::error::map_db_error;

const MENU_COLUMNS: &str =
    "id, org_id, name, locale, is_active, view_count, qr_scan_count, created_at, updated_at";
const CATEGORY_COLUMNS: &str = "id, menu_id, name, description, sort_order, created_at, updated_at";
const ITEM_COLUMNS: &str = "id, category_id, name, description, price, image_url, is_available, \
                            sort_order, created_at, updated_at";

#[derive(Debug, FromRow)]
struct MenuRow {
    id: Uuid,
    org_id: Uuid,
    name: String,
    locale: String,
    is_active: bool,
    view_count: i32,
    qr_scan_count: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<MenuRow> for Menu {
    fn from(row: MenuRow) -> Self {
        Menu {
            id: row.id,
            org_id: row.org_id,
            name: row.name,
            locale: row.locale,
            is_active: row.is_active,
            view_count: row.view_count,
            qr_scan_count: row.qr_scan_count,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct MenuSummaryRow {
    #[sqlx(flatten)]
    menu: MenuRow,
    category_count: i64,
}

#[derive(Debug, FromRow)]
struct CategoryRow {
    id: Uuid,
    menu_id: Uuid,
    name: String,
    description: Option<String>,
    sort_order: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Category {
            id: row.id,
            menu_id: row.menu_id,
            name: row.name,
            description: row.description,
            sort_order: row.sort_order,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct CategoryWithCountRow {
    #[sqlx(flatten)]
    category: CategoryRow,
    item_count: i64,
}

#[derive(Debug, FromRow)]
struct MenuItemRow {
    id: Uuid,
    category_id: Uuid,
    name: String,
    description: Option<String>,
    price: f64,
    image_url: Option<String>,
    is_available: bool,
    sort_order: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<MenuItemRow> for MenuItem {
    fn from(row: MenuItemRow) -> Self {
        MenuItem {
            id: row.id,
            category_id: row.category_id,
            name: row.name,
            description: row.description,
            price: row.price,
            image_url: row.image_url,
            is_available: row.is_available,
            sort_order: row.sort_order,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Attaches items to their categories, keeping both in query order.
fn assemble_tree(categories: Vec<Category>, items: Vec<MenuItem>) -> Vec<CategoryWithItems> {
    let mut by_category: HashMap<Uuid, Vec<MenuItem>> = HashMap::new();
    for item in items {
        by_category.entry(item.category_id).or_default().push(item);
    }
    categories
        .into_iter()
        .map(|category| CategoryWithItems {
            items: by_category.remove(&category.id).unwrap_or_default(),
            category,
        })
        .collect()
}

// ----------------------------------------------------------------------------
// Menus
// ----------------------------------------------------------------------------

pub struct PgMenuRepository {
    pool: PgPool,
}

impl PgMenuRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MenuRepository for PgMenuRepository {
    async fn list(
        &self,
        filter: MenuFilter,
        page: Pagination,
    ) -> Result<(Vec<MenuSummary>, i64), DomainError> {
        let pattern = filter.search.map(|s| format!("%{}%", s.trim()));
        let condition = "($1::UUID IS NULL OR m.org_id = $1) AND ($2::TEXT IS NULL OR m.name ILIKE $2)";

        let rows: Vec<MenuSummaryRow> = sqlx::query_as(&format!(
            r#"
            SELECT m.id, m.org_id, m.name, m.locale, m.is_active, m.view_count, m.qr_scan_count,
                   m.created_at, m.updated_at,
                   (SELECT COUNT(*) FROM categories c WHERE c.menu_id = m.id) AS category_count
            FROM menus m
            WHERE {}
            ORDER BY m.created_at DESC
            LIMIT $3 OFFSET $4
            "#,
            condition
        ))
        .bind(filter.org_id)
        .bind(&pattern)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_db_error("listing menus", e))?;

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM menus m WHERE {}", condition))
            .bind(filter.org_id)
            .bind(&pattern)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_db_error("counting menus", e))?;

        let menus = rows
            .into_iter()
            .map(|r| MenuSummary {
                menu: r.menu.into(),
                category_count: r.category_count,
            })
            .collect();
        Ok((menus, total))
    }

    async fn find_by_id(&self, id: &Uuid) -> Result<Option<Menu>, DomainError> {
        let row: Option<MenuRow> =
            sqlx::query_as(&format!("SELECT {} FROM menus WHERE id = $1", MENU_COLUMNS))
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| map_db_error("finding menu", e))?;

        Ok(row.map(Into::into))
    }

    async fn create(&self, menu: &Menu) -> Result<Menu, DomainError> {
        let row: MenuRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO menus ({cols})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {cols}
            "#,
            cols = MENU_COLUMNS
        ))
        .bind(menu.id)
        .bind(menu.org_id)
        .bind(&menu.name)
        .bind(&menu.locale)
        .bind(menu.is_active)
        .bind(menu.view_count)
        .bind(menu.qr_scan_count)
        .bind(menu.created_at)
        .bind(menu.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_db_error("creating menu", e))?;

        Ok(row.into())
    }

    async fn update(&self, menu: &Menu) -> Result<Menu, DomainError> {
        let row: Option<MenuRow> = sqlx::query_as(&format!(
            r#"
            UPDATE menus SET name = $2, locale = $3, is_active = $4, updated_at = $5
            WHERE id = $1
            RETURNING {}
            "#,
            MENU_COLUMNS
        ))
        .bind(menu.id)
        .bind(&menu.name)
        .bind(&menu.locale)
        .bind(menu.is_active)
        .bind(menu.updated_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_db_error("updating menu", e))?;

        row.map(Into::into).ok_or(DomainError::NotFound("Menu"))
    }

    async fn delete(&self, id: &Uuid) -> Result<bool, DomainError> {
        let result = sqlx::query("DELETE FROM menus WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| map_db_error("deleting menu", e))?;

        Ok(result.rows_affected() > 0)
    }

    async fn duplicate(&self, source_id: &Uuid, copy: &Menu) -> Result<Menu, DomainError> {
        let mut transaction = self
            .pool
            .begin()
            .await
            .map_err(|e| map_db_error("starting menu duplication", e))?;

        let row: MenuRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO menus ({cols})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {cols}
            "#,
            cols = MENU_COLUMNS
        ))
        .bind(copy.id)
        .bind(copy.org_id)
        .bind(&copy.name)
        .bind(&copy.locale)
        .bind(copy.is_active)
        .bind(copy.view_count)
        .bind(copy.qr_scan_count)
        .bind(copy.created_at)
        .bind(copy.updated_at)
        .fetch_one(&mut *transaction)
        .await
        .map_err(|e| map_db_error("inserting menu copy", e))?;

        let source_categories: Vec<Uuid> =
            sqlx::query_scalar("SELECT id FROM categories WHERE menu_id = $1 ORDER BY sort_order")
                .bind(source_id)
                .fetch_all(&mut *transaction)
                .await
                .map_err(|e| map_db_error("reading categories to duplicate", e))?;

        for source_category in &source_categories {
            let new_category = Uuid::new_v4();
            sqlx::query(
                r#"
                INSERT INTO categories (id, menu_id, name, description, sort_order, created_at, updated_at)
                SELECT $1, $2, name, description, sort_order, NOW(), NOW()
                FROM categories WHERE id = $3
                "#,
            )
            .bind(new_category)
            .bind(copy.id)
            .bind(source_category)
            .execute(&mut *transaction)
            .await
            .map_err(|e| map_db_error("copying category", e))?;

            sqlx::query(
                r#"
                INSERT INTO menu_items (
                    id, category_id, name, description, price, image_url,
                    is_available, sort_order, created_at, updated_at
                )
                SELECT gen_random_uuid(), $1, name, description, price, image_url,
                       is_available, sort_order, NOW(), NOW()
                FROM menu_items WHERE category_id = $2
                "#,
            )
            .bind(new_category)
            .bind(source_category)
            .execute(&mut *transaction)
            .await
            .map_err(|e| map_db_error("copying menu items", e))?;
        }

        transaction
            .commit()
            .await
            .map_err(|e| map_db_error("committing menu duplication", e))?;

        info!(
            "Menu {} duplicated into {} ({} categories)",
            source_id,
            copy.id,
            source_categories.len()
        );
        Ok(row.into())
    }

    async fn load_categories(
        &self,
        menu_id: &Uuid,
        available_only: bool,
    ) -> Result<Vec<CategoryWithItems>, DomainError> {
        let categories: Vec<CategoryRow> = sqlx::query_as(&format!(
            "SELECT {} FROM categories WHERE menu_id = $1 ORDER BY sort_order, created_at",
            CATEGORY_COLUMNS
        ))
        .bind(menu_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_db_error("loading menu categories", e))?;

        let items: Vec<MenuItemRow> = sqlx::query_as(
            r#"
            SELECT i.id, i.category_id, i.name, i.description, i.price, i.image_url,
                   i.is_available, i.sort_order, i.created_at, i.updated_at
            FROM menu_items i
            JOIN categories c ON c.id = i.category_id
            WHERE c.menu_id = $1 AND (NOT $2 OR i.is_available)
            ORDER BY i.sort_order, i.created_at
            "#,
        )
        .bind(menu_id)
        .bind(available_only)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_db_error("loading menu items", e))?;

        Ok(assemble_tree(
            categories.into_iter().map(Into::into).collect(),
            items.into_iter().map(Into::into).collect(),
        ))
    }

    async fn count(&self, org_id: Option<Uuid>) -> Result<i64, DomainError> {
        sqlx::query_scalar("SELECT COUNT(*) FROM menus WHERE $1::UUID IS NULL OR org_id = $1")
            .bind(org_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_db_error("counting menus", e))
    }
}

// ----------------------------------------------------------------------------
// Categories
// ----------------------------------------------------------------------------

pub struct PgCategoryRepository {
    pool: PgPool,
}

impl PgCategoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CategoryRepository for PgCategoryRepository {
    async fn list_by_menu(&self, menu_id: &Uuid) -> Result<Vec<CategoryWithCount>, DomainError> {
        let rows: Vec<CategoryWithCountRow> = sqlx::query_as(
            r#"
            SELECT c.id, c.menu_id, c.name, c.description, c.sort_order, c.created_at, c.updated_at,
                   (SELECT COUNT(*) FROM menu_items i WHERE i.category_id = c.id) AS item_count
            FROM categories c
            WHERE c.menu_id = $1
            ORDER BY c.sort_order, c.created_at
            "#,
        )
        .bind(menu_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_db_error("listing categories", e))?;

        Ok(rows
            .into_iter()
            .map(|r| CategoryWithCount {
                category: r.category.into(),
                item_count: r.item_count,
            })
            .collect())
    }

    async fn find_by_id(&self, id: &Uuid) -> Result<Option<Category>, DomainError> {
        let row: Option<CategoryRow> =
            sqlx::query_as(&format!("SELECT {} FROM categories WHERE id = $1", CATEGORY_COLUMNS))
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| map_db_error("finding category", e))?;

        Ok(row.map(Into::into))
    }

    async fn find_in_org(&self, id: &Uuid, org_id: &Uuid) -> Result<Option<Category>, DomainError> {
        let row: Option<CategoryRow> = sqlx::query_as(
            r#"
            SELECT c.id, c.menu_id, c.name, c.description, c.sort_order, c.created_at, c.updated_at
            FROM categories c
            JOIN menus m ON m.id = c.menu_id
            WHERE c.id = $1 AND m.org_id = $2
            "#,
        )
        .bind(id)
        .bind(org_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_db_error("finding category in organization", e))?;

        Ok(row.map(Into::into))
    }

    async fn max_sort_order(&self, menu_id: &Uuid) -> Result<Option<i32>, DomainError> {
        sqlx::query_scalar("SELECT MAX(sort_order) FROM categories WHERE menu_id = $1")
            .bind(menu_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_db_error("reading category sort order", e))
    }

    async fn create(&self, category: &Category) -> Result<Category, DomainError> {
        let row: CategoryRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO categories ({cols})
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {cols}
            "#,
            cols = CATEGORY_COLUMNS
        ))
        .bind(category.id)
        .bind(category.menu_id)
        .bind(&category.name)
        .bind(&category.description)
        .bind(category.sort_order)
        .bind(category.created_at)
        .bind(category.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_db_error("creating category", e))?;

        Ok(row.into())
    }

    async fn update(&self, category: &Category) -> Result<Category, DomainError> {
        let row: Option<CategoryRow> = sqlx::query_as(&format!(
            r#"
            UPDATE categories SET name = $2, description = $3, sort_order = $4, updated_at = $5
            WHERE id = $1
            RETURNING {}
            "#,
            CATEGORY_COLUMNS
        ))
        .bind(category.id)
        .bind(&category.name)
        .bind(&category.description)
        .bind(category.sort_order)
        .bind(category.updated_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_db_error("updating category", e))?;

        row.map(Into::into).ok_or(DomainError::NotFound("Category"))
    }

    async fn delete(&self, id: &Uuid) -> Result<bool, DomainError> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| map_db_error("deleting category", e))?;

        Ok(result.rows_affected() > 0)
    }

    async fn reorder(&self, menu_id: &Uuid, ids: Vec<Uuid>) -> Result<(), DomainError> {
        let mut transaction = self
            .pool
            .begin()
            .await
            .map_err(|e| map_db_error("starting category reorder", e))?;

        for (index, id) in ids.iter().enumerate() {
            let result = sqlx::query(
                "UPDATE categories SET sort_order = $1, updated_at = NOW() WHERE id = $2 AND menu_id = $3",
            )
            .bind(index as i32)
            .bind(id)
            .bind(menu_id)
            .execute(&mut *transaction)
            .await
            .map_err(|e| map_db_error("reordering categories", e))?;

            if result.rows_affected() == 0 {
                return Err(DomainError::ValidationError(
                    "Some categories do not belong to this menu".into(),
                ));
            }
        }

        transaction
            .commit()
            .await
            .map_err(|e| map_db_error("committing category reorder", e))?;
        debug!("Reordered {} categories in menu {}", ids.len(), menu_id);
        Ok(())
    }

    async fn count_by_org(&self, org_id: &Uuid) -> Result<i64, DomainError> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM categories c JOIN menus m ON m.id = c.menu_id WHERE m.org_id = $1",
        )
        .bind(org_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_db_error("counting categories", e))
    }
}

// ----------------------------------------------------------------------------
// Menu items
// ----------------------------------------------------------------------------

pub struct PgMenuItemRepository {
    pool: PgPool,
}

impl PgMenuItemRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MenuItemRepository for PgMenuItemRepository {
    async fn list_by_category(&self, category_id: &Uuid) -> Result<Vec<MenuItem>, DomainError> {
        let rows: Vec<MenuItemRow> = sqlx::query_as(&format!(
            "SELECT {} FROM menu_items WHERE category_id = $1 ORDER BY sort_order, created_at",
            ITEM_COLUMNS
        ))
        .bind(category_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_db_error("listing menu items", e))?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn find_by_id(&self, id: &Uuid) -> Result<Option<MenuItem>, DomainError> {
        let row: Option<MenuItemRow> =
            sqlx::query_as(&format!("SELECT {} FROM menu_items WHERE id = $1", ITEM_COLUMNS))
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| map_db_error("finding menu item", e))?;

        Ok(row.map(Into::into))
    }

    async fn find_in_org(&self, id: &Uuid, org_id: &Uuid) -> Result<Option<MenuItem>, DomainError> {
        let row: Option<MenuItemRow> = sqlx::query_as(
            r#"
            SELECT i.id, i.category_id, i.name, i.description, i.price, i.image_url,
                   i.is_available, i.sort_order, i.created_at, i.updated_at
            FROM menu_items i
            JOIN categories c ON c.id = i.category_id
            JOIN menus m ON m.id = c.menu_id
            WHERE i.id = $1 AND m.org_id = $2
            "#,
        )
        .bind(id)
        .bind(org_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_db_error("finding menu item in organization", e))?;

        Ok(row.map(Into::into))
    }

    async fn max_sort_order(&self, category_id: &Uuid) -> Result<Option<i32>, DomainError> {
        sqlx::query_scalar("SELECT MAX(sort_order) FROM menu_items WHERE category_id = $1")
            .bind(category_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_db_error("reading item sort order", e))
    }

    async fn create(&self, item: &MenuItem) -> Result<MenuItem, DomainError> {
        let row: MenuItemRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO menu_items ({cols})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {cols}
            "#,
            cols = ITEM_COLUMNS
        ))
        .bind(item.id)
        .bind(item.category_id)
        .bind(&item.name)
        .bind(&item.description)
        .bind(item.price)
        .bind(&item.image_url)
        .bind(item.is_available)
        .bind(item.sort_order)
        .bind(item.created_at)
        .bind(item.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_db_error("creating menu item", e))?;

        Ok(row.into())
    }

    async fn update(&self, item: &MenuItem) -> Result<MenuItem, DomainError> {
        let row: Option<MenuItemRow> = sqlx::query_as(&format!(
            r#"
            UPDATE menu_items
            SET name = $2, description = $3, price = $4, image_url = $5,
                is_available = $6, sort_order = $7, updated_at = $8
            WHERE id = $1
            RETURNING {}
            "#,
            ITEM_COLUMNS
        ))
        .bind(item.id)
        .bind(&item.name)
        .bind(&item.description)
        .bind(item.price)
        .bind(&item.image_url)
        .bind(item.is_available)
        .bind(item.sort_order)
        .bind(item.updated_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_db_error("updating menu item", e))?;

        row.map(Into::into).ok_or(DomainError::NotFound("Menu item"))
    }

    async fn delete(&self, id: &Uuid) -> Result<bool, DomainError> {
        let result = sqlx::query("DELETE FROM menu_items WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| map_db_error("deleting menu item", e))?;

        Ok(result.rows_affected() > 0)
    }

    async fn reorder(&self, category_id: &Uuid, ids: Vec<Uuid>) -> Result<(), DomainError> {
        let mut transaction = self
            .pool
            .begin()
            .await
            .map_err(|e| map_db_error("starting item reorder", e))?;

        for (index, id) in ids.iter().enumerate() {
            let result = sqlx::query(
                "UPDATE menu_items SET sort_order = $1, updated_at = NOW() WHERE id = $2 AND category_id = $3",
            )
            .bind(index as i32)
            .bind(id)
            .bind(category_id)
            .execute(&mut *transaction)
            .await
            .map_err(|e| map_db_error("reordering menu items", e))?;

            if result.rows_affected() == 0 {
                return Err(DomainError::ValidationError(
                    "Some items do not belong to this category".into(),
                ));
            }
        }

        transaction
            .commit()
            .await
            .map_err(|e| map_db_error("committing item reorder", e))?;
        Ok(())
    }

    async fn count_by_org(&self, org_id: &Uuid) -> Result<i64, DomainError> {
        sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM menu_items i
            JOIN categories c ON c.id = i.category_id
            JOIN menus m ON m.id = c.menu_id
            WHERE m.org_id = $1
            "#,
        )
        .bind(org_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_db_error("counting menu items", e))
    }
}

// ----------------------------------------------------------------------------
// Menu views
// ----------------------------------------------------------------------------

#[derive(Debug, FromRow)]
struct DailyCountRow {
    date: NaiveDate,
    count: i64,
}

pub struct PgMenuViewRepository {
    pool: PgPool,
}

impl PgMenuViewRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MenuViewRepository for PgMenuViewRepository {
    async fn record(&self, view: &MenuView) -> Result<(), DomainError> {
        let mut transaction = self
            .pool
            .begin()
            .await
            .map_err(|e| map_db_error("starting view record", e))?;

        sqlx::query(
            r#"
            INSERT INTO menu_views (id, menu_id, view_type, user_agent, ip_address, referer, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(view.id)
        .bind(view.menu_id)
        .bind(view.view_type.as_str())
        .bind(&view.user_agent)
        .bind(&view.ip_address)
        .bind(&view.referer)
        .bind(view.created_at)
        .execute(&mut *transaction)
        .await
        .map_err(|e| map_db_error("recording menu view", e))?;

        let scan = i32::from(view.view_type == ViewType::QrScan);
        sqlx::query(
            "UPDATE menus SET view_count = view_count + 1, qr_scan_count = qr_scan_count + $2 WHERE id = $1",
        )
        .bind(view.menu_id)
        .bind(scan)
        .execute(&mut *transaction)
        .await
        .map_err(|e| map_db_error("bumping menu counters", e))?;

        transaction
            .commit()
            .await
            .map_err(|e| map_db_error("committing view record", e))
    }

    async fn count_by_type(
        &self,
        menu_id: &Uuid,
        since: DateTime<Utc>,
    ) -> Result<Vec<NamedCount>, DomainError> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            r#"
            SELECT view_type, COUNT(*) FROM menu_views
            WHERE menu_id = $1 AND created_at >= $2
            GROUP BY view_type
            ORDER BY view_type
            "#,
        )
        .bind(menu_id)
        .bind(since)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_db_error("grouping menu views", e))?;

        Ok(rows
            .into_iter()
            .map(|(name, count)| NamedCount { name, count })
            .collect())
    }

    async fn daily_counts(
        &self,
        menu_id: &Uuid,
        since: DateTime<Utc>,
    ) -> Result<Vec<DailyCount>, DomainError> {
        let rows: Vec<DailyCountRow> = sqlx::query_as(
            r#"
            SELECT (created_at AT TIME ZONE 'UTC')::DATE AS date, COUNT(*) AS count
            FROM menu_views
            WHERE menu_id = $1 AND created_at >= $2
            GROUP BY 1
            ORDER BY 1
            "#,
        )
        .bind(menu_id)
        .bind(since)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_db_error("counting daily menu views", e))?;

        Ok(rows
            .into_iter()
            .map(|r| DailyCount {
                date: r.date,
                count: r.count,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qrest_core::domain::NewMenuItem;

    #[test]
    fn test_assemble_tree_groups_items_in_order() {
        let menu_id = Uuid::new_v4();
        let starters = Category::new(menu_id, "Starters", None, 0).unwrap();
        let mains = Category::new(menu_id, "Mains", None, 1).unwrap();
        let item = |category: &Category, name: &str, sort: i32| {
            MenuItem::new(
                category.id,
                NewMenuItem {
                    name: name.into(),
                    price: 5.0,
                    ..Default::default()
                },
                sort,
            )
            .unwrap()
        };
        let items = vec![
            item(&mains, "Steak", 0),
            item(&starters, "Soup", 0),
            item(&starters, "Salad", 1),
        ];

        let tree = assemble_tree(vec![starters, mains], items);
        assert_eq!(tree.len(), 2);
        assert_eq!(tree[0].category.name, "Starters");
        let names: Vec<&str> = tree[0].items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["Soup", "Salad"]);
        assert_eq!(tree[1].items.len(), 1);
    }

    #[test]
    fn test_assemble_tree_keeps_empty_categories() {
        let category = Category::new(Uuid::new_v4(), "Drinks", None, 0).unwrap();
        let tree = assemble_tree(vec![category], vec![]);
        assert!(tree[0].items.is_empty());
    }
}
