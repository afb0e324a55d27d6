//! Menu, category and item repository traits (ports)

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use qrest_shared::Pagination;

use crate::domain::{
    Category, CategoryWithCount, CategoryWithItems, DailyCount, Menu, MenuItem, MenuSummary,
    MenuView, NamedCount,
};
use crate::error::DomainError;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MenuFilter {
    pub org_id: Option<Uuid>,
    pub search: Option<String>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MenuRepository: Send + Sync {
    /// Newest first, with category counts.
    async fn list(
        &self,
        filter: MenuFilter,
        page: Pagination,
    ) -> Result<(Vec<MenuSummary>, i64), DomainError>;
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<Menu>, DomainError>;
    async fn create(&self, menu: &Menu) -> Result<Menu, DomainError>;
    async fn update(&self, menu: &Menu) -> Result<Menu, DomainError>;
    async fn delete(&self, id: &Uuid) -> Result<bool, DomainError>;
    /// Inserts `copy` and clones every category and item of `source_id` into it,
    /// in one transaction.
    async fn duplicate(&self, source_id: &Uuid, copy: &Menu) -> Result<Menu, DomainError>;
    /// Categories sorted by sort order, each with its items sorted.
    async fn load_categories(
        &self,
        menu_id: &Uuid,
        available_only: bool,
    ) -> Result<Vec<CategoryWithItems>, DomainError>;
    async fn count(&self, org_id: Option<Uuid>) -> Result<i64, DomainError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CategoryRepository: Send + Sync {
    async fn list_by_menu(&self, menu_id: &Uuid) -> Result<Vec<CategoryWithCount>, DomainError>;
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<Category>, DomainError>;
    /// Category by id, only when its menu belongs to `org_id`.
    async fn find_in_org(&self, id: &Uuid, org_id: &Uuid) -> Result<Option<Category>, DomainError>;
    async fn max_sort_order(&self, menu_id: &Uuid) -> Result<Option<i32>, DomainError>;
    async fn create(&self, category: &Category) -> Result<Category, DomainError>;
    async fn update(&self, category: &Category) -> Result<Category, DomainError>;
    async fn delete(&self, id: &Uuid) -> Result<bool, DomainError>;
    /// Sets sort order to the list index. Fails with a validation error when
    /// an id does not belong to the menu; nothing is written in that case.
    async fn reorder(&self, menu_id: &Uuid, ids: Vec<Uuid>) -> Result<(), DomainError>;
    async fn count_by_org(&self, org_id: &Uuid) -> Result<i64, DomainError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MenuItemRepository: Send + Sync {
    async fn list_by_category(&self, category_id: &Uuid) -> Result<Vec<MenuItem>, DomainError>;
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<MenuItem>, DomainError>;
    /// Item by id, only when its menu belongs to `org_id`.
    async fn find_in_org(&self, id: &Uuid, org_id: &Uuid) -> Result<Option<MenuItem>, DomainError>;
    async fn max_sort_order(&self, category_id: &Uuid) -> Result<Option<i32>, DomainError>;
    async fn create(&self, item: &MenuItem) -> Result<MenuItem, DomainError>;
    async fn update(&self, item: &MenuItem) -> Result<MenuItem, DomainError>;
    async fn delete(&self, id: &Uuid) -> Result<bool, DomainError>;
    async fn reorder(&self, category_id: &Uuid, ids: Vec<Uuid>) -> Result<(), DomainError>;
    async fn count_by_org(&self, org_id: &Uuid) -> Result<i64, DomainError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MenuViewRepository: Send + Sync {
    /// Stores the view and bumps the menu's view (and, for scans, scan) counter.
    async fn record(&self, view: &MenuView) -> Result<(), DomainError>;
    async fn count_by_type(
        &self,
        menu_id: &Uuid,
        since: DateTime<Utc>,
    ) -> Result<Vec<NamedCount>, DomainError>;
    async fn daily_counts(
        &self,
        menu_id: &Uuid,
        since: DateTime<Utc>,
    ) -> Result<Vec<DailyCount>, DomainError>;
}
