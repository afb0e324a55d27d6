//! Menu categories, nested under a menu or addressed directly

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::domain::{Category, CategoryWithCount, CategoryWithItems, Role};
use crate::error::DomainError;
use crate::repositories::{CategoryRepository, MenuItemRepository, MenuRepository};
use crate::services::context::Actor;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCategory {
    pub name: String,
    pub description: Option<String>,
    pub sort_order: Option<i32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCategory {
    pub name: Option<String>,
    pub description: Option<String>,
    pub sort_order: Option<i32>,
}

pub struct CategoryService {
    menus: Arc<dyn MenuRepository>,
    categories: Arc<dyn CategoryRepository>,
    items: Arc<dyn MenuItemRepository>,
}

impl CategoryService {
    pub fn new(
        menus: Arc<dyn MenuRepository>,
        categories: Arc<dyn CategoryRepository>,
        items: Arc<dyn MenuItemRepository>,
    ) -> Self {
        Self {
            menus,
            categories,
            items,
        }
    }

    pub async fn list(&self, actor: &Actor, menu_id: &Uuid) -> Result<Vec<CategoryWithCount>, DomainError> {
        self.require_menu(actor, menu_id).await?;
        self.categories.list_by_menu(menu_id).await
    }

    /// `menu_id` is set on nested routes and must match the category's menu.
    pub async fn get(
        &self,
        actor: &Actor,
        category_id: &Uuid,
        menu_id: Option<Uuid>,
    ) -> Result<CategoryWithItems, DomainError> {
        let category = self.scoped(actor, category_id, menu_id).await?;
        let items = self.items.list_by_category(&category.id).await?;
        Ok(CategoryWithItems { category, items })
    }

    pub async fn create(
        &self,
        actor: &Actor,
        menu_id: &Uuid,
        input: CreateCategory,
    ) -> Result<Category, DomainError> {
        actor.require_role(Role::Editor)?;
        self.require_menu(actor, menu_id).await?;

        let sort_order = match input.sort_order {
            Some(order) => order,
            None => next_sort_order(self.categories.max_sort_order(menu_id).await?),
        };
        let category = Category::new(*menu_id, &input.name, input.description, sort_order)?;
        let category = self.categories.create(&category).await?;

        info!("Category {} created in menu {}", category.id, menu_id);
        Ok(category)
    }

    pub async fn update(
        &self,
        actor: &Actor,
        category_id: &Uuid,
        menu_id: Option<Uuid>,
        input: UpdateCategory,
    ) -> Result<Category, DomainError> {
        actor.require_role(Role::Editor)?;
        let mut category = self.scoped(actor, category_id, menu_id).await?;

        if let Some(name) = input.name {
            category.name = name.trim().to_string();
        }
        if input.description.is_some() {
            category.description = input.description;
        }
        if let Some(order) = input.sort_order {
            category.sort_order = order;
        }
        category.validate()?;
        category.updated_at = Utc::now();

        self.categories.update(&category).await
    }

    pub async fn delete(
        &self,
        actor: &Actor,
        category_id: &Uuid,
        menu_id: Option<Uuid>,
    ) -> Result<(), DomainError> {
        actor.require_role(Role::Admin)?;
        let category = self.scoped(actor, category_id, menu_id).await?;
        self.categories.delete(&category.id).await?;
        info!("Category {} deleted", category.id);
        Ok(())
    }

    /// Position in `ids` becomes the new sort order.
    pub async fn reorder(&self, actor: &Actor, menu_id: &Uuid, ids: Vec<Uuid>) -> Result<(), DomainError> {
        actor.require_role(Role::Editor)?;
        self.require_menu(actor, menu_id).await?;

        let known: HashSet<Uuid> = self
            .categories
            .list_by_menu(menu_id)
            .await?
            .into_iter()
            .map(|c| c.category.id)
            .collect();
        if ids.iter().any(|id| !known.contains(id)) {
            return Err(DomainError::ValidationError(
                "Some categories do not belong to this menu".into(),
            ));
        }

        self.categories.reorder(menu_id, ids).await
    }

    async fn require_menu(&self, actor: &Actor, menu_id: &Uuid) -> Result<(), DomainError> {
        match self.menus.find_by_id(menu_id).await? {
            Some(menu) if menu.org_id == actor.org_id => Ok(()),
            _ => Err(DomainError::NotFound("Menu")),
        }
    }

    async fn scoped(
        &self,
        actor: &Actor,
        category_id: &Uuid,
        menu_id: Option<Uuid>,
    ) -> Result<Category, DomainError> {
        let category = self
            .categories
            .find_in_org(category_id, &actor.org_id)
            .await?
            .ok_or(DomainError::NotFound("Category"))?;
        match menu_id {
            Some(menu_id) if menu_id != category.menu_id => Err(DomainError::NotFound("Category")),
            _ => Ok(category),
        }
    }
}

/// Appends after the current maximum, starting at 0 for an empty list.
pub(crate) fn next_sort_order(max: Option<i32>) -> i32 {
    max.map_or(0, |m| m + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Menu;
    use crate::repositories::{MockCategoryRepository, MockMenuItemRepository, MockMenuRepository};

    fn menus_for(org_id: Uuid) -> MockMenuRepository {
        let mut menus = MockMenuRepository::new();
        menus.expect_find_by_id()
            .returning(move |id| Ok(Some(Menu { id: *id, ..Menu::new(org_id, "Menu", None).unwrap() })));
        menus
    }

    fn service(menus: MockMenuRepository, categories: MockCategoryRepository) -> CategoryService {
        CategoryService::new(
            Arc::new(menus),
            Arc::new(categories),
            Arc::new(MockMenuItemRepository::new()),
        )
    }

    #[test]
    fn test_next_sort_order() {
        assert_eq!(next_sort_order(None), 0);
        assert_eq!(next_sort_order(Some(0)), 1);
        assert_eq!(next_sort_order(Some(7)), 8);
    }

    #[tokio::test]
    async fn test_create_appends_after_last() {
        let org_id = Uuid::new_v4();
        let mut categories = MockCategoryRepository::new();
        categories.expect_max_sort_order().returning(|_| Ok(Some(2)));
        categories.expect_create()
            .withf(|c| c.sort_order == 3 && c.name == "Starters")
            .returning(|c| Ok(c.clone()));

        let actor = Actor::new(Uuid::new_v4(), org_id, Role::Editor);
        let category = service(menus_for(org_id), categories)
            .create(
                &actor,
                &Uuid::new_v4(),
                CreateCategory {
                    name: " Starters ".into(),
                    description: None,
                    sort_order: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(category.sort_order, 3);
    }

    #[tokio::test]
    async fn test_create_in_foreign_menu_not_found() {
        let actor = Actor::new(Uuid::new_v4(), Uuid::new_v4(), Role::Owner);
        let err = service(menus_for(Uuid::new_v4()), MockCategoryRepository::new())
            .create(
                &actor,
                &Uuid::new_v4(),
                CreateCategory {
                    name: "Starters".into(),
                    description: None,
                    sort_order: Some(0),
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Menu not found");
    }

    #[tokio::test]
    async fn test_reorder_rejects_unknown_ids() {
        let org_id = Uuid::new_v4();
        let menu_id = Uuid::new_v4();
        let existing = Category::new(menu_id, "Mains", None, 0).unwrap();
        let mut categories = MockCategoryRepository::new();
        categories.expect_list_by_menu().returning(move |_| {
            Ok(vec![CategoryWithCount {
                category: existing.clone(),
                item_count: 0,
            }])
        });
        categories.expect_reorder().never();

        let actor = Actor::new(Uuid::new_v4(), org_id, Role::Editor);
        let err = service(menus_for(org_id), categories)
            .reorder(&actor, &menu_id, vec![Uuid::new_v4()])
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::ValidationError(_)));
    }

    #[tokio::test]
    async fn test_nested_get_checks_menu() {
        let org_id = Uuid::new_v4();
        let mut categories = MockCategoryRepository::new();
        categories.expect_find_in_org()
            .returning(|_, _| Ok(Some(Category::new(Uuid::new_v4(), "Mains", None, 0).unwrap())));

        let actor = Actor::new(Uuid::new_v4(), org_id, Role::Viewer);
        let err = service(MockMenuRepository::new(), categories)
            .get(&actor, &Uuid::new_v4(), Some(Uuid::new_v4()))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Category not found");
    }

    #[tokio::test]
    async fn test_editor_cannot_delete() {
        let actor = Actor::new(Uuid::new_v4(), Uuid::new_v4(), Role::Editor);
        let err = service(MockMenuRepository::new(), MockCategoryRepository::new())
            .delete(&actor, &Uuid::new_v4(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));
    }
}
