//! Menu items, nested under a category or addressed directly

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::domain::{Category, MenuItem, NewMenuItem, Role};
use crate::error::DomainError;
use crate::repositories::{CategoryRepository, MenuItemRepository};
use crate::services::category_service::next_sort_order;
use crate::services::context::Actor;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMenuItem {
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub image_url: Option<String>,
    pub is_available: Option<bool>,
    pub sort_order: Option<i32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMenuItem {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub image_url: Option<String>,
    pub is_available: Option<bool>,
    pub sort_order: Option<i32>,
}

pub struct MenuItemService {
    categories: Arc<dyn CategoryRepository>,
    items: Arc<dyn MenuItemRepository>,
}

impl MenuItemService {
    pub fn new(categories: Arc<dyn CategoryRepository>, items: Arc<dyn MenuItemRepository>) -> Self {
        Self { categories, items }
    }

    /// `menu_id` is set on nested routes and must own the category.
    pub async fn list(
        &self,
        actor: &Actor,
        category_id: &Uuid,
        menu_id: Option<Uuid>,
    ) -> Result<Vec<MenuItem>, DomainError> {
        let category = self.category(actor, category_id, menu_id).await?;
        self.items.list_by_category(&category.id).await
    }

    pub async fn get(
        &self,
        actor: &Actor,
        item_id: &Uuid,
        category_id: Option<Uuid>,
    ) -> Result<MenuItem, DomainError> {
        self.scoped(actor, item_id, category_id).await
    }

    pub async fn create(
        &self,
        actor: &Actor,
        category_id: &Uuid,
        menu_id: Option<Uuid>,
        input: CreateMenuItem,
    ) -> Result<MenuItem, DomainError> {
        actor.require_role(Role::Editor)?;
        let category = self.category(actor, category_id, menu_id).await?;

        let sort_order = match input.sort_order {
            Some(order) => order,
            None => next_sort_order(self.items.max_sort_order(&category.id).await?),
        };
        let item = MenuItem::new(
            category.id,
            NewMenuItem {
                name: input.name,
                description: input.description,
                price: input.price,
                image_url: input.image_url,
                is_available: input.is_available,
                sort_order: input.sort_order,
            },
            sort_order,
        )?;
        let item = self.items.create(&item).await?;

        info!("Item {} created in category {}", item.id, category.id);
        Ok(item)
    }

    pub async fn update(
        &self,
        actor: &Actor,
        item_id: &Uuid,
        category_id: Option<Uuid>,
        input: UpdateMenuItem,
    ) -> Result<MenuItem, DomainError> {
        actor.require_role(Role::Editor)?;
        let mut item = self.scoped(actor, item_id, category_id).await?;

        if let Some(name) = input.name {
            item.name = name.trim().to_string();
        }
        if input.description.is_some() {
            item.description = input.description;
        }
        if let Some(price) = input.price {
            item.price = price;
        }
        if input.image_url.is_some() {
            item.image_url = input.image_url;
        }
        if let Some(available) = input.is_available {
            item.is_available = available;
        }
        if let Some(order) = input.sort_order {
            item.sort_order = order;
        }
        item.validate()?;
        item.updated_at = Utc::now();

        self.items.update(&item).await
    }

    /// Nested deletes need ADMIN; the standalone route allows EDITOR.
    pub async fn delete(
        &self,
        actor: &Actor,
        item_id: &Uuid,
        category_id: Option<Uuid>,
    ) -> Result<(), DomainError> {
        let required = if category_id.is_some() { Role::Admin } else { Role::Editor };
        actor.require_role(required)?;

        let item = self.scoped(actor, item_id, category_id).await?;
        self.items.delete(&item.id).await?;
        info!("Item {} deleted", item.id);
        Ok(())
    }

    pub async fn reorder(
        &self,
        actor: &Actor,
        category_id: &Uuid,
        menu_id: Option<Uuid>,
        ids: Vec<Uuid>,
    ) -> Result<(), DomainError> {
        actor.require_role(Role::Editor)?;
        let category = self.category(actor, category_id, menu_id).await?;

        let known: HashSet<Uuid> = self
            .items
            .list_by_category(&category.id)
            .await?
            .into_iter()
            .map(|i| i.id)
            .collect();
        if ids.iter().any(|id| !known.contains(id)) {
            return Err(DomainError::ValidationError(
                "Some items do not belong to this category".into(),
            ));
        }

        self.items.reorder(&category.id, ids).await
    }

    async fn category(
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

    async fn scoped(
        &self,
        actor: &Actor,
        item_id: &Uuid,
        category_id: Option<Uuid>,
    ) -> Result<MenuItem, DomainError> {
        let item = self
            .items
            .find_in_org(item_id, &actor.org_id)
            .await?
            .ok_or(DomainError::NotFound("Menu item"))?;
        match category_id {
            Some(category_id) if category_id != item.category_id => {
                Err(DomainError::NotFound("Menu item"))
            }
            _ => Ok(item),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::{MockCategoryRepository, MockMenuItemRepository};

    fn category_in_org() -> MockCategoryRepository {
        let mut categories = MockCategoryRepository::new();
        categories.expect_find_in_org().returning(|id, _| {
            Ok(Some(Category {
                id: *id,
                ..Category::new(Uuid::new_v4(), "Mains", None, 0).unwrap()
            }))
        });
        categories
    }

    fn input(price: f64) -> CreateMenuItem {
        CreateMenuItem {
            name: "Burger".into(),
            description: None,
            price,
            image_url: None,
            is_available: None,
            sort_order: None,
        }
    }

    #[tokio::test]
    async fn test_create_first_item_gets_zero() {
        let mut items = MockMenuItemRepository::new();
        items.expect_max_sort_order().returning(|_| Ok(None));
        items.expect_create()
            .withf(|i| i.sort_order == 0 && i.is_available)
            .returning(|i| Ok(i.clone()));

        let actor = Actor::new(Uuid::new_v4(), Uuid::new_v4(), Role::Editor);
        let item = MenuItemService::new(Arc::new(category_in_org()), Arc::new(items))
            .create(&actor, &Uuid::new_v4(), None, input(12.5))
            .await
            .unwrap();
        assert_eq!(item.price, 12.5);
    }

    #[tokio::test]
    async fn test_create_rejects_non_positive_price() {
        let mut items = MockMenuItemRepository::new();
        items.expect_max_sort_order().returning(|_| Ok(Some(1)));

        let actor = Actor::new(Uuid::new_v4(), Uuid::new_v4(), Role::Editor);
        let err = MenuItemService::new(Arc::new(category_in_org()), Arc::new(items))
            .create(&actor, &Uuid::new_v4(), None, input(0.0))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("price"));
    }

    #[tokio::test]
    async fn test_nested_delete_requires_admin() {
        let actor = Actor::new(Uuid::new_v4(), Uuid::new_v4(), Role::Editor);
        let service = MenuItemService::new(
            Arc::new(MockCategoryRepository::new()),
            Arc::new(MockMenuItemRepository::new()),
        );
        let err = service
            .delete(&actor, &Uuid::new_v4(), Some(Uuid::new_v4()))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_standalone_delete_allows_editor() {
        let mut items = MockMenuItemRepository::new();
        items.expect_find_in_org().returning(|id, _| {
            let mut item = MenuItem::new(Uuid::new_v4(), NewMenuItem {
                name: "Tea".into(),
                price: 2.0,
                ..Default::default()
            }, 0)
            .unwrap();
            item.id = *id;
            Ok(Some(item))
        });
        items.expect_delete().times(1).returning(|_| Ok(true));

        let actor = Actor::new(Uuid::new_v4(), Uuid::new_v4(), Role::Editor);
        MenuItemService::new(Arc::new(MockCategoryRepository::new()), Arc::new(items))
            .delete(&actor, &Uuid::new_v4(), None)
            .await
            .unwrap();
    }
}
