// ============================================================================
// QRest Core - Menu Entities
// File: crates/qrest-core/src/domain/menu.rs
// Description: Menu, category and item entities plus the nested menu tree
// ============================================================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use qrest_shared::constants::DEFAULT_MENU_LOCALE;

use super::qr_code::QrCode;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Menu {
    pub id: Uuid,
    pub org_id: Uuid,

    #[validate(length(min = 1, max = 200, message = "Menu name is required"))]
    pub name: String,

    #[validate(length(equal = 2, message = "Locale must be a 2-letter code"))]
    pub locale: String,

    pub is_active: bool,
    pub view_count: i32,
    pub qr_scan_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Menu {
    pub fn new(
        org_id: Uuid,
        name: &str,
        locale: Option<&str>,
    ) -> Result<Self, validator::ValidationErrors> {
        let now = Utc::now();
        let menu = Self {
            id: Uuid::new_v4(),
            org_id,
            name: name.trim().to_string(),
            locale: locale.unwrap_or(DEFAULT_MENU_LOCALE).to_lowercase(),
            is_active: true,
            view_count: 0,
            qr_scan_count: 0,
            created_at: now,
            updated_at: now,
        };

        menu.validate()?;
        Ok(menu)
    }

    /// Fresh copy for duplication; counters start over.
    pub fn duplicate(&self) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            org_id: self.org_id,
            name: format!("{} (Copy)", self.name),
            locale: self.locale.clone(),
            is_active: self.is_active,
            view_count: 0,
            qr_scan_count: 0,
            created_at: now,
            updated_at: now,
        }
    }
}

/// List row: a menu with its category count.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuSummary {
    #[serde(flatten)]
    pub menu: Menu,
    pub category_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: Uuid,
    pub menu_id: Uuid,

    #[validate(length(min = 1, max = 200, message = "Category name is required"))]
    pub name: String,

    #[validate(length(max = 1000, message = "Description too long"))]
    pub description: Option<String>,

    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Category {
    pub fn new(
        menu_id: Uuid,
        name: &str,
        description: Option<String>,
        sort_order: i32,
    ) -> Result<Self, validator::ValidationErrors> {
        let now = Utc::now();
        let category = Self {
            id: Uuid::new_v4(),
            menu_id,
            name: name.trim().to_string(),
            description,
            sort_order,
            created_at: now,
            updated_at: now,
        };

        category.validate()?;
        Ok(category)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryWithCount {
    #[serde(flatten)]
    pub category: Category,
    pub item_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct MenuItem {
    pub id: Uuid,
    pub category_id: Uuid,

    #[validate(length(min = 1, max = 200, message = "Item name is required"))]
    pub name: String,

    #[validate(length(max = 2000, message = "Description too long"))]
    pub description: Option<String>,

    #[validate(range(exclusive_min = 0.0, message = "Price must be positive"))]
    pub price: f64,

    #[validate(url(message = "Invalid image URL"))]
    pub image_url: Option<String>,

    pub is_available: bool,
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for a new menu item.
#[derive(Debug, Clone, Default)]
pub struct NewMenuItem {
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub image_url: Option<String>,
    pub is_available: Option<bool>,
    pub sort_order: Option<i32>,
}

impl MenuItem {
    pub fn new(
        category_id: Uuid,
        input: NewMenuItem,
        sort_order: i32,
    ) -> Result<Self, validator::ValidationErrors> {
        let now = Utc::now();
        let item = Self {
            id: Uuid::new_v4(),
            category_id,
            name: input.name.trim().to_string(),
            description: input.description,
            price: input.price,
            image_url: input.image_url,
            is_available: input.is_available.unwrap_or(true),
            sort_order,
            created_at: now,
            updated_at: now,
        };

        item.validate()?;
        Ok(item)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryWithItems {
    #[serde(flatten)]
    pub category: Category,
    pub items: Vec<MenuItem>,
}

/// A menu with its categories and items, each sorted by `sort_order`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuTree {
    #[serde(flatten)]
    pub menu: Menu,
    pub categories: Vec<CategoryWithItems>,
    pub qr_code: Option<QrCode>,
}

impl MenuTree {
    pub fn item_count(&self) -> usize {
        self.categories.iter().map(|c| c.items.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_menu_default_locale() {
        let menu = Menu::new(Uuid::new_v4(), "Dinner", None).unwrap();
        assert_eq!(menu.locale, "tr");
        assert!(menu.is_active);
    }

    #[test]
    fn test_invalid_locale() {
        assert!(Menu::new(Uuid::new_v4(), "Dinner", Some("eng")).is_err());
        assert!(Menu::new(Uuid::new_v4(), "  ", Some("en")).is_err());
    }

    #[test]
    fn test_duplicate_menu_name() {
        let menu = Menu::new(Uuid::new_v4(), "Lunch", Some("en")).unwrap();
        let copy = menu.duplicate();
        assert_eq!(copy.name, "Lunch (Copy)");
        assert_ne!(copy.id, menu.id);
        assert_eq!(copy.org_id, menu.org_id);
    }

    #[test]
    fn test_item_price_must_be_positive() {
        let input = NewMenuItem {
            name: "Soup".into(),
            price: 0.0,
            ..Default::default()
        };
        assert!(MenuItem::new(Uuid::new_v4(), input, 0).is_err());

        let input = NewMenuItem {
            name: "Soup".into(),
            price: 4.5,
            ..Default::default()
        };
        let item = MenuItem::new(Uuid::new_v4(), input, 2).unwrap();
        assert!(item.is_available);
        assert_eq!(item.sort_order, 2);
    }

    #[test]
    fn test_item_image_url_validated() {
        let input = NewMenuItem {
            name: "Soup".into(),
            price: 4.5,
            image_url: Some("not a url".into()),
            ..Default::default()
        };
        assert!(MenuItem::new(Uuid::new_v4(), input, 0).is_err());
    }

    #[test]
    fn test_summary_flattens() {
        let menu = Menu::new(Uuid::new_v4(), "Dinner", Some("en")).unwrap();
        let json = serde_json::to_value(MenuSummary { menu, category_count: 3 }).unwrap();
        assert_eq!(json["name"], "Dinner");
        assert_eq!(json["categoryCount"], 3);
    }
}
