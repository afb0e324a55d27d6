//! Per-organization public menu theme

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use qrest_shared::constants::DEFAULT_THEME_KEY;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemeSetting {
    pub id: Uuid,
    pub org_id: Uuid,
    pub theme_key: String,
    pub primary: Option<String>,
    pub accent: Option<String>,
    pub custom_css: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ThemeSetting {
    pub fn default_for(org_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            org_id,
            theme_key: DEFAULT_THEME_KEY.to_string(),
            primary: None,
            accent: None,
            custom_css: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Fields accepted by a theme update; `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct ThemeUpdate {
    pub theme_key: Option<String>,
    pub primary: Option<String>,
    pub accent: Option<String>,
    pub custom_css: Option<String>,
}

impl ThemeSetting {
    pub fn apply(&mut self, update: ThemeUpdate) {
        if let Some(key) = update.theme_key {
            self.theme_key = key;
        }
        if update.primary.is_some() {
            self.primary = update.primary;
        }
        if update.accent.is_some() {
            self.accent = update.accent;
        }
        if update.custom_css.is_some() {
            self.custom_css = update.custom_css;
        }
        self.updated_at = Utc::now();
    }
}
