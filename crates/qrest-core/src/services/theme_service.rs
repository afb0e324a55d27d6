//! Organization theme for the public menu

use std::sync::Arc;

use serde::Deserialize;
use serde_json::json;
use tracing::info;
use validator::Validate;

use qrest_shared::utils::HEX_COLOR_REGEX;

use crate::domain::{actions, ActivityLog, Role, ThemeSetting, ThemeUpdate};
use crate::error::DomainError;
use crate::repositories::{ActivityLogRepository, ThemeRepository};
use crate::services::context::Actor;

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTheme {
    #[validate(length(min = 1, max = 50, message = "Theme key is required"))]
    pub theme_key: Option<String>,

    #[validate(regex(path = *HEX_COLOR_REGEX, message = "Primary must be a hex color"))]
    pub primary: Option<String>,

    #[validate(regex(path = *HEX_COLOR_REGEX, message = "Accent must be a hex color"))]
    pub accent: Option<String>,

    #[validate(length(max = 10000, message = "Custom CSS too long"))]
    pub custom_css: Option<String>,
}

pub struct ThemeService {
    themes: Arc<dyn ThemeRepository>,
    activity: Arc<dyn ActivityLogRepository>,
}

impl ThemeService {
    pub fn new(themes: Arc<dyn ThemeRepository>, activity: Arc<dyn ActivityLogRepository>) -> Self {
        Self { themes, activity }
    }

    /// Creates the default theme on first access.
    pub async fn get(&self, actor: &Actor) -> Result<ThemeSetting, DomainError> {
        match self.themes.find_by_org(&actor.org_id).await? {
            Some(theme) => Ok(theme),
            None => self.themes.upsert(&ThemeSetting::default_for(actor.org_id)).await,
        }
    }

    pub async fn update(&self, actor: &Actor, input: UpdateTheme) -> Result<ThemeSetting, DomainError> {
        actor.require_role(Role::Admin)?;
        input.validate()?;

        let mut theme = self
            .themes
            .find_by_org(&actor.org_id)
            .await?
            .unwrap_or_else(|| ThemeSetting::default_for(actor.org_id));
        theme.apply(ThemeUpdate {
            theme_key: input.theme_key,
            primary: input.primary,
            accent: input.accent,
            custom_css: input.custom_css,
        });

        let theme = self.themes.upsert(&theme).await?;
        self.activity
            .create(&ActivityLog::new(
                actor.org_id,
                Some(actor.user_id),
                actions::THEME_UPDATED,
                Some(json!({ "themeKey": theme.theme_key })),
            ))
            .await?;

        info!("Theme updated for org {}", actor.org_id);
        Ok(theme)
    }
}
