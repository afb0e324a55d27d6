//! QR code generation, styling and rendering for menus

use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{info, warn};
use uuid::Uuid;

use qrest_security::token::generate_short_id;
use qrest_shared::constants::{QR_DOWNLOAD_WIDTH, QR_PREVIEW_WIDTH, SHORT_ID_MAX_ATTEMPTS};

use crate::domain::{actions, ActivityLog, Menu, QrCode, QrFormat, Role};
use crate::error::DomainError;
use crate::ports::QrRenderer;
use crate::repositories::{ActivityLogRepository, MenuRepository, QrCodeRepository};
use crate::services::context::Actor;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QrPreview {
    pub data_url: String,
    pub url: String,
    pub short_id: String,
}

/// Rendered file ready to be sent as an attachment.
#[derive(Debug, Clone)]
pub struct QrDownload {
    pub body: Vec<u8>,
    pub content_type: &'static str,
    pub filename: String,
}

pub struct QrCodeService {
    menus: Arc<dyn MenuRepository>,
    qr_codes: Arc<dyn QrCodeRepository>,
    activity: Arc<dyn ActivityLogRepository>,
    renderer: Arc<dyn QrRenderer>,
    frontend_url: String,
}

impl QrCodeService {
    pub fn new(
        menus: Arc<dyn MenuRepository>,
        qr_codes: Arc<dyn QrCodeRepository>,
        activity: Arc<dyn ActivityLogRepository>,
        renderer: Arc<dyn QrRenderer>,
        frontend_url: String,
    ) -> Self {
        Self {
            menus,
            qr_codes,
            activity,
            renderer,
            frontend_url: frontend_url.trim_end_matches('/').to_string(),
        }
    }

    /// Public address encoded into the QR image.
    pub fn public_url(&self, short_id: &str) -> String {
        format!("{}/m/{}", self.frontend_url, short_id)
    }

    pub async fn get(&self, actor: &Actor, menu_id: &Uuid) -> Result<QrCode, DomainError> {
        let menu = self.owned_menu(actor, menu_id).await?;
        self.existing(&menu.id).await
    }

    /// Returns the existing code when the menu already has one. The boolean
    /// is `true` when a new code was created.
    pub async fn generate(
        &self,
        actor: &Actor,
        menu_id: &Uuid,
        style: Option<Value>,
    ) -> Result<(QrCode, bool), DomainError> {
        actor.require_role(Role::Editor)?;
        let menu = self.owned_menu(actor, menu_id).await?;

        if let Some(existing) = self.qr_codes.find_by_menu(&menu.id).await? {
            return Ok((existing, false));
        }

        let short_id = self.unique_short_id().await?;
        let qr = QrCode::new(menu.id, short_id, style.unwrap_or_else(|| json!({})));
        let qr = self.qr_codes.create(&qr).await?;

        self.activity
            .create(&ActivityLog::new(
                actor.org_id,
                Some(actor.user_id),
                actions::QR_GENERATED,
                Some(json!({ "menuId": menu.id, "menuName": menu.name, "shortId": qr.short_id })),
            ))
            .await?;

        info!("QR code {} generated for menu {}", qr.short_id, menu.id);
        Ok((qr, true))
    }

    pub async fn update_style(&self, actor: &Actor, menu_id: &Uuid, style: Value) -> Result<QrCode, DomainError> {
        actor.require_role(Role::Editor)?;
        let menu = self.owned_menu(actor, menu_id).await?;
        self.qr_codes
            .update_style(&menu.id, style)
            .await?
            .ok_or(DomainError::NotFound("QR code"))
    }

    pub async fn preview(&self, actor: &Actor, menu_id: &Uuid) -> Result<QrPreview, DomainError> {
        let menu = self.owned_menu(actor, menu_id).await?;
        let qr = self.existing(&menu.id).await?;

        let url = self.public_url(&qr.short_id);
        let png = self.renderer.render_png(&url, QR_PREVIEW_WIDTH, &qr.style())?;

        Ok(QrPreview {
            data_url: format!("data:image/png;base64,{}", STANDARD.encode(png)),
            url,
            short_id: qr.short_id,
        })
    }

    pub async fn download(
        &self,
        actor: &Actor,
        menu_id: &Uuid,
        format: QrFormat,
    ) -> Result<QrDownload, DomainError> {
        let menu = self.owned_menu(actor, menu_id).await?;
        let qr = self.existing(&menu.id).await?;

        let url = self.public_url(&qr.short_id);
        let style = qr.style();
        let body = match format {
            QrFormat::Png => self.renderer.render_png(&url, QR_DOWNLOAD_WIDTH, &style)?,
            QrFormat::Svg => self
                .renderer
                .render_svg(&url, QR_DOWNLOAD_WIDTH, &style)?
                .into_bytes(),
        };

        Ok(QrDownload {
            body,
            content_type: format.content_type(),
            filename: format!("qr-{}.{}", qr.short_id, format.extension()),
        })
    }

    async fn unique_short_id(&self) -> Result<String, DomainError> {
        for attempt in 1..=SHORT_ID_MAX_ATTEMPTS {
            let candidate = generate_short_id();
            if !self.qr_codes.short_id_exists(&candidate).await? {
                return Ok(candidate);
            }
            warn!("Short id collision on attempt {}", attempt);
        }
        Err(DomainError::InternalError(
            "Could not allocate a unique short id".into(),
        ))
    }

    async fn existing(&self, menu_id: &Uuid) -> Result<QrCode, DomainError> {
        self.qr_codes
            .find_by_menu(menu_id)
            .await?
            .ok_or(DomainError::NotFound("QR code"))
    }

    async fn owned_menu(&self, actor: &Actor, menu_id: &Uuid) -> Result<Menu, DomainError> {
        match self.menus.find_by_id(menu_id).await? {
            Some(menu) if menu.org_id == actor.org_id => Ok(menu),
            _ => Err(DomainError::NotFound("Menu")),
        }
    }
}
