//! Activity log and menu view records

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::user::UserSummary;

/// Action names written to the activity log.
pub mod actions {
    pub const QR_SCAN: &str = "QR_SCAN";
    pub const MENU_CREATED: &str = "MENU_CREATED";
    pub const MENU_UPDATED: &str = "MENU_UPDATED";
    pub const MENU_DELETED: &str = "MENU_DELETED";
    pub const MENU_DUPLICATED: &str = "MENU_DUPLICATED";
    pub const QR_GENERATED: &str = "QR_GENERATED";
    pub const THEME_UPDATED: &str = "THEME_UPDATED";
    pub const TEAM_MEMBER_ADDED: &str = "TEAM_MEMBER_ADDED";
    pub const TEAM_MEMBER_ROLE_UPDATED: &str = "TEAM_MEMBER_ROLE_UPDATED";
    pub const TEAM_MEMBER_REMOVED: &str = "TEAM_MEMBER_REMOVED";
    pub const CREDITS_PURCHASED: &str = "CREDITS_PURCHASED";
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityLog {
    pub id: Uuid,
    pub org_id: Uuid,
    pub user_id: Option<Uuid>,
    pub action: String,
    pub details: Option<Value>,
    pub created_at: DateTime<Utc>,
}

impl ActivityLog {
    pub fn new(org_id: Uuid, user_id: Option<Uuid>, action: &str, details: Option<Value>) -> Self {
        Self {
            id: Uuid::new_v4(),
            org_id,
            user_id,
            action: action.to_string(),
            details,
            created_at: Utc::now(),
        }
    }
}

/// Log row joined with the acting user, when there is one.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityLogEntry {
    #[serde(flatten)]
    pub log: ActivityLog,
    pub user: Option<UserSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NamedCount {
    pub name: String,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyCount {
    pub date: NaiveDate,
    pub count: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ViewType {
    QrScan,
    DirectLink,
    Preview,
}

impl ViewType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViewType::QrScan => "QR_SCAN",
            ViewType::DirectLink => "DIRECT_LINK",
            ViewType::Preview => "PREVIEW",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "QR_SCAN" => Some(ViewType::QrScan),
            "DIRECT_LINK" => Some(ViewType::DirectLink),
            "PREVIEW" => Some(ViewType::Preview),
            _ => None,
        }
    }
}

/// Request metadata captured with a view.
#[derive(Debug, Clone, Default)]
pub struct VisitorInfo {
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
    pub referer: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuView {
    pub id: Uuid,
    pub menu_id: Uuid,
    pub view_type: ViewType,
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
    pub referer: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl MenuView {
    pub fn new(menu_id: Uuid, view_type: ViewType, visitor: VisitorInfo) -> Self {
        Self {
            id: Uuid::new_v4(),
            menu_id,
            view_type,
            user_agent: visitor.user_agent,
            ip_address: visitor.ip_address,
            referer: visitor.referer,
            created_at: Utc::now(),
        }
    }
}
