// ============================================================================
// QRest Core - Organization Entity
// File: crates/qrest-core/src/domain/organization.rs
// Description: Tenant entity with plan, status and AI credit balance
// ============================================================================

use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use qrest_shared::constants::SIGNUP_AI_CREDITS;
use qrest_shared::utils::SLUG_REGEX;

/// Subscription plan tier stored on the organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Plan {
    #[default]
    Free,
    Starter,
    Pro,
    Business,
    Enterprise,
}

impl Plan {
    pub fn as_str(&self) -> &'static str {
        match self {
            Plan::Free => "FREE",
            Plan::Starter => "STARTER",
            Plan::Pro => "PRO",
            Plan::Business => "BUSINESS",
            Plan::Enterprise => "ENTERPRISE",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "FREE" => Some(Plan::Free),
            "STARTER" => Some(Plan::Starter),
            "PRO" => Some(Plan::Pro),
            "BUSINESS" => Some(Plan::Business),
            "ENTERPRISE" => Some(Plan::Enterprise),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrgStatus {
    #[default]
    Active,
    Suspended,
    Deleted,
}

impl OrgStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrgStatus::Active => "ACTIVE",
            OrgStatus::Suspended => "SUSPENDED",
            OrgStatus::Deleted => "DELETED",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "ACTIVE" => Some(OrgStatus::Active),
            "SUSPENDED" => Some(OrgStatus::Suspended),
            "DELETED" => Some(OrgStatus::Deleted),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Organization {
    pub id: Uuid,

    #[validate(length(min = 1, max = 100, message = "Organization name is required"))]
    pub name: String,

    #[validate(
        length(min = 3, max = 60, message = "Slug must be at least 3 characters"),
        regex(path = *SLUG_REGEX, message = "Slug must contain only lowercase letters, numbers, and hyphens")
    )]
    pub slug: String,

    pub plan: Plan,
    pub status: OrgStatus,
    pub ai_credits: i32,
    pub ai_credits_used: i32,
    pub credit_reset_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Organization {
    /// New FREE-plan organization with the signup credit grant. The first
    /// monthly reset is scheduled for the first day of next month.
    pub fn new(name: &str, slug: &str) -> Result<Self, validator::ValidationErrors> {
        let now = Utc::now();
        let org = Self {
            id: Uuid::new_v4(),
            name: name.trim().to_string(),
            slug: slug.trim().to_string(),
            plan: Plan::Free,
            status: OrgStatus::Active,
            ai_credits: SIGNUP_AI_CREDITS,
            ai_credits_used: 0,
            credit_reset_date: Some(first_day_of_next_month(now)),
            created_at: now,
            updated_at: now,
        };

        org.validate()?;
        Ok(org)
    }

    pub fn is_active(&self) -> bool {
        self.status == OrgStatus::Active
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    pub fn summary(&self) -> OrganizationSummary {
        OrganizationSummary {
            id: self.id,
            name: self.name.clone(),
            slug: self.slug.clone(),
        }
    }
}

/// Public projection of an organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationSummary {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationCounts {
    pub members: i64,
    pub menus: i64,
}

/// Midnight UTC on the first day of the month after `now`.
pub fn first_day_of_next_month(now: DateTime<Utc>) -> DateTime<Utc> {
    let (year, month) = if now.month() == 12 {
        (now.year() + 1, 1)
    } else {
        (now.year(), now.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| Utc.from_utc_datetime(&dt))
        .unwrap_or(now)
}
