// ============================================================================
// QRest Core - Activity Service
// File: crates/qrest-core/src/services/activity_service.rs
// Description: Activity log queries and the organization dashboard
// ============================================================================

use std::sync::Arc;

use chrono::{Duration, Utc};
use serde::Serialize;
use uuid::Uuid;

use qrest_shared::constants::RECENT_WINDOW_DAYS;
use qrest_shared::{Paginated, Pagination};

use crate::domain::{actions, ActivityLogEntry, DailyCount, OrgStatus, Plan};
use crate::error::DomainError;
use crate::repositories::{
    ActivityLogRepository, CategoryRepository, MembershipRepository, MenuItemRepository,
    MenuRepository, OrganizationRepository,
};
use crate::services::context::require_membership;

const TOP_MENUS_LIMIT: i64 = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionCount {
    pub action: String,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityStats {
    pub action_counts: Vec<ActionCount>,
    pub recent_count: i64,
    pub total: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardCounts {
    pub menus: i64,
    pub categories: i64,
    pub items: i64,
    pub total_scans: i64,
    pub recent_scans: i64,
    pub team_members: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardOrganization {
    pub plan: Plan,
    pub status: OrgStatus,
    pub ai_credits: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopMenu {
    pub menu_name: String,
    pub scans: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub counts: DashboardCounts,
    pub organization: DashboardOrganization,
    pub top_menus: Vec<TopMenu>,
    pub daily_scans: Vec<DailyCount>,
}

pub struct ActivityService {
    activity: Arc<dyn ActivityLogRepository>,
    memberships: Arc<dyn MembershipRepository>,
    organizations: Arc<dyn OrganizationRepository>,
    menus: Arc<dyn MenuRepository>,
    categories: Arc<dyn CategoryRepository>,
    items: Arc<dyn MenuItemRepository>,
}

impl ActivityService {
    pub fn new(
        activity: Arc<dyn ActivityLogRepository>,
        memberships: Arc<dyn MembershipRepository>,
        organizations: Arc<dyn OrganizationRepository>,
        menus: Arc<dyn MenuRepository>,
        categories: Arc<dyn CategoryRepository>,
        items: Arc<dyn MenuItemRepository>,
    ) -> Self {
        Self {
            activity,
            memberships,
            organizations,
            menus,
            categories,
            items,
        }
    }

    pub async fn list(
        &self,
        user_id: &Uuid,
        org_id: &Uuid,
        action: Option<String>,
        page: Pagination,
    ) -> Result<Paginated<ActivityLogEntry>, DomainError> {
        require_membership(self.memberships.as_ref(), user_id, org_id).await?;
        let action = action.filter(|a| !a.is_empty());
        let (entries, total) = self.activity.list(org_id, action, page).await?;
        Ok(Paginated::new(entries, page, total))
    }

    pub async fn stats(&self, user_id: &Uuid, org_id: &Uuid) -> Result<ActivityStats, DomainError> {
        require_membership(self.memberships.as_ref(), user_id, org_id).await?;

        let action_counts: Vec<ActionCount> = self
            .activity
            .action_counts(org_id)
            .await?
            .into_iter()
            .map(|c| ActionCount {
                action: c.name,
                count: c.count,
            })
            .collect();
        let since = Utc::now() - Duration::days(RECENT_WINDOW_DAYS);
        let recent_count = self.activity.count(org_id, None, Some(since)).await?;

        Ok(ActivityStats {
            total: action_counts.iter().map(|c| c.count).sum(),
            action_counts,
            recent_count,
        })
    }

    pub async fn recent(
        &self,
        user_id: &Uuid,
        org_id: &Uuid,
        limit: i64,
    ) -> Result<Vec<ActivityLogEntry>, DomainError> {
        require_membership(self.memberships.as_ref(), user_id, org_id).await?;
        let page = Pagination::new(Some(1), Some(limit));
        let (entries, _) = self.activity.list(org_id, None, page).await?;
        Ok(entries)
    }

    pub async fn dashboard(&self, user_id: &Uuid, org_id: &Uuid) -> Result<DashboardStats, DomainError> {
        require_membership(self.memberships.as_ref(), user_id, org_id).await?;

        let organization = self
            .organizations
            .find_by_id(org_id)
            .await?
            .ok_or(DomainError::NotFound("Organization"))?;
        let since = Utc::now() - Duration::days(RECENT_WINDOW_DAYS);
        let scan = Some(actions::QR_SCAN.to_string());

        let counts = DashboardCounts {
            menus: self.menus.count(Some(*org_id)).await?,
            categories: self.categories.count_by_org(org_id).await?,
            items: self.items.count_by_org(org_id).await?,
            total_scans: self.activity.count(org_id, scan.clone(), None).await?,
            recent_scans: self.activity.count(org_id, scan, Some(since)).await?,
            team_members: self.organizations.counts(org_id).await?.members,
        };

        let top_menus = self
            .activity
            .top_scanned_menus(org_id, TOP_MENUS_LIMIT)
            .await?
            .into_iter()
            .map(|c| TopMenu {
                menu_name: c.name,
                scans: c.count,
            })
            .collect();
        let daily_scans = self
            .activity
            .daily_counts(org_id, actions::QR_SCAN.to_string(), since)
            .await?;

        Ok(DashboardStats {
            counts,
            organization: DashboardOrganization {
                plan: organization.plan,
                status: organization.status,
                ai_credits: organization.ai_credits,
            },
            top_menus,
            daily_scans,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Membership, NamedCount, Organization, OrganizationCounts, Role};
    use crate::repositories::{
        MockActivityLogRepository, MockCategoryRepository, MockMembershipRepository,
        MockMenuItemRepository, MockMenuRepository, MockOrganizationRepository,
    };

    fn member() -> MockMembershipRepository {
        let mut memberships = MockMembershipRepository::new();
        memberships.expect_find()
            .returning(|u, o| Ok(Some(Membership::new(*u, *o, Role::Viewer))));
        memberships
    }

    fn service(
        activity: MockActivityLogRepository,
        memberships: MockMembershipRepository,
        organizations: MockOrganizationRepository,
        menus: MockMenuRepository,
        categories: MockCategoryRepository,
        items: MockMenuItemRepository,
    ) -> ActivityService {
        ActivityService::new(
            Arc::new(activity),
            Arc::new(memberships),
            Arc::new(organizations),
            Arc::new(menus),
            Arc::new(categories),
            Arc::new(items),
        )
    }

    #[tokio::test]
    async fn test_non_member_forbidden() {
        let mut memberships = MockMembershipRepository::new();
        memberships.expect_find().returning(|_, _| Ok(None));
        let err = service(
            MockActivityLogRepository::new(),
            memberships,
            MockOrganizationRepository::new(),
            MockMenuRepository::new(),
            MockCategoryRepository::new(),
            MockMenuItemRepository::new(),
        )
        .dashboard(&Uuid::new_v4(), &Uuid::new_v4())
        .await
        .unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_stats_totals_action_counts() {
        let mut activity = MockActivityLogRepository::new();
        activity.expect_action_counts().returning(|_| {
            Ok(vec![
                NamedCount { name: "MENU_CREATED".into(), count: 3 },
                NamedCount { name: "QR_SCAN".into(), count: 10 },
            ])
        });
        activity.expect_count()
            .withf(|_, action, since| action.is_none() && since.is_some())
            .returning(|_, _, _| Ok(4));

        let stats = service(
            activity,
            member(),
            MockOrganizationRepository::new(),
            MockMenuRepository::new(),
            MockCategoryRepository::new(),
            MockMenuItemRepository::new(),
        )
        .stats(&Uuid::new_v4(), &Uuid::new_v4())
        .await
        .unwrap();
        assert_eq!(stats.total, 13);
        assert_eq!(stats.recent_count, 4);
        assert_eq!(stats.action_counts[0].action, "MENU_CREATED");
    }

    #[tokio::test]
    async fn test_dashboard_aggregates() {
        let org = Organization::new("Cafe", "cafe").unwrap();
        let mut organizations = MockOrganizationRepository::new();
        organizations.expect_find_by_id().returning(move |_| Ok(Some(org.clone())));
        organizations.expect_counts()
            .returning(|_| Ok(OrganizationCounts { members: 3, menus: 2 }));
        let mut menus = MockMenuRepository::new();
        menus.expect_count().returning(|_| Ok(2));
        let mut categories = MockCategoryRepository::new();
        categories.expect_count_by_org().returning(|_| Ok(5));
        let mut items = MockMenuItemRepository::new();
        items.expect_count_by_org().returning(|_| Ok(20));
        let mut activity = MockActivityLogRepository::new();
        activity.expect_count()
            .returning(|_, _, since| Ok(if since.is_some() { 7 } else { 40 }));
        activity.expect_top_scanned_menus()
            .withf(|_, limit| *limit == 5)
            .returning(|_, _| Ok(vec![NamedCount { name: "Lunch".into(), count: 30 }]));
        activity.expect_daily_counts().returning(|_, _, _| Ok(vec![]));

        let stats = service(activity, member(), organizations, menus, categories, items)
            .dashboard(&Uuid::new_v4(), &Uuid::new_v4())
            .await
            .unwrap();
        assert_eq!(stats.counts.total_scans, 40);
        assert_eq!(stats.counts.recent_scans, 7);
        assert_eq!(stats.counts.team_members, 3);
        assert_eq!(stats.organization.ai_credits, 50);
        assert_eq!(stats.top_menus, vec![TopMenu { menu_name: "Lunch".into(), scans: 30 }]);
    }
}
