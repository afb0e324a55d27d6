// ============================================================================
// QRest API - Platform Admin Handlers
// File: crates/qrest-api/src/handlers/admin.rs
// Description: Cross-tenant management of organizations, users, menus and catalog
// ============================================================================

use axum::{extract::State, http::StatusCode};
use serde::Deserialize;
use uuid::Uuid;

use qrest_core::domain::{
    CreditPackage, Menu, MenuSummary, MenuTree, OrgStatus, Organization, Plan, SubscriptionPlan,
    User,
};
use qrest_core::repositories::{MenuFilter, OrganizationFilter, PlanFilter};
use qrest_core::services::{
    AdminMenuStats, AdminOrganization, AdminUpdateOrganization, AdminUpdateUser,
    AdminUser as AdminUserDetails, CreatePackage, CreatePlan, PlatformStats, UpdateMenu,
    UpdatePackage, UpdatePlan,
};
use qrest_shared::Pagination;

use crate::error::ApiResult;
use crate::extractors::{AdminUser, ApiJson, ApiPath, ApiQuery};
use crate::response::{ApiResponse, Created, PaginatedResponse};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct OrganizationListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub search: Option<String>,
    pub status: Option<OrgStatus>,
    pub plan: Option<Plan>,
}

#[derive(Debug, Deserialize)]
pub struct UserListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub search: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub search: Option<String>,
    pub org_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanListQuery {
    pub is_active: Option<bool>,
    pub is_public: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: OrgStatus,
}

#[derive(Debug, Deserialize)]
pub struct PlanRequest {
    pub plan: Plan,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

// ---------------------------------------------------------------------------
// Organizations
// ---------------------------------------------------------------------------

/// GET /api/admin/organizations
pub async fn list_organizations(
    State(state): State<AppState>,
    _admin: AdminUser,
    ApiQuery(query): ApiQuery<OrganizationListQuery>,
) -> ApiResult<PaginatedResponse<Organization>> {
    let filter = OrganizationFilter {
        search: non_empty(query.search),
        status: query.status,
        plan: query.plan,
    };
    let page = state
        .admin
        .list_organizations(filter, Pagination::new(query.page, query.limit))
        .await?;
    Ok(page.into())
}

/// GET /api/admin/organizations/{id}
pub async fn get_organization(
    State(state): State<AppState>,
    _admin: AdminUser,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<ApiResponse<AdminOrganization>> {
    let org = state.admin.get_organization(&id).await?;
    Ok(ApiResponse::success(org))
}

/// PUT /api/admin/organizations/{id}
pub async fn update_organization(
    State(state): State<AppState>,
    _admin: AdminUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<AdminUpdateOrganization>,
) -> ApiResult<ApiResponse<Organization>> {
    let org = state.admin.update_organization(&id, payload).await?;
    Ok(ApiResponse::success(org))
}

/// PATCH /api/admin/organizations/{id}/status
pub async fn set_organization_status(
    State(state): State<AppState>,
    _admin: AdminUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<StatusRequest>,
) -> ApiResult<ApiResponse<Organization>> {
    let org = state
        .admin
        .set_organization_status(&id, payload.status)
        .await?;
    Ok(ApiResponse::success(org))
}

/// PATCH /api/admin/organizations/{id}/plan
pub async fn set_organization_plan(
    State(state): State<AppState>,
    _admin: AdminUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<PlanRequest>,
) -> ApiResult<ApiResponse<Organization>> {
    let org = state.admin.set_organization_plan(&id, payload.plan).await?;
    Ok(ApiResponse::success(org))
}

/// GET /api/admin/stats/dashboard
pub async fn platform_stats(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> ApiResult<ApiResponse<PlatformStats>> {
    let stats = state.admin.platform_stats().await?;
    Ok(ApiResponse::success(stats))
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

/// GET /api/admin/users
pub async fn list_users(
    State(state): State<AppState>,
    _admin: AdminUser,
    ApiQuery(query): ApiQuery<UserListQuery>,
) -> ApiResult<PaginatedResponse<User>> {
    let page = state
        .admin
        .list_users(non_empty(query.search), Pagination::new(query.page, query.limit))
        .await?;
    Ok(page.into())
}

/// GET /api/admin/users/{id}
pub async fn get_user(
    State(state): State<AppState>,
    _admin: AdminUser,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<ApiResponse<AdminUserDetails>> {
    let user = state.admin.get_user(&id).await?;
    Ok(ApiResponse::success(user))
}

/// PUT /api/admin/users/{id}
pub async fn update_user(
    State(state): State<AppState>,
    _admin: AdminUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<AdminUpdateUser>,
) -> ApiResult<ApiResponse<User>> {
    let user = state.admin.update_user(&id, payload).await?;
    Ok(ApiResponse::success(user))
}

/// DELETE /api/admin/users/{id}
pub async fn delete_user(
    State(state): State<AppState>,
    _admin: AdminUser,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<StatusCode> {
    state.admin.delete_user(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Menus
// ---------------------------------------------------------------------------

/// GET /api/admin/menus
pub async fn list_menus(
    State(state): State<AppState>,
    _admin: AdminUser,
    ApiQuery(query): ApiQuery<MenuListQuery>,
) -> ApiResult<PaginatedResponse<MenuSummary>> {
    let filter = MenuFilter {
        org_id: query.org_id,
        search: non_empty(query.search),
    };
    let page = state
        .admin
        .list_menus(filter, Pagination::new(query.page, query.limit))
        .await?;
    Ok(page.into())
}

/// GET /api/admin/menus/{id}
pub async fn get_menu(
    State(state): State<AppState>,
    _admin: AdminUser,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<ApiResponse<MenuTree>> {
    let menu = state.admin.get_menu(&id).await?;
    Ok(ApiResponse::success(menu))
}

/// PUT /api/admin/menus/{id}
pub async fn update_menu(
    State(state): State<AppState>,
    _admin: AdminUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<UpdateMenu>,
) -> ApiResult<ApiResponse<Menu>> {
    let menu = state.admin.update_menu(&id, payload).await?;
    Ok(ApiResponse::success(menu))
}

/// DELETE /api/admin/menus/{id}
pub async fn delete_menu(
    State(state): State<AppState>,
    _admin: AdminUser,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<StatusCode> {
    state.admin.delete_menu(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/admin/menus/{id}/stats
pub async fn menu_stats(
    State(state): State<AppState>,
    _admin: AdminUser,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<ApiResponse<AdminMenuStats>> {
    let stats = state.admin.menu_stats(&id).await?;
    Ok(ApiResponse::success(stats))
}

// ---------------------------------------------------------------------------
// Subscription plans
// ---------------------------------------------------------------------------

/// GET /api/admin/subscription-plans
pub async fn list_plans(
    State(state): State<AppState>,
    _admin: AdminUser,
    ApiQuery(query): ApiQuery<PlanListQuery>,
) -> ApiResult<ApiResponse<Vec<SubscriptionPlan>>> {
    let filter = PlanFilter {
        is_active: query.is_active,
        is_public: query.is_public,
    };
    let plans = state.catalog.list_plans(filter).await?;
    Ok(ApiResponse::success(plans))
}

/// GET /api/admin/subscription-plans/{id}
pub async fn get_plan(
    State(state): State<AppState>,
    _admin: AdminUser,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<ApiResponse<SubscriptionPlan>> {
    let plan = state.catalog.get_plan(&id).await?;
    Ok(ApiResponse::success(plan))
}

/// POST /api/admin/subscription-plans
pub async fn create_plan(
    State(state): State<AppState>,
    _admin: AdminUser,
    ApiJson(payload): ApiJson<CreatePlan>,
) -> ApiResult<Created<SubscriptionPlan>> {
    let plan = state.catalog.create_plan(payload).await?;
    Ok(Created(plan))
}

/// PUT /api/admin/subscription-plans/{id}
pub async fn update_plan(
    State(state): State<AppState>,
    _admin: AdminUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<UpdatePlan>,
) -> ApiResult<ApiResponse<SubscriptionPlan>> {
    let plan = state.catalog.update_plan(&id, payload).await?;
    Ok(ApiResponse::success(plan))
}

/// DELETE /api/admin/subscription-plans/{id}
pub async fn delete_plan(
    State(state): State<AppState>,
    _admin: AdminUser,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<StatusCode> {
    state.catalog.delete_plan(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// PATCH /api/admin/subscription-plans/{id}/toggle-active
pub async fn toggle_plan_active(
    State(state): State<AppState>,
    _admin: AdminUser,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<ApiResponse<SubscriptionPlan>> {
    let plan = state.catalog.toggle_plan_active(&id).await?;
    Ok(ApiResponse::success(plan))
}

/// PATCH /api/admin/subscription-plans/{id}/toggle-public
pub async fn toggle_plan_public(
    State(state): State<AppState>,
    _admin: AdminUser,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<ApiResponse<SubscriptionPlan>> {
    let plan = state.catalog.toggle_plan_public(&id).await?;
    Ok(ApiResponse::success(plan))
}

// ---------------------------------------------------------------------------
// Credit packages
// ---------------------------------------------------------------------------

/// GET /api/admin/credit-packages
pub async fn list_packages(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> ApiResult<ApiResponse<Vec<CreditPackage>>> {
    let packages = state.catalog.list_packages().await?;
    Ok(ApiResponse::success(packages))
}

/// GET /api/admin/credit-packages/{id}
pub async fn get_package(
    State(state): State<AppState>,
    _admin: AdminUser,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<ApiResponse<CreditPackage>> {
    let package = state.catalog.get_package(&id).await?;
    Ok(ApiResponse::success(package))
}

/// POST /api/admin/credit-packages
pub async fn create_package(
    State(state): State<AppState>,
    _admin: AdminUser,
    ApiJson(payload): ApiJson<CreatePackage>,
) -> ApiResult<Created<CreditPackage>> {
    let package = state.catalog.create_package(payload).await?;
    Ok(Created(package))
}

/// PUT /api/admin/credit-packages/{id}
pub async fn update_package(
    State(state): State<AppState>,
    _admin: AdminUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<UpdatePackage>,
) -> ApiResult<ApiResponse<CreditPackage>> {
    let package = state.catalog.update_package(&id, payload).await?;
    Ok(ApiResponse::success(package))
}

/// DELETE /api/admin/credit-packages/{id}
pub async fn delete_package(
    State(state): State<AppState>,
    _admin: AdminUser,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<StatusCode> {
    state.catalog.delete_package(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// PATCH /api/admin/credit-packages/{id}/toggle-active
pub async fn toggle_package_active(
    State(state): State<AppState>,
    _admin: AdminUser,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<ApiResponse<CreditPackage>> {
    let package = state.catalog.toggle_package_active(&id).await?;
    Ok(ApiResponse::success(package))
}
