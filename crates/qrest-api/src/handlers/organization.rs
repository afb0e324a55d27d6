//! Current-organization, member management and activity log handlers

use axum::extract::State;
use serde::Deserialize;
use uuid::Uuid;

use qrest_core::domain::{ActivityLogEntry, MemberWithUser, Organization, Role};
use qrest_core::services::{ActivityStats, OrganizationDetails, UpdateOrganization};
use qrest_shared::Pagination;

use crate::error::ApiResult;
use crate::extractors::{ApiJson, ApiPath, ApiQuery, AuthUser};
use crate::response::{ApiResponse, PaginatedResponse};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RoleRequest {
    pub role: Role,
}

#[derive(Debug, Default, Deserialize)]
pub struct LogsQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub action: Option<String>,
}

/// GET /api/organization
pub async fn current(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<ApiResponse<OrganizationDetails>> {
    let details = state.organizations.current(&user.actor()?).await?;
    Ok(ApiResponse::success(details))
}

/// PATCH /api/organization
pub async fn update_current(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(payload): ApiJson<UpdateOrganization>,
) -> ApiResult<ApiResponse<Organization>> {
    let org = state.organizations.update(&user.actor()?, payload).await?;
    Ok(ApiResponse::success_with_message(org, "Organization updated"))
}

/// GET /api/organization/members
pub async fn members(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<ApiResponse<Vec<MemberWithUser>>> {
    let members = state.organizations.members(&user.actor()?).await?;
    Ok(ApiResponse::success(members))
}

/// PATCH /api/organization/members/{user_id}/role
pub async fn update_member_role(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(member_user_id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<RoleRequest>,
) -> ApiResult<ApiResponse<MemberWithUser>> {
    let member = state
        .organizations
        .update_member_role(&user.actor()?, &member_user_id, payload.role)
        .await?;
    Ok(ApiResponse::success_with_message(member, "Member role updated"))
}

/// DELETE /api/organization/members/{user_id}
pub async fn remove_member(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(member_user_id): ApiPath<Uuid>,
) -> ApiResult<ApiResponse<()>> {
    state
        .organizations
        .remove_member(&user.actor()?, &member_user_id)
        .await?;
    Ok(ApiResponse::message("Member removed"))
}

/// GET /api/organization/{org_id}
pub async fn get_by_id(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(org_id): ApiPath<Uuid>,
) -> ApiResult<ApiResponse<OrganizationDetails>> {
    let details = state.organizations.get_by_id(&user.actor()?, &org_id).await?;
    Ok(ApiResponse::success(details))
}

/// PUT /api/organization/{org_id}
pub async fn update_by_id(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(org_id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<UpdateOrganization>,
) -> ApiResult<ApiResponse<Organization>> {
    let org = state
        .organizations
        .update_by_id(&user.actor()?, &org_id, payload)
        .await?;
    Ok(ApiResponse::success_with_message(org, "Organization updated"))
}

/// GET /api/organization/{org_id}/logs
pub async fn logs(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(org_id): ApiPath<Uuid>,
    ApiQuery(query): ApiQuery<LogsQuery>,
) -> ApiResult<PaginatedResponse<ActivityLogEntry>> {
    let page = state
        .activity
        .list(
            &user.user_id,
            &org_id,
            query.action.filter(|a| !a.is_empty()),
            Pagination::new(query.page, query.limit),
        )
        .await?;
    Ok(page.into())
}

/// GET /api/organization/{org_id}/logs/stats
pub async fn log_stats(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(org_id): ApiPath<Uuid>,
) -> ApiResult<ApiResponse<ActivityStats>> {
    let stats = state.activity.stats(&user.user_id, &org_id).await?;
    Ok(ApiResponse::success(stats))
}
