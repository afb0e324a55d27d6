//! Team membership handlers scoped by organization id

use axum::{extract::State, http::StatusCode};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use qrest_core::domain::{MemberWithUser, Role};

use crate::error::ApiResult;
use crate::extractors::{ApiJson, ApiPath, AuthUser, ValidatedJson};
use crate::handlers::organization::RoleRequest;
use crate::response::{ApiResponse, Created};
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct InviteRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    pub role: Role,
}

/// GET /api/team/{org_id}/members
pub async fn list_members(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(org_id): ApiPath<Uuid>,
) -> ApiResult<ApiResponse<Vec<MemberWithUser>>> {
    let members = state.team.list_members(&user.user_id, &org_id).await?;
    Ok(ApiResponse::success(members))
}

/// POST /api/team/{org_id}/invite
pub async fn invite(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(org_id): ApiPath<Uuid>,
    ValidatedJson(payload): ValidatedJson<InviteRequest>,
) -> ApiResult<Created<MemberWithUser>> {
    let member = state
        .team
        .invite(&user.user_id, &org_id, &payload.email, payload.role)
        .await?;
    Ok(Created(member))
}

/// PUT /api/team/{org_id}/members/{member_id}
pub async fn update_role(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath((org_id, member_id)): ApiPath<(Uuid, Uuid)>,
    ApiJson(payload): ApiJson<RoleRequest>,
) -> ApiResult<ApiResponse<MemberWithUser>> {
    let member = state
        .team
        .update_role(&user.user_id, &org_id, &member_id, payload.role)
        .await?;
    Ok(ApiResponse::success_with_message(member, "Member role updated"))
}

/// DELETE /api/team/{org_id}/members/{member_id}
pub async fn remove(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath((org_id, member_id)): ApiPath<(Uuid, Uuid)>,
) -> ApiResult<StatusCode> {
    state.team.remove(&user.user_id, &org_id, &member_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
