// ============================================================================
// QRest API - AI & Credit Handlers
// File: crates/qrest-api/src/handlers/ai.rs
// Description: Content generation and credit ledger under /organization/{org_id}/ai
// ============================================================================

use axum::extract::State;
use serde::Deserialize;
use uuid::Uuid;

use qrest_core::domain::{ContentType, CreditPackage, TransactionType};
use qrest_core::repositories::TransactionFilter;
use qrest_core::services::{
    AiGeneration, AnalyzeMenu, ContentPage, CreditBalance, GenerateDescription,
    GenerateImagePrompt, GenerateMenu, OptimizeDescription, PurchaseResult, TransactionPage,
    TranslateItem, UsageStats,
};

use crate::error::{ApiError, ApiResult};
use crate::extractors::{ApiJson, ApiPath, ApiQuery, AuthUser};
use crate::handlers::menu::DaysQuery;
use crate::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct TransactionsQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    #[serde(rename = "type")]
    pub tx_type: Option<String>,
    pub feature: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    #[serde(rename = "type")]
    pub content_type: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseRequest {
    pub package_id: Uuid,
}

fn window(limit: Option<i64>, offset: Option<i64>, default_limit: i64) -> (i64, i64) {
    (
        limit.unwrap_or(default_limit).clamp(1, 100),
        offset.unwrap_or(0).max(0),
    )
}

/// POST /api/organization/{org_id}/ai/generate-description
pub async fn generate_description(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(org_id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<GenerateDescription>,
) -> ApiResult<ApiResponse<AiGeneration>> {
    let result = state
        .ai
        .generate_description(&user.actor()?, &org_id, payload)
        .await?;
    Ok(ApiResponse::success(result))
}

/// POST /api/organization/{org_id}/ai/translate-item
pub async fn translate_item(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(org_id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<TranslateItem>,
) -> ApiResult<ApiResponse<AiGeneration>> {
    let result = state
        .ai
        .translate_item(&user.actor()?, &org_id, payload)
        .await?;
    Ok(ApiResponse::success(result))
}

/// POST /api/organization/{org_id}/ai/generate-menu
pub async fn generate_menu(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(org_id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<GenerateMenu>,
) -> ApiResult<ApiResponse<AiGeneration>> {
    let result = state
        .ai
        .generate_menu(&user.actor()?, &org_id, payload)
        .await?;
    Ok(ApiResponse::success(result))
}

/// POST /api/organization/{org_id}/ai/generate-image-prompt
pub async fn generate_image_prompt(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(org_id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<GenerateImagePrompt>,
) -> ApiResult<ApiResponse<AiGeneration>> {
    let result = state
        .ai
        .generate_image_prompt(&user.actor()?, &org_id, payload)
        .await?;
    Ok(ApiResponse::success(result))
}

/// POST /api/organization/{org_id}/ai/optimize-description
pub async fn optimize_description(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(org_id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<OptimizeDescription>,
) -> ApiResult<ApiResponse<AiGeneration>> {
    let result = state
        .ai
        .optimize_description(&user.actor()?, &org_id, payload)
        .await?;
    Ok(ApiResponse::success(result))
}

/// POST /api/organization/{org_id}/ai/analyze-menu
pub async fn analyze_menu(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(org_id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<AnalyzeMenu>,
) -> ApiResult<ApiResponse<AiGeneration>> {
    let result = state
        .ai
        .analyze_menu(&user.actor()?, &org_id, payload)
        .await?;
    Ok(ApiResponse::success(result))
}

/// GET /api/organization/{org_id}/ai/credits
pub async fn credits(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(org_id): ApiPath<Uuid>,
) -> ApiResult<ApiResponse<CreditBalance>> {
    let balance = state.credits.balance(&user.actor()?, &org_id).await?;
    Ok(ApiResponse::success(balance))
}

/// GET /api/organization/{org_id}/ai/transactions
pub async fn transactions(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(org_id): ApiPath<Uuid>,
    ApiQuery(query): ApiQuery<TransactionsQuery>,
) -> ApiResult<ApiResponse<TransactionPage>> {
    let tx_type = match query.tx_type.as_deref().filter(|t| !t.is_empty()) {
        Some(t) => Some(
            TransactionType::from_str(t)
                .ok_or_else(|| ApiError::BadRequest(format!("Unknown transaction type: {}", t)))?,
        ),
        None => None,
    };
    let filter = TransactionFilter {
        tx_type,
        feature: query.feature.filter(|f| !f.is_empty()),
    };
    let (limit, offset) = window(query.limit, query.offset, 50);

    let page = state
        .credits
        .transactions(&user.actor()?, &org_id, filter, limit, offset)
        .await?;
    Ok(ApiResponse::success(page))
}

/// GET /api/organization/{org_id}/ai/usage-stats
pub async fn usage_stats(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(org_id): ApiPath<Uuid>,
    ApiQuery(query): ApiQuery<DaysQuery>,
) -> ApiResult<ApiResponse<UsageStats>> {
    let stats = state
        .credits
        .usage_stats(&user.actor()?, &org_id, query.days)
        .await?;
    Ok(ApiResponse::success(stats))
}

/// GET /api/organization/{org_id}/ai/packages
pub async fn packages(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(org_id): ApiPath<Uuid>,
) -> ApiResult<ApiResponse<Vec<CreditPackage>>> {
    user.actor()?.require_org(&org_id)?;
    let packages = state.credits.packages().await?;
    Ok(ApiResponse::success(packages))
}

/// POST /api/organization/{org_id}/ai/purchase-package
pub async fn purchase_package(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(org_id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<PurchaseRequest>,
) -> ApiResult<ApiResponse<PurchaseResult>> {
    let result = state
        .credits
        .purchase_package(&user.actor()?, &org_id, &payload.package_id)
        .await?;
    Ok(ApiResponse::success_with_message(result, "Credits added"))
}

/// GET /api/organization/{org_id}/ai/history
pub async fn history(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(org_id): ApiPath<Uuid>,
    ApiQuery(query): ApiQuery<HistoryQuery>,
) -> ApiResult<ApiResponse<ContentPage>> {
    let content_type = match query.content_type.as_deref().filter(|t| !t.is_empty()) {
        Some(t) => Some(
            ContentType::from_str(t)
                .ok_or_else(|| ApiError::BadRequest(format!("Unknown content type: {}", t)))?,
        ),
        None => None,
    };
    let (limit, offset) = window(query.limit, query.offset, 20);

    let page = state
        .credits
        .history(&user.actor()?, &org_id, content_type, limit, offset)
        .await?;
    Ok(ApiResponse::success(page))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_defaults_and_clamps() {
        assert_eq!(window(None, None, 50), (50, 0));
        assert_eq!(window(Some(500), Some(-4), 20), (100, 0));
        assert_eq!(window(Some(0), Some(30), 20), (1, 30));
    }
}
