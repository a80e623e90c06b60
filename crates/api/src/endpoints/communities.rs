//! Community endpoints.

use axum::{Json, Router, extract::State, routing::post};
use memoriaviva_common::{AppError, AppResult};
use memoriaviva_core::CreateCommunityInput;
use memoriaviva_db::entities::community::{self, CommunityStatus};
use serde::{Deserialize, Serialize};

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

// ==================== Request/Response Types ====================

/// Community response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommunityResponse {
    pub id: String,
    pub created_at: String,
    pub owner_id: String,
    pub name: String,
    pub description: Option<String>,
    pub status: String,
    pub is_filtered: bool,
    pub filter_reason: Option<String>,
}

impl From<community::Model> for CommunityResponse {
    fn from(c: community::Model) -> Self {
        Self {
            id: c.id,
            created_at: c.created_at.to_rfc3339(),
            owner_id: c.owner_id,
            name: c.name,
            description: c.description,
            status: match c.status {
                CommunityStatus::Active => "active".to_string(),
                CommunityStatus::Blocked => "blocked".to_string(),
            },
            is_filtered: c.is_filtered,
            filter_reason: c.filter_reason,
        }
    }
}

/// Show community request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShowCommunityRequest {
    pub community_id: String,
    #[serde(default)]
    pub show_filtered: bool,
}

/// List communities request.
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ListCommunitiesRequest {
    #[serde(default)]
    pub include_filtered: bool,
}

/// Block/unblock/delete community request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommunityIdRequest {
    pub community_id: String,
}

/// Personal block request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockCommunityRequest {
    pub community_id: String,
    pub reason: Option<String>,
}

/// Admin filter request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterCommunityRequest {
    pub community_id: String,
    pub reason: Option<String>,
}

// ==================== Handlers ====================

/// Create a new community.
async fn create(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateCommunityInput>,
) -> AppResult<ApiResponse<CommunityResponse>> {
    let community = state.community_service.create(&user.id, input).await?;

    Ok(ApiResponse::ok(community.into()))
}

/// Show a community the user can access.
async fn show(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<ShowCommunityRequest>,
) -> AppResult<ApiResponse<CommunityResponse>> {
    let decision = state
        .community_service
        .check_access(&user, &req.community_id, req.show_filtered)
        .await?;

    if !decision.allowed {
        let message = decision
            .reason
            .map_or("Access denied", memoriaviva_core::DenyReason::message);
        return Err(AppError::Forbidden(message.to_string()));
    }

    let community = state.community_service.get_by_id(&req.community_id).await?;

    Ok(ApiResponse::ok(community.into()))
}

/// List communities the user belongs to.
async fn list(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<ListCommunitiesRequest>,
) -> AppResult<ApiResponse<Vec<CommunityResponse>>> {
    let communities = state
        .community_service
        .accessible_communities(&user.id, req.include_filtered)
        .await?;

    Ok(ApiResponse::ok(
        communities.into_iter().map(Into::into).collect(),
    ))
}

/// List communities the user has blocked.
async fn blocked(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<CommunityResponse>>> {
    let communities = state.community_service.blocked_communities(&user.id).await?;

    Ok(ApiResponse::ok(
        communities.into_iter().map(Into::into).collect(),
    ))
}

/// Block a community for this user.
async fn block(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<BlockCommunityRequest>,
) -> AppResult<ApiResponse<()>> {
    state
        .community_service
        .block(&user.id, &req.community_id, req.reason)
        .await?;

    Ok(ApiResponse::ok(()))
}

/// Unblock a community for this user.
async fn unblock(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<CommunityIdRequest>,
) -> AppResult<ApiResponse<()>> {
    state
        .community_service
        .unblock(&user.id, &req.community_id)
        .await?;

    Ok(ApiResponse::ok(()))
}

/// Delete a community (owner only).
async fn delete(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<CommunityIdRequest>,
) -> AppResult<ApiResponse<()>> {
    state
        .deletion_service
        .delete_community(&user, &req.community_id)
        .await?;

    Ok(ApiResponse::ok(()))
}

// ==================== Admin moderation ====================

/// Block a community platform-wide (admin only).
async fn admin_block(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<CommunityIdRequest>,
) -> AppResult<ApiResponse<CommunityResponse>> {
    let community = state
        .moderation_service
        .block_community(&user, &req.community_id)
        .await?;

    Ok(ApiResponse::ok(community.into()))
}

/// Unblock a community platform-wide (admin only).
async fn admin_unblock(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<CommunityIdRequest>,
) -> AppResult<ApiResponse<CommunityResponse>> {
    let community = state
        .moderation_service
        .unblock_community(&user, &req.community_id)
        .await?;

    Ok(ApiResponse::ok(community.into()))
}

/// Mark a community as filtered (admin only).
async fn admin_filter(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<FilterCommunityRequest>,
) -> AppResult<ApiResponse<CommunityResponse>> {
    let community = state
        .moderation_service
        .filter_community(&user, &req.community_id, req.reason)
        .await?;

    Ok(ApiResponse::ok(community.into()))
}

/// Remove the content filter from a community (admin only).
async fn admin_unfilter(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<CommunityIdRequest>,
) -> AppResult<ApiResponse<CommunityResponse>> {
    let community = state
        .moderation_service
        .unfilter_community(&user, &req.community_id)
        .await?;

    Ok(ApiResponse::ok(community.into()))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/create", post(create))
        .route("/show", post(show))
        .route("/list", post(list))
        .route("/blocked", post(blocked))
        .route("/block", post(block))
        .route("/unblock", post(unblock))
        .route("/delete", post(delete))
        .route("/moderation/block", post(admin_block))
        .route("/moderation/unblock", post(admin_unblock))
        .route("/moderation/filter", post(admin_filter))
        .route("/moderation/unfilter", post(admin_unfilter))
}
