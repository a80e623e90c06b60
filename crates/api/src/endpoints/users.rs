//! User endpoints.

use axum::{Json, Router, extract::State, routing::post};
use chrono::Duration;
use memoriaviva_common::{AppError, AppResult};
use memoriaviva_core::{ActivityItem, UpdateProfileInput, activity::DEFAULT_FEED_LIMIT};
use memoriaviva_db::entities::user;
use serde::{Deserialize, Serialize};

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// Default activity lookback window in days.
const DEFAULT_LOOKBACK_DAYS: i64 = 30;

// ==================== Request/Response Types ====================

/// User response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub created_at: String,
    pub username: String,
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub is_admin: bool,
}

impl From<user::Model> for UserResponse {
    fn from(u: user::Model) -> Self {
        Self {
            id: u.id,
            created_at: u.created_at.to_rfc3339(),
            username: u.username,
            display_name: u.display_name,
            bio: u.bio,
            avatar_url: u.avatar_url,
            is_admin: u.is_admin,
        }
    }
}

/// Profile response: the user plus their recent activity feed.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub user: UserResponse,
    pub recent_activity: Vec<ActivityItem>,
}

/// Show user request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShowUserRequest {
    pub user_id: Option<String>,
    pub username: Option<String>,
}

/// Profile request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileRequest {
    pub user_id: String,
    #[serde(default = "default_lookback_days")]
    pub lookback_days: i64,
    #[serde(default = "default_feed_limit")]
    pub limit: usize,
}

/// Update profile request. Omitted fields stay as they are; a blank
/// value clears the field.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub user_id: String,
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
}

/// Delete account request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteUserRequest {
    pub user_id: String,
}

/// List users request.
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ListUsersRequest {
    #[serde(default = "default_list_limit")]
    pub limit: u64,
    #[serde(default)]
    pub offset: u64,
}

const fn default_list_limit() -> u64 {
    10
}

const fn default_lookback_days() -> i64 {
    DEFAULT_LOOKBACK_DAYS
}

const fn default_feed_limit() -> usize {
    DEFAULT_FEED_LIMIT
}

// ==================== Handlers ====================

/// Show a user by id or username.
async fn show(
    AuthUser(_user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<ShowUserRequest>,
) -> AppResult<ApiResponse<UserResponse>> {
    let found = match (req.user_id, req.username) {
        (Some(id), _) => state.user_repo.find_by_id(&id).await?,
        (None, Some(username)) => state.user_repo.find_by_username(&username).await?,
        (None, None) => {
            return Err(AppError::BadRequest(
                "Either userId or username is required".to_string(),
            ));
        }
    };

    let found = found.ok_or_else(|| AppError::UserNotFound("unknown".to_string()))?;

    Ok(ApiResponse::ok(found.into()))
}

/// List users, oldest first.
async fn list(
    AuthUser(_user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<ListUsersRequest>,
) -> AppResult<ApiResponse<Vec<UserResponse>>> {
    let limit = req.limit.min(100);
    let users = state.user_repo.find_all(limit, req.offset).await?;

    Ok(ApiResponse::ok(users.into_iter().map(Into::into).collect()))
}

/// The authenticated user's own record.
async fn me(AuthUser(user): AuthUser) -> AppResult<ApiResponse<UserResponse>> {
    Ok(ApiResponse::ok(user.into()))
}

/// A user's profile with their recent activity feed.
async fn profile(
    AuthUser(_user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<ProfileRequest>,
) -> AppResult<ApiResponse<ProfileResponse>> {
    let target = state.user_repo.get_by_id(&req.user_id).await?;

    let lookback = Duration::days(req.lookback_days.clamp(1, 365));
    let limit = req.limit.min(50);
    let recent_activity = state
        .activity_service
        .recent_activity(&target.id, lookback, limit)
        .await?;

    Ok(ApiResponse::ok(ProfileResponse {
        user: target.into(),
        recent_activity,
    }))
}

/// Update a profile.
async fn update(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<UpdateUserRequest>,
) -> AppResult<ApiResponse<UserResponse>> {
    let input = UpdateProfileInput {
        display_name: req.display_name,
        bio: req.bio,
        avatar_url: req.avatar_url,
    };
    let updated = state
        .user_service
        .update_profile(&user, &req.user_id, input)
        .await?;

    Ok(ApiResponse::ok(updated.into()))
}

/// Delete an account and everything it owns.
async fn delete(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<DeleteUserRequest>,
) -> AppResult<ApiResponse<()>> {
    state.deletion_service.delete_user(&user, &req.user_id).await?;

    Ok(ApiResponse::ok(()))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/show", post(show))
        .route("/list", post(list))
        .route("/me", post(me))
        .route("/profile", post(profile))
        .route("/update", post(update))
        .route("/delete", post(delete))
}
