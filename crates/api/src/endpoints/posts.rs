//! Post, comment, and like endpoints.

use axum::{Json, Router, extract::State, routing::post};
use memoriaviva_common::AppResult;
use memoriaviva_core::{CreateCommentInput, CreatePostInput};
use memoriaviva_db::entities::{community_post, post_comment};
use serde::{Deserialize, Serialize};

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

// ==================== Request/Response Types ====================

/// Post response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostResponse {
    pub id: String,
    pub created_at: String,
    pub community_id: String,
    pub author_id: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub like_count: Option<u64>,
}

impl From<community_post::Model> for PostResponse {
    fn from(p: community_post::Model) -> Self {
        Self {
            id: p.id,
            created_at: p.created_at.to_rfc3339(),
            community_id: p.community_id,
            author_id: p.author_id,
            content: p.content,
            comment_count: None,
            like_count: None,
        }
    }
}

/// Comment response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentResponse {
    pub id: String,
    pub created_at: String,
    pub post_id: String,
    pub author_id: String,
    pub text: String,
}

impl From<post_comment::Model> for CommentResponse {
    fn from(c: post_comment::Model) -> Self {
        Self {
            id: c.id,
            created_at: c.created_at.to_rfc3339(),
            post_id: c.post_id,
            author_id: c.author_id,
            text: c.text,
        }
    }
}

/// Like state response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeResponse {
    pub liked: bool,
    pub like_count: u64,
}

/// Create post request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostRequest {
    pub community_id: String,
    pub content: String,
}

/// Create comment request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentRequest {
    pub post_id: String,
    pub text: String,
}

/// Post id request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostIdRequest {
    pub post_id: String,
}

/// Comment id request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentIdRequest {
    pub comment_id: String,
}

/// Community timeline request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineRequest {
    pub community_id: String,
    #[serde(default = "default_limit")]
    pub limit: u64,
    #[serde(default)]
    pub offset: u64,
}

const fn default_limit() -> u64 {
    10
}

// ==================== Handlers ====================

/// Create a post in a community.
async fn create(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<CreatePostRequest>,
) -> AppResult<ApiResponse<PostResponse>> {
    let input = CreatePostInput {
        content: req.content,
    };
    let post = state
        .post_service
        .create_post(&user, &req.community_id, input)
        .await?;

    Ok(ApiResponse::ok(post.into()))
}

/// Show a post with its comment and like counts.
async fn show(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<PostIdRequest>,
) -> AppResult<ApiResponse<PostResponse>> {
    let post = state.post_service.get_post(&user, &req.post_id).await?;
    let (comment_count, like_count) = state.post_service.post_stats(&post.id).await?;

    let mut response: PostResponse = post.into();
    response.comment_count = Some(comment_count);
    response.like_count = Some(like_count);

    Ok(ApiResponse::ok(response))
}

/// Delete a post with its comments and likes.
async fn delete(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<PostIdRequest>,
) -> AppResult<ApiResponse<()>> {
    state.deletion_service.delete_post(&user, &req.post_id).await?;

    Ok(ApiResponse::ok(()))
}

/// List posts in a community, newest first.
async fn timeline(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<TimelineRequest>,
) -> AppResult<ApiResponse<Vec<PostResponse>>> {
    let limit = req.limit.min(100);
    let posts = state
        .post_service
        .list_posts(&user, &req.community_id, limit, req.offset)
        .await?;

    Ok(ApiResponse::ok(posts.into_iter().map(Into::into).collect()))
}

/// Comment on a post.
async fn comment_create(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<CreateCommentRequest>,
) -> AppResult<ApiResponse<CommentResponse>> {
    let input = CreateCommentInput { text: req.text };
    let comment = state
        .post_service
        .create_comment(&user, &req.post_id, input)
        .await?;

    Ok(ApiResponse::ok(comment.into()))
}

/// List comments on a post, oldest first.
async fn comment_list(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<PostIdRequest>,
) -> AppResult<ApiResponse<Vec<CommentResponse>>> {
    let comments = state.post_service.list_comments(&user, &req.post_id).await?;

    Ok(ApiResponse::ok(
        comments.into_iter().map(Into::into).collect(),
    ))
}

/// Delete a single comment.
async fn comment_delete(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<CommentIdRequest>,
) -> AppResult<ApiResponse<()>> {
    state
        .deletion_service
        .delete_comment(&user, &req.comment_id)
        .await?;

    Ok(ApiResponse::ok(()))
}

/// Toggle a like on a post.
async fn like_toggle(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<PostIdRequest>,
) -> AppResult<ApiResponse<LikeResponse>> {
    let (liked, like_count) = state.post_service.toggle_like(&user, &req.post_id).await?;

    Ok(ApiResponse::ok(LikeResponse { liked, like_count }))
}

/// Current like state for the actor on a post.
async fn like_state(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<PostIdRequest>,
) -> AppResult<ApiResponse<LikeResponse>> {
    let (liked, like_count) = state.post_service.like_state(&user, &req.post_id).await?;

    Ok(ApiResponse::ok(LikeResponse { liked, like_count }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/create", post(create))
        .route("/show", post(show))
        .route("/delete", post(delete))
        .route("/timeline", post(timeline))
        .route("/comments/create", post(comment_create))
        .route("/comments/list", post(comment_list))
        .route("/comments/delete", post(comment_delete))
        .route("/like", post(like_toggle))
        .route("/like/state", post(like_state))
}
