//! API middleware.

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use memoriaviva_core::{
    ActivityService, CommunityService, DeletionService, ModerationService, PostService,
    UserService,
};
use memoriaviva_db::repositories::UserRepository;

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub community_service: CommunityService,
    pub post_service: PostService,
    pub moderation_service: ModerationService,
    pub deletion_service: DeletionService,
    pub activity_service: ActivityService,
    pub user_service: UserService,
    pub user_repo: UserRepository,
}

/// Identity resolution middleware.
///
/// Authentication proper lives upstream; this trusts the identity it
/// forwards in the `X-User-Id` header and attaches the matching user
/// record to the request. Requests without a resolvable identity pass
/// through and fail later at the `AuthUser` extractor.
pub async fn identity_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    if let Some(header) = req.headers().get("X-User-Id")
        && let Ok(user_id) = header.to_str()
        && let Ok(Some(user)) = state.user_repo.find_by_id(user_id).await
    {
        req.extensions_mut().insert(user);
    }

    next.run(req).await
}
