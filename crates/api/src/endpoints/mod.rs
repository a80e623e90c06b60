//! API endpoints.

mod communities;
mod posts;
mod users;

use axum::Router;

use crate::middleware::AppState;

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/communities", communities::router())
        .nest("/posts", posts::router())
        .nest("/users", users::router())
}
