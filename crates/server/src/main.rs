//! Memoriaviva server entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{Router, middleware};
use memoriaviva_api::{middleware::AppState, router as api_router};
use memoriaviva_common::Config;
use memoriaviva_core::{
    ActivityService, CommunityService, DeletionService, EmailService, ModerationService,
    PostService, UserService,
};
use memoriaviva_db::repositories::{
    CascadeRepository, CommunityBlockRepository, CommunityPostRepository, CommunityRepository,
    ContentItemRepository, PostCommentRepository, PostLikeRepository, RatingRepository,
    UserRepository,
};
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Waits for a shutdown signal (SIGINT or SIGTERM).
///
/// On Unix systems, this listens for both SIGINT (Ctrl+C) and SIGTERM.
/// On Windows, this only listens for Ctrl+C.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "memoriaviva=debug,tower_http=debug".into()),
        )
        .init();

    info!("Starting memoriaviva server...");

    // Load configuration
    let config = Config::load()?;

    // Connect to database
    let db = memoriaviva_db::init(&config).await?;
    info!("Connected to database");

    // Run migrations
    info!("Running database migrations...");
    memoriaviva_db::migrate(&db).await?;
    info!("Migrations completed");

    // Initialize repositories
    let db = Arc::new(db);
    let user_repo = UserRepository::new(Arc::clone(&db));
    let community_repo = CommunityRepository::new(Arc::clone(&db));
    let block_repo = CommunityBlockRepository::new(Arc::clone(&db));
    let post_repo = CommunityPostRepository::new(Arc::clone(&db));
    let comment_repo = PostCommentRepository::new(Arc::clone(&db));
    let like_repo = PostLikeRepository::new(Arc::clone(&db));
    let rating_repo = RatingRepository::new(Arc::clone(&db));
    let content_repo = ContentItemRepository::new(Arc::clone(&db));
    let cascade_repo = CascadeRepository::new(Arc::clone(&db));

    // Initialize services
    let email_service = EmailService::new(&config.email);
    let community_service = CommunityService::new(community_repo.clone(), block_repo.clone());
    let post_service = PostService::new(
        post_repo.clone(),
        comment_repo.clone(),
        like_repo.clone(),
        community_repo.clone(),
        block_repo.clone(),
        user_repo.clone(),
        email_service,
    );
    let moderation_service = ModerationService::new(community_repo.clone());
    let deletion_service = DeletionService::new(
        cascade_repo,
        community_repo.clone(),
        post_repo.clone(),
        comment_repo.clone(),
        user_repo.clone(),
    );
    let activity_service = ActivityService::new(
        rating_repo,
        post_repo,
        comment_repo,
        like_repo,
        community_repo,
        content_repo,
    );
    let user_service = UserService::new(user_repo.clone());

    let state = AppState {
        community_service,
        post_service,
        moderation_service,
        deletion_service,
        activity_service,
        user_service,
        user_repo,
    };

    // Build router
    let app = Router::new()
        .nest("/api", api_router())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            memoriaviva_api::middleware::identity_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    // Start server with graceful shutdown
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
