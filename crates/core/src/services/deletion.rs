//! Deletion service.
//!
//! Authorizes a deletion request, then hands the actual removal to the
//! cascade repository so every dependent row goes away in the same
//! transaction. Comments are the only leaf deleted without a cascade.

use memoriaviva_common::{AppError, AppResult};
use memoriaviva_db::entities::user;
use memoriaviva_db::repositories::{
    CascadeRepository, CommunityPostRepository, CommunityRepository, PostCommentRepository,
    UserRepository,
};

use crate::services::moderation::ModerationService;

/// Deletion service combining authorization with cascading removal.
#[derive(Clone)]
pub struct DeletionService {
    cascade_repo: CascadeRepository,
    community_repo: CommunityRepository,
    post_repo: CommunityPostRepository,
    comment_repo: PostCommentRepository,
    user_repo: UserRepository,
}

impl DeletionService {
    /// Create a new deletion service.
    #[must_use]
    pub const fn new(
        cascade_repo: CascadeRepository,
        community_repo: CommunityRepository,
        post_repo: CommunityPostRepository,
        comment_repo: PostCommentRepository,
        user_repo: UserRepository,
    ) -> Self {
        Self {
            cascade_repo,
            community_repo,
            post_repo,
            comment_repo,
            user_repo,
        }
    }

    /// Delete a post together with its comments and likes.
    ///
    /// Allowed for the post author, the community owner, and admins.
    pub async fn delete_post(&self, actor: &user::Model, post_id: &str) -> AppResult<()> {
        let post = self.post_repo.get_by_id(post_id).await?;
        let community = self.community_repo.get_by_id(&post.community_id).await?;

        if !ModerationService::can_delete_post(actor, &post, &community) {
            return Err(AppError::Forbidden(
                "You cannot delete this post".to_string(),
            ));
        }

        tracing::info!(post_id = %post.id, actor_id = %actor.id, "deleting post");
        self.cascade_repo.delete_post(&post.id).await
    }

    /// Delete a single comment.
    ///
    /// Allowed for the comment author, the community owner, and admins.
    pub async fn delete_comment(&self, actor: &user::Model, comment_id: &str) -> AppResult<()> {
        let comment = self.comment_repo.get_by_id(comment_id).await?;
        let post = self.post_repo.get_by_id(&comment.post_id).await?;
        let community = self.community_repo.get_by_id(&post.community_id).await?;

        if !ModerationService::can_delete_comment(actor, &comment, &community) {
            return Err(AppError::Forbidden(
                "You cannot delete this comment".to_string(),
            ));
        }

        self.comment_repo.delete(&comment.id).await
    }

    /// Delete a community and everything inside it.
    ///
    /// Allowed for the owner only; admins block instead of deleting.
    pub async fn delete_community(&self, actor: &user::Model, community_id: &str) -> AppResult<()> {
        let community = self.community_repo.get_by_id(community_id).await?;

        if !ModerationService::can_delete_community(actor, &community) {
            return Err(AppError::Forbidden(
                "Only the owner can delete a community".to_string(),
            ));
        }

        tracing::info!(community_id = %community.id, actor_id = %actor.id, "deleting community");
        self.cascade_repo.delete_community(&community.id).await
    }

    /// Delete a user account with all of their content, including any
    /// communities they own.
    ///
    /// Allowed for the account holder and admins.
    pub async fn delete_user(&self, actor: &user::Model, user_id: &str) -> AppResult<()> {
        let target = self.user_repo.get_by_id(user_id).await?;

        if actor.id != target.id && !actor.is_admin {
            return Err(AppError::Forbidden(
                "You cannot delete this account".to_string(),
            ));
        }

        tracing::info!(user_id = %target.id, actor_id = %actor.id, "deleting user account");
        self.cascade_repo.delete_user(&target.id).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use memoriaviva_db::entities::{community, community::CommunityStatus, community_post};
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    fn test_user(id: &str, is_admin: bool) -> user::Model {
        user::Model {
            id: id.to_string(),
            username: format!("user-{id}"),
            email: None,
            display_name: None,
            bio: None,
            avatar_url: None,
            is_admin,
            created_at: Utc::now().into(),
        }
    }

    fn service_with(db: sea_orm::DatabaseConnection) -> DeletionService {
        let db = Arc::new(db);
        DeletionService::new(
            CascadeRepository::new(db.clone()),
            CommunityRepository::new(db.clone()),
            CommunityPostRepository::new(db.clone()),
            PostCommentRepository::new(db.clone()),
            UserRepository::new(db),
        )
    }

    #[tokio::test]
    async fn test_stranger_cannot_delete_post() {
        let post = community_post::Model {
            id: "p1".to_string(),
            community_id: "c1".to_string(),
            author_id: "author".to_string(),
            content: "hello".to_string(),
            created_at: Utc::now().into(),
        };
        let community = community::Model {
            id: "c1".to_string(),
            owner_id: "owner".to_string(),
            name: "memories".to_string(),
            description: None,
            status: CommunityStatus::Active,
            is_filtered: false,
            filter_reason: None,
            created_at: Utc::now().into(),
        };

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[post]])
            .append_query_results([[community]])
            .into_connection();

        let service = service_with(db);
        let result = service.delete_post(&test_user("stranger", false), "p1").await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_user_cannot_delete_someone_elses_account() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[test_user("target", false)]])
            .into_connection();

        let service = service_with(db);
        let result = service.delete_user(&test_user("other", false), "target").await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_missing_post_reports_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<community_post::Model>::new()])
            .into_connection();

        let service = service_with(db);
        let result = service.delete_post(&test_user("anyone", true), "nope").await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
