//! Posts, comments, and likes.

use chrono::Utc;
use memoriaviva_common::{AppError, AppResult, IdGenerator};
use memoriaviva_db::entities::{community_post, post_comment, user};
use memoriaviva_db::repositories::{
    CommunityBlockRepository, CommunityPostRepository, CommunityRepository, PostCommentRepository,
    PostLikeRepository, UserRepository,
};
use sea_orm::Set;
use serde::Deserialize;
use validator::Validate;

use crate::services::access;
use crate::services::email::EmailService;

/// Input for creating a post.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostInput {
    #[validate(length(min = 1, max = 8192))]
    pub content: String,
}

/// Input for creating a comment.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentInput {
    #[validate(length(min = 1, max = 4096))]
    pub text: String,
}

/// Service for posts and the interactions attached to them.
#[derive(Clone)]
pub struct PostService {
    post_repo: CommunityPostRepository,
    comment_repo: PostCommentRepository,
    like_repo: PostLikeRepository,
    community_repo: CommunityRepository,
    block_repo: CommunityBlockRepository,
    user_repo: UserRepository,
    email: EmailService,
    id_gen: IdGenerator,
}

impl PostService {
    /// Create a new post service.
    #[must_use]
    pub const fn new(
        post_repo: CommunityPostRepository,
        comment_repo: PostCommentRepository,
        like_repo: PostLikeRepository,
        community_repo: CommunityRepository,
        block_repo: CommunityBlockRepository,
        user_repo: UserRepository,
        email: EmailService,
    ) -> Self {
        Self {
            post_repo,
            comment_repo,
            like_repo,
            community_repo,
            block_repo,
            user_repo,
            email,
            id_gen: IdGenerator::new(),
        }
    }

    /// Get a post the actor may see.
    pub async fn get_post(
        &self,
        actor: &user::Model,
        id: &str,
    ) -> AppResult<community_post::Model> {
        let post = self.post_repo.get_by_id(id).await?;
        self.ensure_access(actor, &post.community_id).await?;
        Ok(post)
    }

    /// Create a post in a community the actor can access.
    pub async fn create_post(
        &self,
        actor: &user::Model,
        community_id: &str,
        input: CreatePostInput,
    ) -> AppResult<community_post::Model> {
        input
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        let content = input.content.trim();
        if content.is_empty() {
            return Err(AppError::Validation("Post content is required".to_string()));
        }

        self.ensure_access(actor, community_id).await?;

        let model = community_post::ActiveModel {
            id: Set(self.id_gen.generate()),
            community_id: Set(community_id.to_string()),
            author_id: Set(actor.id.to_string()),
            content: Set(content.to_string()),
            created_at: Set(Utc::now().into()),
        };

        self.post_repo.create(model).await
    }

    /// Comment on a post, notifying the post author by email.
    ///
    /// The notification is fired in the background; its outcome never
    /// affects the comment.
    pub async fn create_comment(
        &self,
        actor: &user::Model,
        post_id: &str,
        input: CreateCommentInput,
    ) -> AppResult<post_comment::Model> {
        input
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        let text = input.text.trim();
        if text.is_empty() {
            return Err(AppError::Validation("Comment text is required".to_string()));
        }

        let post = self.post_repo.get_by_id(post_id).await?;
        let community = self.ensure_access(actor, &post.community_id).await?;

        let model = post_comment::ActiveModel {
            id: Set(self.id_gen.generate()),
            post_id: Set(post.id.clone()),
            author_id: Set(actor.id.to_string()),
            text: Set(text.to_string()),
            created_at: Set(Utc::now().into()),
        };

        let comment = self.comment_repo.create(model).await?;

        // Commenting on your own post sends nothing.
        if post.author_id != actor.id {
            self.spawn_comment_notification(
                post.author_id.clone(),
                actor.username.clone(),
                community.name,
            );
        }

        Ok(comment)
    }

    /// Toggle a like on a post. Returns the resulting state and the
    /// post's new like count.
    pub async fn toggle_like(
        &self,
        actor: &user::Model,
        post_id: &str,
    ) -> AppResult<(bool, u64)> {
        let post = self.post_repo.get_by_id(post_id).await?;
        self.ensure_access(actor, &post.community_id).await?;

        let liked = self
            .like_repo
            .toggle(self.id_gen.generate(), &actor.id, &post.id)
            .await?;
        let count = self.like_repo.count_by_post(&post.id).await?;

        Ok((liked, count))
    }

    /// List posts in a community, newest first.
    pub async fn list_posts(
        &self,
        actor: &user::Model,
        community_id: &str,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<community_post::Model>> {
        self.ensure_access(actor, community_id).await?;
        self.post_repo
            .find_by_community(community_id, limit, offset)
            .await
    }

    /// List comments on a post, oldest first.
    pub async fn list_comments(
        &self,
        actor: &user::Model,
        post_id: &str,
    ) -> AppResult<Vec<post_comment::Model>> {
        let post = self.post_repo.get_by_id(post_id).await?;
        self.ensure_access(actor, &post.community_id).await?;
        self.comment_repo.find_by_post(&post.id).await
    }

    /// Comment and like counts for one post.
    pub async fn post_stats(&self, post_id: &str) -> AppResult<(u64, u64)> {
        let comments = self.comment_repo.count_by_post(post_id).await?;
        let likes = self.like_repo.count_by_post(post_id).await?;
        Ok((comments, likes))
    }

    /// Like count and whether the actor has liked a post.
    pub async fn like_state(&self, actor: &user::Model, post_id: &str) -> AppResult<(bool, u64)> {
        let post = self.post_repo.get_by_id(post_id).await?;
        self.ensure_access(actor, &post.community_id).await?;

        let liked = self.like_repo.has_liked(&actor.id, &post.id).await?;
        let count = self.like_repo.count_by_post(&post.id).await?;
        Ok((liked, count))
    }

    /// Load the community and verify the actor may act in it.
    ///
    /// Acting on a specific community is an explicit request, so the
    /// content filter does not stand in the way here; blocked status
    /// and personal blocks still do.
    async fn ensure_access(
        &self,
        actor: &user::Model,
        community_id: &str,
    ) -> AppResult<memoriaviva_db::entities::community::Model> {
        let community = self.community_repo.get_by_id(community_id).await?;
        let blocked = self.block_repo.is_blocked(&actor.id, community_id).await?;

        let decision = access::evaluate(actor, &community, blocked, true);
        if !decision.allowed {
            let message = decision
                .reason
                .map_or("Access denied", access::DenyReason::message);
            return Err(AppError::Forbidden(message.to_string()));
        }

        Ok(community)
    }

    fn spawn_comment_notification(
        &self,
        author_id: String,
        commenter_name: String,
        community_name: String,
    ) {
        let user_repo = self.user_repo.clone();
        let email = self.email.clone();

        tokio::spawn(async move {
            let author = match user_repo.find_by_id(&author_id).await {
                Ok(Some(author)) => author,
                Ok(None) => return,
                Err(e) => {
                    tracing::warn!(error = %e, "failed to load comment recipient");
                    return;
                }
            };

            email
                .send_comment_notification(
                    author.email.as_deref(),
                    author.display_name.as_deref().unwrap_or(&author.username),
                    &commenter_name,
                    &community_name,
                )
                .await;
        });
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use memoriaviva_common::config::EmailConfig;
    use memoriaviva_db::entities::{community, community::CommunityStatus, community_block};
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    fn test_user(id: &str) -> user::Model {
        user::Model {
            id: id.to_string(),
            username: format!("user-{id}"),
            email: None,
            display_name: None,
            bio: None,
            avatar_url: None,
            is_admin: false,
            created_at: Utc::now().into(),
        }
    }

    fn test_community(id: &str, owner_id: &str, status: CommunityStatus) -> community::Model {
        community::Model {
            id: id.to_string(),
            owner_id: owner_id.to_string(),
            name: format!("community-{id}"),
            description: None,
            status,
            is_filtered: false,
            filter_reason: None,
            created_at: Utc::now().into(),
        }
    }

    fn service_with(db: sea_orm::DatabaseConnection) -> PostService {
        let db = Arc::new(db);
        PostService::new(
            CommunityPostRepository::new(db.clone()),
            PostCommentRepository::new(db.clone()),
            PostLikeRepository::new(db.clone()),
            CommunityRepository::new(db.clone()),
            CommunityBlockRepository::new(db.clone()),
            UserRepository::new(db),
            EmailService::new(&EmailConfig::default()),
        )
    }

    #[tokio::test]
    async fn test_cannot_post_in_blocked_community() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[test_community("c1", "owner", CommunityStatus::Blocked)]])
            .append_query_results([Vec::<community_block::Model>::new()])
            .into_connection();

        let service = service_with(db);
        let result = service
            .create_post(
                &test_user("u1"),
                "c1",
                CreatePostInput {
                    content: "hello".to_string(),
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_owner_can_post_in_own_blocked_community() {
        let community = test_community("c1", "owner", CommunityStatus::Blocked);
        let post = community_post::Model {
            id: "p1".to_string(),
            community_id: "c1".to_string(),
            author_id: "owner".to_string(),
            content: "hello".to_string(),
            created_at: Utc::now().into(),
        };

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[community]])
            .append_query_results([Vec::<community_block::Model>::new()])
            .append_query_results([[post]])
            .into_connection();

        let service = service_with(db);
        let created = service
            .create_post(
                &test_user("owner"),
                "c1",
                CreatePostInput {
                    content: "hello".to_string(),
                },
            )
            .await
            .unwrap();

        assert_eq!(created.author_id, "owner");
    }

    #[tokio::test]
    async fn test_stranger_cannot_view_post_in_blocked_community() {
        let post = community_post::Model {
            id: "p1".to_string(),
            community_id: "c1".to_string(),
            author_id: "owner".to_string(),
            content: "secret".to_string(),
            created_at: Utc::now().into(),
        };

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[post]])
            .append_query_results([[test_community("c1", "owner", CommunityStatus::Blocked)]])
            .append_query_results([Vec::<community_block::Model>::new()])
            .into_connection();

        let service = service_with(db);
        let result = service.get_post(&test_user("stranger"), "p1").await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_like_state_denied_for_personally_blocked_community() {
        let post = community_post::Model {
            id: "p1".to_string(),
            community_id: "c1".to_string(),
            author_id: "owner".to_string(),
            content: "hello".to_string(),
            created_at: Utc::now().into(),
        };
        let block = community_block::Model {
            id: "b1".to_string(),
            user_id: "u1".to_string(),
            community_id: "c1".to_string(),
            reason: None,
            created_at: Utc::now().into(),
        };

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[post]])
            .append_query_results([[test_community("c1", "owner", CommunityStatus::Active)]])
            .append_query_results([[block]])
            .into_connection();

        let service = service_with(db);
        let result = service.like_state(&test_user("u1"), "p1").await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_blank_post_content_rejected() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let service = service_with(db);

        let result = service
            .create_post(
                &test_user("u1"),
                "c1",
                CreatePostInput {
                    content: "   ".to_string(),
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }
}
