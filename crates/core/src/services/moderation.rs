//! Moderation service.
//!
//! Admin-only state transitions on communities, plus the deletion
//! authorization predicates. The status and filter axes are
//! independent: blocking does not filter, filtering does not block.

use memoriaviva_common::{AppError, AppResult};
use memoriaviva_db::entities::{
    community, community::CommunityStatus, community_post, post_comment, user,
};
use memoriaviva_db::repositories::CommunityRepository;
use sea_orm::Set;

/// Fallback reason applied when a filter request carries none.
const DEFAULT_FILTER_REASON: &str = "Sensitive content";

/// Moderation service for community state transitions and deletion
/// authorization.
#[derive(Clone)]
pub struct ModerationService {
    community_repo: CommunityRepository,
}

impl ModerationService {
    /// Create a new moderation service.
    #[must_use]
    pub const fn new(community_repo: CommunityRepository) -> Self {
        Self { community_repo }
    }

    /// Block a community (admin only).
    pub async fn block_community(
        &self,
        actor: &user::Model,
        community_id: &str,
    ) -> AppResult<community::Model> {
        Self::ensure_admin(actor)?;

        let community = self.community_repo.get_by_id(community_id).await?;
        let mut active: community::ActiveModel = community.into();
        active.status = Set(CommunityStatus::Blocked);
        self.community_repo.update(active).await
    }

    /// Unblock a community (admin only).
    pub async fn unblock_community(
        &self,
        actor: &user::Model,
        community_id: &str,
    ) -> AppResult<community::Model> {
        Self::ensure_admin(actor)?;

        let community = self.community_repo.get_by_id(community_id).await?;
        let mut active: community::ActiveModel = community.into();
        active.status = Set(CommunityStatus::Active);
        self.community_repo.update(active).await
    }

    /// Mark a community as filtered (admin only).
    ///
    /// A blank or missing reason falls back to a generic one.
    pub async fn filter_community(
        &self,
        actor: &user::Model,
        community_id: &str,
        reason: Option<String>,
    ) -> AppResult<community::Model> {
        Self::ensure_admin(actor)?;

        let reason = reason
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty())
            .unwrap_or_else(|| DEFAULT_FILTER_REASON.to_string());

        let community = self.community_repo.get_by_id(community_id).await?;
        let mut active: community::ActiveModel = community.into();
        active.is_filtered = Set(true);
        active.filter_reason = Set(Some(reason));
        self.community_repo.update(active).await
    }

    /// Remove the content filter from a community (admin only).
    pub async fn unfilter_community(
        &self,
        actor: &user::Model,
        community_id: &str,
    ) -> AppResult<community::Model> {
        Self::ensure_admin(actor)?;

        let community = self.community_repo.get_by_id(community_id).await?;
        let mut active: community::ActiveModel = community.into();
        active.is_filtered = Set(false);
        active.filter_reason = Set(None);
        self.community_repo.update(active).await
    }

    // ==================== Deletion authorization ====================

    /// Whether `actor` may delete `post` in `community`: the author,
    /// any admin, or the community owner.
    #[must_use]
    pub fn can_delete_post(
        actor: &user::Model,
        post: &community_post::Model,
        community: &community::Model,
    ) -> bool {
        actor.is_admin || actor.id == post.author_id || actor.id == community.owner_id
    }

    /// Whether `actor` may delete `comment` on a post in `community`:
    /// the author, any admin, or the community owner.
    #[must_use]
    pub fn can_delete_comment(
        actor: &user::Model,
        comment: &post_comment::Model,
        community: &community::Model,
    ) -> bool {
        actor.is_admin || actor.id == comment.author_id || actor.id == community.owner_id
    }

    /// Whether `actor` may delete `community`: its owner only.
    #[must_use]
    pub fn can_delete_community(actor: &user::Model, community: &community::Model) -> bool {
        actor.id == community.owner_id
    }

    fn ensure_admin(actor: &user::Model) -> AppResult<()> {
        if actor.is_admin {
            Ok(())
        } else {
            Err(AppError::Forbidden(
                "Only administrators can perform this action".to_string(),
            ))
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
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

    fn test_community(id: &str, owner_id: &str) -> community::Model {
        community::Model {
            id: id.to_string(),
            owner_id: owner_id.to_string(),
            name: format!("community-{id}"),
            description: None,
            status: CommunityStatus::Active,
            is_filtered: false,
            filter_reason: None,
            created_at: Utc::now().into(),
        }
    }

    fn test_post(id: &str, community_id: &str, author_id: &str) -> community_post::Model {
        community_post::Model {
            id: id.to_string(),
            community_id: community_id.to_string(),
            author_id: author_id.to_string(),
            content: "hello".to_string(),
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_non_admin_cannot_block_community() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let service = ModerationService::new(CommunityRepository::new(Arc::new(db)));

        let actor = test_user("u1", false);
        let result = service.block_community(&actor, "c1").await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_admin_filter_defaults_reason() {
        let community = test_community("c1", "u1");
        let mut filtered = community.clone();
        filtered.is_filtered = true;
        filtered.filter_reason = Some(DEFAULT_FILTER_REASON.to_string());

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[community]])
            .append_query_results([[filtered]])
            .into_connection();

        let service = ModerationService::new(CommunityRepository::new(Arc::new(db)));
        let admin = test_user("a1", true);

        let updated = service
            .filter_community(&admin, "c1", Some("  ".to_string()))
            .await
            .unwrap();

        assert!(updated.is_filtered);
        assert_eq!(updated.filter_reason.as_deref(), Some(DEFAULT_FILTER_REASON));
    }

    #[test]
    fn test_post_deletion_authorization() {
        let community = test_community("c1", "owner");
        let post = test_post("p1", "c1", "author");

        assert!(ModerationService::can_delete_post(
            &test_user("author", false),
            &post,
            &community
        ));
        assert!(ModerationService::can_delete_post(
            &test_user("owner", false),
            &post,
            &community
        ));
        assert!(ModerationService::can_delete_post(
            &test_user("admin", true),
            &post,
            &community
        ));
        assert!(!ModerationService::can_delete_post(
            &test_user("stranger", false),
            &post,
            &community
        ));
    }

    #[test]
    fn test_community_deletion_is_owner_only() {
        let community = test_community("c1", "owner");

        assert!(ModerationService::can_delete_community(
            &test_user("owner", false),
            &community
        ));
        // Admins moderate communities but cannot delete them.
        assert!(!ModerationService::can_delete_community(
            &test_user("admin", true),
            &community
        ));
        assert!(!ModerationService::can_delete_community(
            &test_user("stranger", false),
            &community
        ));
    }
}
