//! Community service.

use chrono::Utc;
use memoriaviva_common::{AppError, AppResult, IdGenerator};
use memoriaviva_db::entities::{community, community::CommunityStatus, user};
use memoriaviva_db::repositories::{CommunityBlockRepository, CommunityRepository};
use sea_orm::Set;
use serde::Deserialize;
use validator::Validate;

use crate::services::access::{self, AccessDecision};

/// Input for creating a community.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommunityInput {
    #[validate(length(min = 1, max = 128))]
    pub name: String,
    #[validate(length(max = 2048))]
    pub description: Option<String>,
}

/// Service for managing communities and the membership listing.
#[derive(Clone)]
pub struct CommunityService {
    community_repo: CommunityRepository,
    block_repo: CommunityBlockRepository,
    id_gen: IdGenerator,
}

impl CommunityService {
    /// Create a new community service.
    #[must_use]
    pub const fn new(
        community_repo: CommunityRepository,
        block_repo: CommunityBlockRepository,
    ) -> Self {
        Self {
            community_repo,
            block_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Get a community by ID.
    pub async fn get_by_id(&self, id: &str) -> AppResult<community::Model> {
        self.community_repo.get_by_id(id).await
    }

    /// Create a new community owned by `owner_id`.
    pub async fn create(
        &self,
        owner_id: &str,
        input: CreateCommunityInput,
    ) -> AppResult<community::Model> {
        input
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        let name = input.name.trim();
        if name.is_empty() {
            return Err(AppError::Validation("Community name is required".to_string()));
        }

        if self.community_repo.find_by_name(name).await?.is_some() {
            return Err(AppError::Conflict(format!(
                "A community named \"{name}\" already exists"
            )));
        }

        let model = community::ActiveModel {
            id: Set(self.id_gen.generate()),
            owner_id: Set(owner_id.to_string()),
            name: Set(name.to_string()),
            description: Set(input.description),
            status: Set(CommunityStatus::Active),
            is_filtered: Set(false),
            filter_reason: Set(None),
            created_at: Set(Utc::now().into()),
        };

        self.community_repo.create(model).await
    }

    /// Evaluate access to one community for `user`.
    ///
    /// Loads the community and the user's personal block flag, then
    /// delegates to the pure evaluator.
    pub async fn check_access(
        &self,
        user: &user::Model,
        community_id: &str,
        show_filtered: bool,
    ) -> AppResult<AccessDecision> {
        let community = self.community_repo.get_by_id(community_id).await?;
        let blocked = self.block_repo.is_blocked(&user.id, community_id).await?;
        Ok(access::evaluate(user, &community, blocked, show_filtered))
    }

    /// Communities the user belongs to (owned or interacted with),
    /// ordered ascending by creation time.
    pub async fn accessible_communities(
        &self,
        user_id: &str,
        include_filtered: bool,
    ) -> AppResult<Vec<community::Model>> {
        self.community_repo
            .find_accessible(user_id, include_filtered)
            .await
    }

    /// Communities the user has personally blocked.
    pub async fn blocked_communities(&self, user_id: &str) -> AppResult<Vec<community::Model>> {
        self.community_repo.find_blocked_by_user(user_id).await
    }

    /// Block a community for this user.
    ///
    /// Blocking an already-blocked community keeps the existing row.
    pub async fn block(
        &self,
        user_id: &str,
        community_id: &str,
        reason: Option<String>,
    ) -> AppResult<()> {
        // Community must exist; a dangling block row would never be
        // cleaned up by the cascade deleter.
        self.community_repo.get_by_id(community_id).await?;

        self.block_repo
            .create(self.id_gen.generate(), user_id, community_id, reason)
            .await?;
        Ok(())
    }

    /// Remove this user's block on a community.
    pub async fn unblock(&self, user_id: &str, community_id: &str) -> AppResult<()> {
        let removed = self.block_repo.delete_by_pair(user_id, community_id).await?;
        if !removed {
            return Err(AppError::NotFound(
                "This community is not blocked".to_string(),
            ));
        }
        Ok(())
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

    fn test_community(id: &str, owner_id: &str, name: &str) -> community::Model {
        community::Model {
            id: id.to_string(),
            owner_id: owner_id.to_string(),
            name: name.to_string(),
            description: None,
            status: CommunityStatus::Active,
            is_filtered: false,
            filter_reason: None,
            created_at: Utc::now().into(),
        }
    }

    fn service_with(db: sea_orm::DatabaseConnection) -> CommunityService {
        let db = Arc::new(db);
        CommunityService::new(
            CommunityRepository::new(db.clone()),
            CommunityBlockRepository::new(db),
        )
    }

    #[tokio::test]
    async fn test_create_rejects_duplicate_name() {
        let existing = test_community("c1", "u1", "Garden");

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[existing]])
            .into_connection();

        let service = service_with(db);
        let result = service
            .create(
                "u2",
                CreateCommunityInput {
                    name: "Garden".to_string(),
                    description: None,
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_create_rejects_blank_name() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let service = service_with(db);

        let result = service
            .create(
                "u1",
                CreateCommunityInput {
                    name: "   ".to_string(),
                    description: None,
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_check_access_denies_blocked_by_user() {
        let community = test_community("c1", "u1", "Garden");
        let block = memoriaviva_db::entities::community_block::Model {
            id: "b1".to_string(),
            user_id: "u2".to_string(),
            community_id: "c1".to_string(),
            reason: None,
            created_at: Utc::now().into(),
        };

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[community]])
            .append_query_results([[block]])
            .into_connection();

        let service = service_with(db);
        let user = test_user("u2", false);

        let decision = service.check_access(&user, "c1", false).await.unwrap();
        assert!(!decision.allowed);
    }

    #[tokio::test]
    async fn test_check_access_missing_community_is_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<community::Model>::new()])
            .into_connection();

        let service = service_with(db);
        let user = test_user("u2", false);

        let result = service.check_access(&user, "missing", false).await;
        assert!(matches!(result, Err(AppError::CommunityNotFound(_))));
    }
}
