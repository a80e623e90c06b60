//! Community post repository.

use std::sync::Arc;

use crate::entities::{CommunityPost, community_post};
use chrono::{DateTime, Utc};
use memoriaviva_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect,
};

/// Community post repository for database operations.
#[derive(Clone)]
pub struct CommunityPostRepository {
    db: Arc<DatabaseConnection>,
}

impl CommunityPostRepository {
    /// Create a new community post repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a post by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<community_post::Model>> {
        CommunityPost::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a post by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<community_post::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Post not found: {id}")))
    }

    /// Find posts by a set of IDs.
    pub async fn find_by_ids(&self, ids: &[String]) -> AppResult<Vec<community_post::Model>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        CommunityPost::find()
            .filter(community_post::Column::Id.is_in(ids.iter().cloned()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List posts in a community, newest first.
    pub async fn find_by_community(
        &self,
        community_id: &str,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<community_post::Model>> {
        CommunityPost::find()
            .filter(community_post::Column::CommunityId.eq(community_id))
            .order_by_desc(community_post::Column::CreatedAt)
            .order_by_desc(community_post::Column::Id)
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Posts authored by a user since `since`, newest first, bounded.
    pub async fn find_recent_by_author(
        &self,
        author_id: &str,
        since: DateTime<Utc>,
        limit: u64,
    ) -> AppResult<Vec<community_post::Model>> {
        CommunityPost::find()
            .filter(community_post::Column::AuthorId.eq(author_id))
            .filter(community_post::Column::CreatedAt.gte(since))
            .order_by_desc(community_post::Column::CreatedAt)
            .order_by_desc(community_post::Column::Id)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new post.
    pub async fn create(&self, model: community_post::ActiveModel) -> AppResult<community_post::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
