//! Post like repository.

use std::sync::Arc;

use crate::entities::{PostLike, post_like};
use chrono::{DateTime, Utc};
use memoriaviva_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, SqlErr,
};

/// Post like repository for database operations.
#[derive(Clone)]
pub struct PostLikeRepository {
    db: Arc<DatabaseConnection>,
}

impl PostLikeRepository {
    /// Create a new post like repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a like by user and post.
    pub async fn find_by_pair(
        &self,
        user_id: &str,
        post_id: &str,
    ) -> AppResult<Option<post_like::Model>> {
        PostLike::find()
            .filter(post_like::Column::UserId.eq(user_id))
            .filter(post_like::Column::PostId.eq(post_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Check whether a user has liked a post.
    pub async fn has_liked(&self, user_id: &str, post_id: &str) -> AppResult<bool> {
        Ok(self.find_by_pair(user_id, post_id).await?.is_some())
    }

    /// Toggle a like: insert when absent, remove when present.
    ///
    /// Returns `true` when the post ends up liked. A unique-constraint
    /// violation on insert means a concurrent request won the race, so
    /// it resolves to the remove branch instead of erroring.
    pub async fn toggle(&self, id: String, user_id: &str, post_id: &str) -> AppResult<bool> {
        if let Some(existing) = self.find_by_pair(user_id, post_id).await? {
            existing
                .delete(self.db.as_ref())
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
            return Ok(false);
        }

        let model = post_like::ActiveModel {
            id: Set(id),
            user_id: Set(user_id.to_string()),
            post_id: Set(post_id.to_string()),
            created_at: Set(Utc::now().into()),
        };

        match model.insert(self.db.as_ref()).await {
            Ok(_) => Ok(true),
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                if let Some(existing) = self.find_by_pair(user_id, post_id).await? {
                    existing
                        .delete(self.db.as_ref())
                        .await
                        .map_err(|e| AppError::Database(e.to_string()))?;
                }
                Ok(false)
            }
            Err(e) => Err(AppError::Database(e.to_string())),
        }
    }

    /// Likes made by a user since `since`, newest first, bounded.
    pub async fn find_recent_by_user(
        &self,
        user_id: &str,
        since: DateTime<Utc>,
        limit: u64,
    ) -> AppResult<Vec<post_like::Model>> {
        PostLike::find()
            .filter(post_like::Column::UserId.eq(user_id))
            .filter(post_like::Column::CreatedAt.gte(since))
            .order_by_desc(post_like::Column::CreatedAt)
            .order_by_desc(post_like::Column::Id)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count likes on a post.
    pub async fn count_by_post(&self, post_id: &str) -> AppResult<u64> {
        PostLike::find()
            .filter(post_like::Column::PostId.eq(post_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
