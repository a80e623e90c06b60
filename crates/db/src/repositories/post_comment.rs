//! Post comment repository.

use std::sync::Arc;

use crate::entities::{PostComment, post_comment};
use chrono::{DateTime, Utc};
use memoriaviva_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect,
};

/// Post comment repository for database operations.
#[derive(Clone)]
pub struct PostCommentRepository {
    db: Arc<DatabaseConnection>,
}

impl PostCommentRepository {
    /// Create a new post comment repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a comment by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<post_comment::Model>> {
        PostComment::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a comment by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<post_comment::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Comment not found: {id}")))
    }

    /// List comments on a post, oldest first.
    pub async fn find_by_post(&self, post_id: &str) -> AppResult<Vec<post_comment::Model>> {
        PostComment::find()
            .filter(post_comment::Column::PostId.eq(post_id))
            .order_by_asc(post_comment::Column::CreatedAt)
            .order_by_asc(post_comment::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Comments authored by a user since `since`, newest first, bounded.
    pub async fn find_recent_by_author(
        &self,
        author_id: &str,
        since: DateTime<Utc>,
        limit: u64,
    ) -> AppResult<Vec<post_comment::Model>> {
        PostComment::find()
            .filter(post_comment::Column::AuthorId.eq(author_id))
            .filter(post_comment::Column::CreatedAt.gte(since))
            .order_by_desc(post_comment::Column::CreatedAt)
            .order_by_desc(post_comment::Column::Id)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count comments on a post.
    pub async fn count_by_post(&self, post_id: &str) -> AppResult<u64> {
        PostComment::find()
            .filter(post_comment::Column::PostId.eq(post_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new comment.
    pub async fn create(&self, model: post_comment::ActiveModel) -> AppResult<post_comment::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a single comment row.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        let comment = self.find_by_id(id).await?;
        if let Some(c) = comment {
            c.delete(self.db.as_ref())
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
        }
        Ok(())
    }
}
