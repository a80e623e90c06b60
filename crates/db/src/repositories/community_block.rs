//! Community block repository.

use std::sync::Arc;

use crate::entities::{CommunityBlock, community_block};
use chrono::Utc;
use memoriaviva_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter, Set,
    SqlErr,
};

/// Community block repository for database operations.
#[derive(Clone)]
pub struct CommunityBlockRepository {
    db: Arc<DatabaseConnection>,
}

impl CommunityBlockRepository {
    /// Create a new community block repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a block by user and community.
    pub async fn find_by_pair(
        &self,
        user_id: &str,
        community_id: &str,
    ) -> AppResult<Option<community_block::Model>> {
        CommunityBlock::find()
            .filter(community_block::Column::UserId.eq(user_id))
            .filter(community_block::Column::CommunityId.eq(community_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Check whether a user has blocked a community.
    pub async fn is_blocked(&self, user_id: &str, community_id: &str) -> AppResult<bool> {
        Ok(self.find_by_pair(user_id, community_id).await?.is_some())
    }

    /// Create a block. Inserting an already-present pair is not an
    /// error; the existing row is kept (idempotent presence).
    pub async fn create(
        &self,
        id: String,
        user_id: &str,
        community_id: &str,
        reason: Option<String>,
    ) -> AppResult<community_block::Model> {
        let model = community_block::ActiveModel {
            id: Set(id),
            user_id: Set(user_id.to_string()),
            community_id: Set(community_id.to_string()),
            reason: Set(reason),
            created_at: Set(Utc::now().into()),
        };

        match model.insert(self.db.as_ref()).await {
            Ok(block) => Ok(block),
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => self
                .find_by_pair(user_id, community_id)
                .await?
                .ok_or_else(|| AppError::Database(e.to_string())),
            Err(e) => Err(AppError::Database(e.to_string())),
        }
    }

    /// Remove a block by pair. Returns `true` when a row was removed.
    pub async fn delete_by_pair(&self, user_id: &str, community_id: &str) -> AppResult<bool> {
        let block = self.find_by_pair(user_id, community_id).await?;
        if let Some(b) = block {
            b.delete(self.db.as_ref())
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
            return Ok(true);
        }
        Ok(false)
    }
}
