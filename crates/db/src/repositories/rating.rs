//! Rating repository.

use std::sync::Arc;

use crate::entities::{Rating, rating};
use chrono::{DateTime, Utc};
use memoriaviva_common::{AppError, AppResult};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
};

/// Rating repository for database operations.
#[derive(Clone)]
pub struct RatingRepository {
    db: Arc<DatabaseConnection>,
}

impl RatingRepository {
    /// Create a new rating repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Ratings authored by a user since `since`, newest first, bounded.
    pub async fn find_recent_by_user(
        &self,
        user_id: &str,
        since: DateTime<Utc>,
        limit: u64,
    ) -> AppResult<Vec<rating::Model>> {
        Rating::find()
            .filter(rating::Column::UserId.eq(user_id))
            .filter(rating::Column::CreatedAt.gte(since))
            .order_by_desc(rating::Column::CreatedAt)
            .order_by_desc(rating::Column::Id)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
