//! Content item repository.
//!
//! Read-only view over the external content subsystem's rows.

use std::sync::Arc;

use crate::entities::{ContentItem, content_item};
use memoriaviva_common::{AppError, AppResult};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};

/// Content item repository for database operations.
#[derive(Clone)]
pub struct ContentItemRepository {
    db: Arc<DatabaseConnection>,
}

impl ContentItemRepository {
    /// Create a new content item repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find content items by a set of IDs.
    pub async fn find_by_ids(&self, ids: &[String]) -> AppResult<Vec<content_item::Model>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        ContentItem::find()
            .filter(content_item::Column::Id.is_in(ids.iter().cloned()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
