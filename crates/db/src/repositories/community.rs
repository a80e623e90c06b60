//! Community repository.

use std::sync::Arc;

use crate::entities::{
    Community, CommunityBlock, CommunityPost, PostComment, PostLike, community,
    community::CommunityStatus, community_block, community_post, post_comment, post_like,
};
use memoriaviva_common::{AppError, AppResult};
use sea_orm::sea_query::{Expr, Query, SelectStatement};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder,
};

/// Community repository for database operations.
#[derive(Clone)]
pub struct CommunityRepository {
    db: Arc<DatabaseConnection>,
}

impl CommunityRepository {
    /// Create a new community repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a community by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<community::Model>> {
        Community::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a community by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<community::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::CommunityNotFound(id.to_string()))
    }

    /// Find communities by a set of IDs.
    pub async fn find_by_ids(&self, ids: &[String]) -> AppResult<Vec<community::Model>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        Community::find()
            .filter(community::Column::Id.is_in(ids.iter().cloned()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a community by its unique name.
    pub async fn find_by_name(&self, name: &str) -> AppResult<Option<community::Model>> {
        Community::find()
            .filter(community::Column::Name.eq(name))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new community.
    pub async fn create(&self, model: community::ActiveModel) -> AppResult<community::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a community.
    pub async fn update(&self, model: community::ActiveModel) -> AppResult<community::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Communities the user belongs to: owned, or interacted with
    /// through a post, a comment, or a like.
    ///
    /// Membership is derived from interaction history rather than a
    /// membership table; there is no second source of truth. Rules:
    ///
    /// - communities the user blocked are always excluded;
    /// - admin-blocked communities are visible to their owner only;
    /// - filtered communities are excluded unless `include_filtered`
    ///   or the user owns them.
    ///
    /// Ordered ascending by creation time, id as a stable tie-break.
    pub async fn find_accessible(
        &self,
        user_id: &str,
        include_filtered: bool,
    ) -> AppResult<Vec<community::Model>> {
        let mut query = Community::find()
            .filter(
                Condition::any()
                    .add(community::Column::OwnerId.eq(user_id))
                    .add(community::Column::Id.in_subquery(Self::posted_in(user_id)))
                    .add(community::Column::Id.in_subquery(Self::commented_in(user_id)))
                    .add(community::Column::Id.in_subquery(Self::liked_in(user_id))),
            )
            .filter(
                Condition::any()
                    .add(community::Column::Status.eq(CommunityStatus::Active))
                    .add(community::Column::OwnerId.eq(user_id)),
            )
            .filter(community::Column::Id.not_in_subquery(Self::blocked_by(user_id)));

        if !include_filtered {
            query = query.filter(
                Condition::any()
                    .add(community::Column::IsFiltered.eq(false))
                    .add(community::Column::OwnerId.eq(user_id)),
            );
        }

        query
            .order_by_asc(community::Column::CreatedAt)
            .order_by_asc(community::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Communities the user has personally blocked.
    pub async fn find_blocked_by_user(&self, user_id: &str) -> AppResult<Vec<community::Model>> {
        Community::find()
            .filter(community::Column::Id.in_subquery(Self::blocked_by(user_id)))
            .order_by_asc(community::Column::CreatedAt)
            .order_by_asc(community::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    fn posted_in(user_id: &str) -> SelectStatement {
        Query::select()
            .column(community_post::Column::CommunityId)
            .from(CommunityPost)
            .and_where(community_post::Column::AuthorId.eq(user_id))
            .to_owned()
    }

    fn commented_in(user_id: &str) -> SelectStatement {
        Query::select()
            .column((CommunityPost, community_post::Column::CommunityId))
            .from(PostComment)
            .inner_join(
                CommunityPost,
                Expr::col((CommunityPost, community_post::Column::Id))
                    .equals((PostComment, post_comment::Column::PostId)),
            )
            .and_where(Expr::col((PostComment, post_comment::Column::AuthorId)).eq(user_id))
            .to_owned()
    }

    fn liked_in(user_id: &str) -> SelectStatement {
        Query::select()
            .column((CommunityPost, community_post::Column::CommunityId))
            .from(PostLike)
            .inner_join(
                CommunityPost,
                Expr::col((CommunityPost, community_post::Column::Id))
                    .equals((PostLike, post_like::Column::PostId)),
            )
            .and_where(Expr::col((PostLike, post_like::Column::UserId)).eq(user_id))
            .to_owned()
    }

    fn blocked_by(user_id: &str) -> SelectStatement {
        Query::select()
            .column(community_block::Column::CommunityId)
            .from(CommunityBlock)
            .and_where(community_block::Column::UserId.eq(user_id))
            .to_owned()
    }
}
