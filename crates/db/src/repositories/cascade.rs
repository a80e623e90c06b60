//! Cascade deletion repository.
//!
//! Referential cleanup for post, community, and user removal. Each
//! public operation runs as an explicit ordered sequence of scoped
//! deletes inside a single transaction: either every row change
//! commits or none do. A failure at any step rolls the whole
//! operation back and surfaces as `TransactionAborted`.

use std::sync::Arc;

use crate::entities::{
    Community, CommunityBlock, CommunityPost, PostComment, PostLike, Rating, User, community,
    community_block, community_post, post_comment, post_like, rating,
};
use memoriaviva_common::{AppError, AppResult};
use sea_orm::sea_query::{Query, SelectStatement};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    QueryFilter, TransactionTrait,
};
use tracing::debug;

/// Cascade deletion repository.
#[derive(Clone)]
pub struct CascadeRepository {
    db: Arc<DatabaseConnection>,
}

impl CascadeRepository {
    /// Create a new cascade repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Delete a post together with its comments and likes.
    pub async fn delete_post(&self, post_id: &str) -> AppResult<()> {
        let txn = self.begin().await?;

        Self::delete_post_children(&txn, post_id).await?;

        CommunityPost::delete_by_id(post_id)
            .exec(&txn)
            .await
            .map_err(aborted)?;

        txn.commit().await.map_err(aborted)?;
        debug!(post_id, "Deleted post with children");
        Ok(())
    }

    /// Delete a community together with its posts (and their
    /// children) and every block row referencing it.
    pub async fn delete_community(&self, community_id: &str) -> AppResult<()> {
        let txn = self.begin().await?;

        Self::delete_community_scoped(&txn, community_id).await?;

        txn.commit().await.map_err(aborted)?;
        debug!(community_id, "Deleted community with children");
        Ok(())
    }

    /// Delete a user and everything that references them: ratings,
    /// likes, comments, authored posts with their children, owned
    /// communities with their full contents, and blocks they made.
    ///
    /// Community cleanup runs before the user row is removed because
    /// community ownership references the user.
    pub async fn delete_user(&self, user_id: &str) -> AppResult<()> {
        let txn = self.begin().await?;

        Rating::delete_many()
            .filter(rating::Column::UserId.eq(user_id))
            .exec(&txn)
            .await
            .map_err(aborted)?;

        PostLike::delete_many()
            .filter(post_like::Column::UserId.eq(user_id))
            .exec(&txn)
            .await
            .map_err(aborted)?;

        PostComment::delete_many()
            .filter(post_comment::Column::AuthorId.eq(user_id))
            .exec(&txn)
            .await
            .map_err(aborted)?;

        // Authored posts carry children by other users too.
        PostComment::delete_many()
            .filter(post_comment::Column::PostId.in_subquery(posts_by_author(user_id)))
            .exec(&txn)
            .await
            .map_err(aborted)?;

        PostLike::delete_many()
            .filter(post_like::Column::PostId.in_subquery(posts_by_author(user_id)))
            .exec(&txn)
            .await
            .map_err(aborted)?;

        CommunityPost::delete_many()
            .filter(community_post::Column::AuthorId.eq(user_id))
            .exec(&txn)
            .await
            .map_err(aborted)?;

        let owned = Community::find()
            .filter(community::Column::OwnerId.eq(user_id))
            .all(&txn)
            .await
            .map_err(aborted)?;

        for c in &owned {
            Self::delete_community_scoped(&txn, &c.id).await?;
        }

        CommunityBlock::delete_many()
            .filter(community_block::Column::UserId.eq(user_id))
            .exec(&txn)
            .await
            .map_err(aborted)?;

        User::delete_by_id(user_id).exec(&txn).await.map_err(aborted)?;

        txn.commit().await.map_err(aborted)?;
        debug!(user_id, owned_communities = owned.len(), "Deleted user with children");
        Ok(())
    }

    async fn begin(&self) -> AppResult<DatabaseTransaction> {
        self.db.begin().await.map_err(aborted)
    }

    /// Scoped cleanup of one community inside an open transaction.
    async fn delete_community_scoped<C: ConnectionTrait>(
        conn: &C,
        community_id: &str,
    ) -> AppResult<()> {
        PostComment::delete_many()
            .filter(post_comment::Column::PostId.in_subquery(posts_in_community(community_id)))
            .exec(conn)
            .await
            .map_err(aborted)?;

        PostLike::delete_many()
            .filter(post_like::Column::PostId.in_subquery(posts_in_community(community_id)))
            .exec(conn)
            .await
            .map_err(aborted)?;

        CommunityPost::delete_many()
            .filter(community_post::Column::CommunityId.eq(community_id))
            .exec(conn)
            .await
            .map_err(aborted)?;

        CommunityBlock::delete_many()
            .filter(community_block::Column::CommunityId.eq(community_id))
            .exec(conn)
            .await
            .map_err(aborted)?;

        Community::delete_by_id(community_id)
            .exec(conn)
            .await
            .map_err(aborted)?;

        Ok(())
    }

    /// Scoped cleanup of one post's children inside an open transaction.
    async fn delete_post_children<C: ConnectionTrait>(conn: &C, post_id: &str) -> AppResult<()> {
        PostComment::delete_many()
            .filter(post_comment::Column::PostId.eq(post_id))
            .exec(conn)
            .await
            .map_err(aborted)?;

        PostLike::delete_many()
            .filter(post_like::Column::PostId.eq(post_id))
            .exec(conn)
            .await
            .map_err(aborted)?;

        Ok(())
    }
}

fn aborted(e: sea_orm::DbErr) -> AppError {
    AppError::TransactionAborted(e.to_string())
}

fn posts_in_community(community_id: &str) -> SelectStatement {
    Query::select()
        .column(community_post::Column::Id)
        .from(CommunityPost)
        .and_where(community_post::Column::CommunityId.eq(community_id))
        .to_owned()
}

fn posts_by_author(author_id: &str) -> SelectStatement {
    Query::select()
        .column(community_post::Column::Id)
        .from(CommunityPost)
        .and_where(community_post::Column::AuthorId.eq(author_id))
        .to_owned()
}
