//! Cross-type activity feed.
//!
//! Merges a user's recent ratings, posts, comments, and likes into a
//! single bounded feed. Each source contributes at most
//! [`SOURCE_BOUND`] rows inside the lookback window; rows whose parent
//! entity has since been deleted are dropped without error.

use std::collections::{HashMap, HashSet};

use chrono::{Duration, Utc};
use memoriaviva_common::AppResult;
use memoriaviva_db::entities::{
    community, community_post, content_item, post_comment, post_like, rating,
};
use memoriaviva_db::entities::community_post::Model as PostModel;
use memoriaviva_db::repositories::{
    CommunityPostRepository, CommunityRepository, ContentItemRepository, PostCommentRepository,
    PostLikeRepository, RatingRepository,
};
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::Serialize;

/// Maximum rows fetched per source before merging.
const SOURCE_BOUND: u64 = 5;

/// Maximum characters of description shown per item.
const DESCRIPTION_LIMIT: usize = 100;

/// Default number of items in the merged feed.
pub const DEFAULT_FEED_LIMIT: usize = 10;

/// The source a feed item was derived from.
///
/// The discriminant order is the deterministic tie-break for items
/// sharing a timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ActivityKind {
    Rating,
    Post,
    Comment,
    Like,
}

/// A normalized, displayable feed entry.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityItem {
    pub kind: ActivityKind,
    /// Id of the originating row, unique within its kind.
    pub source_id: String,
    pub title: String,
    pub description: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub target_url: String,
}

/// Aggregator over the four activity sources.
#[derive(Clone)]
pub struct ActivityService {
    rating_repo: RatingRepository,
    post_repo: CommunityPostRepository,
    comment_repo: PostCommentRepository,
    like_repo: PostLikeRepository,
    community_repo: CommunityRepository,
    content_repo: ContentItemRepository,
}

impl ActivityService {
    /// Create a new activity service.
    #[must_use]
    pub const fn new(
        rating_repo: RatingRepository,
        post_repo: CommunityPostRepository,
        comment_repo: PostCommentRepository,
        like_repo: PostLikeRepository,
        community_repo: CommunityRepository,
        content_repo: ContentItemRepository,
    ) -> Self {
        Self {
            rating_repo,
            post_repo,
            comment_repo,
            like_repo,
            community_repo,
            content_repo,
        }
    }

    /// Build the user's recent activity feed.
    ///
    /// Sorted strictly descending by timestamp; ties fall back to
    /// kind then source id so repeated calls return the same order.
    pub async fn recent_activity(
        &self,
        user_id: &str,
        lookback: Duration,
        limit: usize,
    ) -> AppResult<Vec<ActivityItem>> {
        let since = Utc::now() - lookback;

        let ratings = self
            .rating_repo
            .find_recent_by_user(user_id, since, SOURCE_BOUND)
            .await?;
        let posts = self
            .post_repo
            .find_recent_by_author(user_id, since, SOURCE_BOUND)
            .await?;
        let comments = self
            .comment_repo
            .find_recent_by_author(user_id, since, SOURCE_BOUND)
            .await?;
        let likes = self
            .like_repo
            .find_recent_by_user(user_id, since, SOURCE_BOUND)
            .await?;

        // Batch the parent lookups: content for ratings, posts for
        // comments and likes, communities for everything post-shaped.
        let content_ids: Vec<String> = ratings.iter().map(|r| r.content_id.clone()).collect();
        let contents = index_by_id(
            self.content_repo.find_by_ids(&content_ids).await?,
            |c: &content_item::Model| c.id.clone(),
        );

        let parent_post_ids: Vec<String> = comments
            .iter()
            .map(|c| c.post_id.clone())
            .chain(likes.iter().map(|l| l.post_id.clone()))
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        let parent_posts = index_by_id(
            self.post_repo.find_by_ids(&parent_post_ids).await?,
            |p: &PostModel| p.id.clone(),
        );

        let community_ids: Vec<String> = posts
            .iter()
            .map(|p| p.community_id.clone())
            .chain(parent_posts.values().map(|p| p.community_id.clone()))
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        let communities = index_by_id(
            self.community_repo.find_by_ids(&community_ids).await?,
            |c: &community::Model| c.id.clone(),
        );

        let mut items: Vec<ActivityItem> = Vec::new();
        items.extend(
            ratings
                .into_iter()
                .filter_map(|r| rating_item(r, &contents)),
        );
        items.extend(posts.into_iter().filter_map(|p| post_item(p, &communities)));
        items.extend(
            comments
                .into_iter()
                .filter_map(|c| comment_item(c, &parent_posts, &communities)),
        );
        items.extend(
            likes
                .into_iter()
                .filter_map(|l| like_item(l, &parent_posts, &communities)),
        );

        items.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.kind.cmp(&b.kind))
                .then_with(|| a.source_id.cmp(&b.source_id))
        });
        items.truncate(limit);

        Ok(items)
    }
}

fn index_by_id<T>(rows: Vec<T>, key: impl Fn(&T) -> String) -> HashMap<String, T> {
    rows.into_iter().map(|row| (key(&row), row)).collect()
}

fn rating_item(
    rating: rating::Model,
    contents: &HashMap<String, content_item::Model>,
) -> Option<ActivityItem> {
    let content = contents.get(&rating.content_id)?;
    Some(ActivityItem {
        kind: ActivityKind::Rating,
        source_id: rating.id,
        title: format!("Rated \"{}\" {}/5", content.title, rating.score),
        description: rating.review.as_deref().map(truncate_description),
        created_at: rating.created_at,
        target_url: format!("/content/{}", content.id),
    })
}

fn post_item(
    post: community_post::Model,
    communities: &HashMap<String, community::Model>,
) -> Option<ActivityItem> {
    let community = communities.get(&post.community_id)?;
    Some(ActivityItem {
        kind: ActivityKind::Post,
        title: format!("Posted in {}", community.name),
        description: Some(truncate_description(&post.content)),
        created_at: post.created_at,
        target_url: format!("/posts/{}", post.id),
        source_id: post.id,
    })
}

fn comment_item(
    comment: post_comment::Model,
    posts: &HashMap<String, community_post::Model>,
    communities: &HashMap<String, community::Model>,
) -> Option<ActivityItem> {
    let post = posts.get(&comment.post_id)?;
    let community = communities.get(&post.community_id)?;
    Some(ActivityItem {
        kind: ActivityKind::Comment,
        source_id: comment.id,
        title: format!("Commented on a post in {}", community.name),
        description: Some(truncate_description(&comment.text)),
        created_at: comment.created_at,
        target_url: format!("/posts/{}", post.id),
    })
}

fn like_item(
    like: post_like::Model,
    posts: &HashMap<String, community_post::Model>,
    communities: &HashMap<String, community::Model>,
) -> Option<ActivityItem> {
    let post = posts.get(&like.post_id)?;
    let community = communities.get(&post.community_id)?;
    Some(ActivityItem {
        kind: ActivityKind::Like,
        source_id: like.id,
        title: format!("Liked a post in {}", community.name),
        description: Some(truncate_description(&post.content)),
        created_at: like.created_at,
        target_url: format!("/posts/{}", post.id),
    })
}

/// Char-safe truncation with a trailing ellipsis.
fn truncate_description(text: &str) -> String {
    if text.chars().count() <= DESCRIPTION_LIMIT {
        return text.to_string();
    }
    let head: String = text.chars().take(DESCRIPTION_LIMIT).collect();
    format!("{head}...")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::{DateTime, FixedOffset};
    use memoriaviva_db::entities::community::CommunityStatus;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    fn at(minutes_ago: i64) -> DateTime<FixedOffset> {
        (Utc::now() - Duration::minutes(minutes_ago)).into()
    }

    fn test_community(id: &str) -> community::Model {
        community::Model {
            id: id.to_string(),
            owner_id: "owner".to_string(),
            name: format!("community-{id}"),
            description: None,
            status: CommunityStatus::Active,
            is_filtered: false,
            filter_reason: None,
            created_at: at(1000),
        }
    }

    fn test_post(id: &str, community_id: &str, minutes_ago: i64) -> community_post::Model {
        community_post::Model {
            id: id.to_string(),
            community_id: community_id.to_string(),
            author_id: "u1".to_string(),
            content: "post content".to_string(),
            created_at: at(minutes_ago),
        }
    }

    fn service_with(db: sea_orm::DatabaseConnection) -> ActivityService {
        let db = Arc::new(db);
        ActivityService::new(
            RatingRepository::new(db.clone()),
            CommunityPostRepository::new(db.clone()),
            PostCommentRepository::new(db.clone()),
            PostLikeRepository::new(db.clone()),
            CommunityRepository::new(db.clone()),
            ContentItemRepository::new(db),
        )
    }

    #[test]
    fn test_truncation_is_char_safe() {
        let short = "a short review";
        assert_eq!(truncate_description(short), short);

        let long = "é".repeat(150);
        let truncated = truncate_description(&long);
        assert_eq!(truncated.chars().count(), DESCRIPTION_LIMIT + 3);
        assert!(truncated.ends_with("..."));
    }

    #[test]
    fn test_kind_order_is_the_tie_break_order() {
        assert!(ActivityKind::Rating < ActivityKind::Post);
        assert!(ActivityKind::Post < ActivityKind::Comment);
        assert!(ActivityKind::Comment < ActivityKind::Like);
    }

    #[tokio::test]
    async fn test_feed_merges_sources_newest_first() {
        let rating = rating::Model {
            id: "r1".to_string(),
            user_id: "u1".to_string(),
            content_id: "x1".to_string(),
            score: 5,
            review: Some("wonderful".to_string()),
            created_at: at(30),
        };
        let post = test_post("p1", "c1", 20);
        let comment = post_comment::Model {
            id: "m1".to_string(),
            post_id: "p1".to_string(),
            author_id: "u1".to_string(),
            text: "nice one".to_string(),
            created_at: at(10),
        };
        let content = content_item::Model {
            id: "x1".to_string(),
            title: "Feijoada".to_string(),
            created_at: at(5000),
        };

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![rating]])
            .append_query_results([vec![post.clone()]])
            .append_query_results([vec![comment]])
            .append_query_results([Vec::<post_like::Model>::new()])
            .append_query_results([vec![content]])
            .append_query_results([vec![post]])
            .append_query_results([vec![test_community("c1")]])
            .into_connection();

        let service = service_with(db);
        let feed = service
            .recent_activity("u1", Duration::days(30), DEFAULT_FEED_LIMIT)
            .await
            .unwrap();

        assert_eq!(feed.len(), 3);
        assert_eq!(feed[0].kind, ActivityKind::Comment);
        assert_eq!(feed[1].kind, ActivityKind::Post);
        assert_eq!(feed[2].kind, ActivityKind::Rating);
        assert!(feed[0].created_at >= feed[1].created_at);
        assert!(feed[1].created_at >= feed[2].created_at);
    }

    #[tokio::test]
    async fn test_orphaned_rows_are_skipped() {
        // A like whose post has been deleted must vanish silently.
        let like = post_like::Model {
            id: "l1".to_string(),
            post_id: "gone".to_string(),
            user_id: "u1".to_string(),
            created_at: at(5),
        };

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<rating::Model>::new()])
            .append_query_results([Vec::<community_post::Model>::new()])
            .append_query_results([Vec::<post_comment::Model>::new()])
            .append_query_results([vec![like]])
            .append_query_results([Vec::<community_post::Model>::new()])
            .into_connection();

        let service = service_with(db);
        let feed = service
            .recent_activity("u1", Duration::days(30), DEFAULT_FEED_LIMIT)
            .await
            .unwrap();

        assert!(feed.is_empty());
    }
}
