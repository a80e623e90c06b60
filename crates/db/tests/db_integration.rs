//! Database integration tests.
//!
//! These tests require a running `PostgreSQL` instance.
//! Run with: `cargo test --test db_integration -- --ignored`
//!
//! Environment variables:
//!   `TEST_DB_HOST` (default: localhost)
//!   `TEST_DB_PORT` (default: 5433)
//!   `TEST_DB_USER` (default: `memoriaviva_test`)
//!   `TEST_DB_PASSWORD` (default: `memoriaviva_test`)
//!   `TEST_DB_NAME` (default: `memoriaviva_test`)

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use chrono::Utc;
use memoriaviva_common::{AppError, IdGenerator};
use memoriaviva_db::entities::{community, community::CommunityStatus, community_post, user};
use memoriaviva_db::repositories::{
    CascadeRepository, CommunityBlockRepository, CommunityPostRepository, CommunityRepository,
    PostCommentRepository, PostLikeRepository, UserRepository,
};
use memoriaviva_db::test_utils::{TestDatabase, TestDbConfig};
use sea_orm::{ConnectionTrait, DatabaseConnection, Set};

struct Repos {
    users: UserRepository,
    communities: CommunityRepository,
    posts: CommunityPostRepository,
    comments: PostCommentRepository,
    likes: PostLikeRepository,
    blocks: CommunityBlockRepository,
    cascade: CascadeRepository,
    ids: IdGenerator,
}

impl Repos {
    fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            users: UserRepository::new(db.clone()),
            communities: CommunityRepository::new(db.clone()),
            posts: CommunityPostRepository::new(db.clone()),
            comments: PostCommentRepository::new(db.clone()),
            likes: PostLikeRepository::new(db.clone()),
            blocks: CommunityBlockRepository::new(db.clone()),
            cascade: CascadeRepository::new(db),
            ids: IdGenerator::new(),
        }
    }

    async fn create_user(&self, username: &str) -> user::Model {
        self.users
            .create(user::ActiveModel {
                id: Set(self.ids.generate()),
                username: Set(username.to_string()),
                email: Set(None),
                display_name: Set(None),
                bio: Set(None),
                avatar_url: Set(None),
                is_admin: Set(false),
                created_at: Set(Utc::now().into()),
            })
            .await
            .unwrap()
    }

    async fn create_community(&self, owner: &user::Model, name: &str) -> community::Model {
        self.communities
            .create(community::ActiveModel {
                id: Set(self.ids.generate()),
                owner_id: Set(owner.id.clone()),
                name: Set(name.to_string()),
                description: Set(None),
                status: Set(CommunityStatus::Active),
                is_filtered: Set(false),
                filter_reason: Set(None),
                created_at: Set(Utc::now().into()),
            })
            .await
            .unwrap()
    }

    async fn create_post(
        &self,
        community: &community::Model,
        author: &user::Model,
    ) -> community_post::Model {
        self.posts
            .create(community_post::ActiveModel {
                id: Set(self.ids.generate()),
                community_id: Set(community.id.clone()),
                author_id: Set(author.id.clone()),
                content: Set("integration test post".to_string()),
                created_at: Set(Utc::now().into()),
            })
            .await
            .unwrap()
    }

    async fn create_comment(&self, post: &community_post::Model, author: &user::Model) {
        self.comments
            .create(memoriaviva_db::entities::post_comment::ActiveModel {
                id: Set(self.ids.generate()),
                post_id: Set(post.id.clone()),
                author_id: Set(author.id.clone()),
                text: Set("integration test comment".to_string()),
                created_at: Set(Utc::now().into()),
            })
            .await
            .unwrap();
    }
}

async fn setup() -> (TestDatabase, Repos) {
    let db = TestDatabase::create_unique().await.unwrap();
    memoriaviva_db::migrate(db.connection()).await.unwrap();
    let repos = Repos::new(db.conn.clone());
    (db, repos)
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_database_connection() {
    let config = TestDbConfig::default();
    let result = TestDatabase::with_config(config).await;
    assert!(result.is_ok(), "Failed to connect: {:?}", result.err());
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_like_toggle_is_idempotent() {
    let (db, repos) = setup().await;

    let owner = repos.create_user("owner").await;
    let liker = repos.create_user("liker").await;
    let community = repos.create_community(&owner, "garden").await;
    let post = repos.create_post(&community, &owner).await;

    let liked = repos
        .likes
        .toggle(repos.ids.generate(), &liker.id, &post.id)
        .await
        .unwrap();
    assert!(liked);
    assert_eq!(repos.likes.count_by_post(&post.id).await.unwrap(), 1);

    let liked = repos
        .likes
        .toggle(repos.ids.generate(), &liker.id, &post.id)
        .await
        .unwrap();
    assert!(!liked);
    assert_eq!(repos.likes.count_by_post(&post.id).await.unwrap(), 0);

    db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_delete_post_removes_comments_and_likes() {
    let (db, repos) = setup().await;

    let owner = repos.create_user("owner").await;
    let visitor = repos.create_user("visitor").await;
    let community = repos.create_community(&owner, "kitchen").await;
    let post = repos.create_post(&community, &owner).await;

    repos.create_comment(&post, &visitor).await;
    repos.create_comment(&post, &owner).await;
    repos
        .likes
        .toggle(repos.ids.generate(), &visitor.id, &post.id)
        .await
        .unwrap();

    repos.cascade.delete_post(&post.id).await.unwrap();

    assert!(repos.posts.find_by_id(&post.id).await.unwrap().is_none());
    assert_eq!(repos.comments.count_by_post(&post.id).await.unwrap(), 0);
    assert_eq!(repos.likes.count_by_post(&post.id).await.unwrap(), 0);

    db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_delete_user_removes_owned_communities_and_content() {
    let (db, repos) = setup().await;

    let doomed = repos.create_user("doomed").await;
    let survivor = repos.create_user("survivor").await;

    // Doomed user owns a community in which the survivor participated.
    let owned = repos.create_community(&doomed, "doomed-place").await;
    let post = repos.create_post(&owned, &doomed).await;
    repos.create_comment(&post, &survivor).await;

    // Doomed user also commented elsewhere.
    let other = repos.create_community(&survivor, "other-place").await;
    let other_post = repos.create_post(&other, &survivor).await;
    repos.create_comment(&other_post, &doomed).await;

    repos.cascade.delete_user(&doomed.id).await.unwrap();

    assert!(repos.users.find_by_id(&doomed.id).await.unwrap().is_none());
    assert!(
        repos
            .communities
            .find_by_id(&owned.id)
            .await
            .unwrap()
            .is_none()
    );
    assert!(repos.posts.find_by_id(&post.id).await.unwrap().is_none());
    // The survivor's community and post are untouched, minus the
    // doomed user's comment.
    assert!(
        repos
            .posts
            .find_by_id(&other_post.id)
            .await
            .unwrap()
            .is_some()
    );
    assert_eq!(
        repos.comments.count_by_post(&other_post.id).await.unwrap(),
        0
    );

    db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_failed_cascade_rolls_back_earlier_deletes() {
    let (db, repos) = setup().await;

    let owner = repos.create_user("owner").await;
    let visitor = repos.create_user("visitor").await;
    let community = repos.create_community(&owner, "garden").await;
    let post = repos.create_post(&community, &owner).await;

    repos.create_comment(&post, &visitor).await;
    repos
        .likes
        .toggle(repos.ids.generate(), &visitor.id, &post.id)
        .await
        .unwrap();

    // Make the like delete fail mid-cascade, after the comment
    // delete has already run.
    db.connection()
        .execute_unprepared(
            r"
            CREATE FUNCTION refuse_like_delete() RETURNS trigger AS $$
            BEGIN RAISE EXCEPTION 'like rows are frozen'; END;
            $$ LANGUAGE plpgsql;
            CREATE TRIGGER refuse_like_delete BEFORE DELETE ON post_like
            FOR EACH ROW EXECUTE FUNCTION refuse_like_delete();
            ",
        )
        .await
        .unwrap();

    let result = repos.cascade.delete_post(&post.id).await;
    assert!(matches!(result, Err(AppError::TransactionAborted(_))));

    // Nothing was deleted: the comment removal rolled back with the
    // rest of the transaction.
    assert!(repos.posts.find_by_id(&post.id).await.unwrap().is_some());
    assert_eq!(repos.comments.count_by_post(&post.id).await.unwrap(), 1);
    assert_eq!(repos.likes.count_by_post(&post.id).await.unwrap(), 1);

    db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_accessible_communities_respect_filter_and_blocked_status() {
    let (db, repos) = setup().await;

    let owner = repos.create_user("owner").await;
    let member = repos.create_user("member").await;

    let filtered = repos
        .communities
        .create(community::ActiveModel {
            id: Set(repos.ids.generate()),
            owner_id: Set(owner.id.clone()),
            name: Set("garden".to_string()),
            description: Set(None),
            status: Set(CommunityStatus::Active),
            is_filtered: Set(true),
            filter_reason: Set(Some("Sensitive content".to_string())),
            created_at: Set(Utc::now().into()),
        })
        .await
        .unwrap();
    let blocked = repos
        .communities
        .create(community::ActiveModel {
            id: Set(repos.ids.generate()),
            owner_id: Set(owner.id.clone()),
            name: Set("cellar".to_string()),
            description: Set(None),
            status: Set(CommunityStatus::Blocked),
            is_filtered: Set(false),
            filter_reason: Set(None),
            created_at: Set(Utc::now().into()),
        })
        .await
        .unwrap();

    // The member has interacted with both.
    let in_filtered = repos.create_post(&filtered, &owner).await;
    repos.create_comment(&in_filtered, &member).await;
    let in_blocked = repos.create_post(&blocked, &owner).await;
    repos.create_comment(&in_blocked, &member).await;

    // Default listing hides the filtered community from the member.
    let mine = repos
        .communities
        .find_accessible(&member.id, false)
        .await
        .unwrap();
    assert!(mine.iter().all(|c| c.name != "garden"));

    // Asking for filtered content brings it back; the admin-blocked
    // community stays out regardless.
    let mine = repos
        .communities
        .find_accessible(&member.id, true)
        .await
        .unwrap();
    let names: Vec<&str> = mine.iter().map(|c| c.name.as_str()).collect();
    assert!(names.contains(&"garden"));
    assert!(!names.contains(&"cellar"));

    // The owner sees both without asking.
    let owned = repos
        .communities
        .find_accessible(&owner.id, false)
        .await
        .unwrap();
    let names: Vec<&str> = owned.iter().map(|c| c.name.as_str()).collect();
    assert!(names.contains(&"garden"));
    assert!(names.contains(&"cellar"));

    db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_accessible_communities_follow_interaction_history() {
    let (db, repos) = setup().await;

    let owner = repos.create_user("owner").await;
    let member = repos.create_user("member").await;

    let garden = repos.create_community(&owner, "garden").await;
    let unrelated = repos.create_community(&owner, "unrelated").await;
    let post = repos.create_post(&garden, &owner).await;
    repos.create_comment(&post, &member).await;

    let mine = repos
        .communities
        .find_accessible(&member.id, false)
        .await
        .unwrap();
    let names: Vec<&str> = mine.iter().map(|c| c.name.as_str()).collect();
    assert!(names.contains(&"garden"));
    assert!(!names.contains(&unrelated.name.as_str()));

    // A personal block removes the community from the listing.
    repos
        .blocks
        .create(repos.ids.generate(), &member.id, &garden.id, None)
        .await
        .unwrap();
    let mine = repos
        .communities
        .find_accessible(&member.id, false)
        .await
        .unwrap();
    assert!(mine.iter().all(|c| c.name != "garden"));

    db.drop_database().await.unwrap();
}
