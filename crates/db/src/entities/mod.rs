//! Database entities.

pub mod community;
pub mod community_block;
pub mod community_post;
pub mod content_item;
pub mod post_comment;
pub mod post_like;
pub mod rating;
pub mod user;

pub use community::Entity as Community;
pub use community_block::Entity as CommunityBlock;
pub use community_post::Entity as CommunityPost;
pub use content_item::Entity as ContentItem;
pub use post_comment::Entity as PostComment;
pub use post_like::Entity as PostLike;
pub use rating::Entity as Rating;
pub use user::Entity as User;
