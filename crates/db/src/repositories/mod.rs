//! Database repositories.

pub mod cascade;
pub mod community;
pub mod community_block;
pub mod community_post;
pub mod content_item;
pub mod post_comment;
pub mod post_like;
pub mod rating;
pub mod user;

pub use cascade::CascadeRepository;
pub use community::CommunityRepository;
pub use community_block::CommunityBlockRepository;
pub use community_post::CommunityPostRepository;
pub use content_item::ContentItemRepository;
pub use post_comment::PostCommentRepository;
pub use post_like::PostLikeRepository;
pub use rating::RatingRepository;
pub use user::UserRepository;
