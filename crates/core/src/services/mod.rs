//! Business logic services.

#![allow(missing_docs)]

pub mod access;
pub mod activity;
pub mod community;
pub mod deletion;
pub mod email;
pub mod moderation;
pub mod post;
pub mod user;

pub use access::{AccessDecision, DenyReason, can_access, evaluate};
pub use activity::{ActivityItem, ActivityKind, ActivityService};
pub use community::{CommunityService, CreateCommunityInput};
pub use deletion::DeletionService;
pub use email::EmailService;
pub use moderation::ModerationService;
pub use post::{CreateCommentInput, CreatePostInput, PostService};
pub use user::{UpdateProfileInput, UserService};
