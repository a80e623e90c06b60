//! User profile service.

use memoriaviva_common::{AppError, AppResult};
use memoriaviva_db::entities::user;
use memoriaviva_db::repositories::UserRepository;
use sea_orm::Set;
use serde::Deserialize;
use validator::Validate;

/// Input for updating a profile. Omitted fields are left unchanged;
/// a blank value clears the field.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileInput {
    #[validate(length(max = 80))]
    pub display_name: Option<String>,
    #[validate(length(max = 1024))]
    pub bio: Option<String>,
    #[validate(length(max = 512))]
    pub avatar_url: Option<String>,
}

/// Service for user profile maintenance.
#[derive(Clone)]
pub struct UserService {
    user_repo: UserRepository,
}

impl UserService {
    /// Create a new user service.
    #[must_use]
    pub const fn new(user_repo: UserRepository) -> Self {
        Self { user_repo }
    }

    /// Update a user's profile. Users edit their own profile; admins
    /// can edit anyone's.
    pub async fn update_profile(
        &self,
        actor: &user::Model,
        user_id: &str,
        input: UpdateProfileInput,
    ) -> AppResult<user::Model> {
        if actor.id != user_id && !actor.is_admin {
            return Err(AppError::Forbidden(
                "You can only edit your own profile".to_string(),
            ));
        }

        input
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        let target = self.user_repo.get_by_id(user_id).await?;
        let mut active: user::ActiveModel = target.into();

        if let Some(display_name) = input.display_name {
            active.display_name = Set(normalize(display_name));
        }
        if let Some(bio) = input.bio {
            active.bio = Set(normalize(bio));
        }
        if let Some(avatar_url) = input.avatar_url {
            active.avatar_url = Set(normalize(avatar_url));
        }

        self.user_repo.update(active).await
    }
}

fn normalize(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
