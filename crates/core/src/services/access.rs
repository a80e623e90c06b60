//! Community access evaluation.
//!
//! Pure predicates over already-loaded models. Nothing here touches a
//! repository or mutates state; the caller loads the community, looks
//! up the personal block flag, and passes the actor's identity in
//! full (including the admin flag) so the decision stays unit-testable
//! without ambient state.

use memoriaviva_db::entities::{community, community::CommunityStatus, user};
use serde::Serialize;

/// Why access to a community was denied.
///
/// Presentational only: callers may surface the matching message, but
/// the access contract is the boolean.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DenyReason {
    /// The community was blocked by an admin.
    CommunityBlocked,
    /// The user personally blocked this community.
    BlockedByUser,
    /// The community is filtered and no override was requested.
    Filtered,
}

impl DenyReason {
    /// Human-readable message for UI surfaces.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::CommunityBlocked => "This community has been blocked by an administrator",
            Self::BlockedByUser => "You have blocked this community",
            Self::Filtered => "This community is hidden behind a content filter",
        }
    }
}

/// Outcome of an access evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessDecision {
    /// Whether the user may view or act on the community.
    pub allowed: bool,
    /// Set when `allowed` is false.
    pub reason: Option<DenyReason>,
}

impl AccessDecision {
    const ALLOWED: Self = Self {
        allowed: true,
        reason: None,
    };

    const fn denied(reason: DenyReason) -> Self {
        Self {
            allowed: false,
            reason: Some(reason),
        }
    }
}

/// Evaluate whether `user` may access `community`.
///
/// The owner always passes, whatever the status or filter state. For
/// everyone else all three conditions must hold: the community is
/// active, the user has not personally blocked it, and it is either
/// unfiltered, explicitly requested with `show_filtered`, or the user
/// is an admin. The conditions are independent; ownership of some
/// *other* community grants nothing here.
#[must_use]
pub fn evaluate(
    user: &user::Model,
    community: &community::Model,
    blocked_by_user: bool,
    show_filtered: bool,
) -> AccessDecision {
    if community.owner_id == user.id {
        return AccessDecision::ALLOWED;
    }

    let status_ok = community.status == CommunityStatus::Active;
    let not_blocked = !blocked_by_user;
    let filter_ok = !community.is_filtered || show_filtered || user.is_admin;

    if status_ok && not_blocked && filter_ok {
        return AccessDecision::ALLOWED;
    }

    // First failing axis, for messaging only.
    let reason = if !status_ok {
        DenyReason::CommunityBlocked
    } else if !not_blocked {
        DenyReason::BlockedByUser
    } else {
        DenyReason::Filtered
    };

    AccessDecision::denied(reason)
}

/// Boolean form of [`evaluate`].
#[must_use]
pub fn can_access(
    user: &user::Model,
    community: &community::Model,
    blocked_by_user: bool,
    show_filtered: bool,
) -> bool {
    evaluate(user, community, blocked_by_user, show_filtered).allowed
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn test_user(id: &str, is_admin: bool) -> user::Model {
        user::Model {
            id: id.to_string(),
            username: format!("user-{id}"),
            email: None,
            display_name: None,
            bio: None,
            avatar_url: None,
            is_admin,
            created_at: Utc::now().into(),
        }
    }

    fn test_community(
        id: &str,
        owner_id: &str,
        status: CommunityStatus,
        is_filtered: bool,
    ) -> community::Model {
        community::Model {
            id: id.to_string(),
            owner_id: owner_id.to_string(),
            name: format!("community-{id}"),
            description: None,
            status,
            is_filtered,
            filter_reason: is_filtered.then(|| "Sensitive content".to_string()),
            created_at: Utc::now().into(),
        }
    }

    #[test]
    fn test_owner_passes_regardless_of_status_and_filter() {
        let owner = test_user("u1", false);

        for status in [CommunityStatus::Active, CommunityStatus::Blocked] {
            for filtered in [false, true] {
                let c = test_community("c1", "u1", status, filtered);
                assert!(can_access(&owner, &c, false, false));
            }
        }
    }

    #[test]
    fn test_blocked_community_denies_every_non_owner() {
        let c = test_community("c1", "u1", CommunityStatus::Blocked, false);
        let other = test_user("u2", false);
        let admin = test_user("u3", true);

        let decision = evaluate(&other, &c, false, false);
        assert!(!decision.allowed);
        assert_eq!(decision.reason, Some(DenyReason::CommunityBlocked));
        // Admin role does not bypass an admin block, only the filter.
        assert!(!can_access(&admin, &c, false, true));
    }

    #[test]
    fn test_personal_block_denies_access() {
        let c = test_community("c1", "u1", CommunityStatus::Active, false);
        let other = test_user("u2", false);

        let decision = evaluate(&other, &c, true, false);
        assert!(!decision.allowed);
        assert_eq!(decision.reason, Some(DenyReason::BlockedByUser));
    }

    #[test]
    fn test_filtered_community_needs_override_or_admin() {
        let c = test_community("c1", "u1", CommunityStatus::Active, true);
        let other = test_user("u2", false);
        let admin = test_user("u3", true);

        assert!(!can_access(&other, &c, false, false));
        assert_eq!(
            evaluate(&other, &c, false, false).reason,
            Some(DenyReason::Filtered)
        );
        assert!(can_access(&other, &c, false, true));
        assert!(can_access(&admin, &c, false, false));
    }

    #[test]
    fn test_owning_a_different_community_grants_nothing() {
        // u2 owns some other community; that must not matter here.
        let c = test_community("c1", "u1", CommunityStatus::Blocked, false);
        let u2 = test_user("u2", false);
        assert!(!can_access(&u2, &c, false, true));
    }

    #[test]
    fn test_all_axes_failing_still_denies() {
        let c = test_community("c1", "u1", CommunityStatus::Blocked, true);
        let other = test_user("u2", false);
        assert!(!can_access(&other, &c, true, false));
    }
}
