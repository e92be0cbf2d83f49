use tracing::warn;

use crate::platform::ChatPlatform;

/// Check whether `user_id` administers `chat_id`.
///
/// Asks the platform every time. Any lookup failure counts as "not an
/// administrator".
pub async fn is_administrator(platform: &dyn ChatPlatform, chat_id: i64, user_id: u64) -> bool {
    match platform.member_status(chat_id, user_id).await {
        Ok(status) => status.is_admin(),
        Err(e) => {
            warn!(
                "Admin lookup failed for user {} in chat {}: {}",
                user_id, chat_id, e
            );
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::testing::{Call, FakePlatform, Op};
    use crate::platform::MemberStatus;

    const CHAT: i64 = -100123;

    #[tokio::test]
    async fn test_creator_and_administrator_pass() {
        let platform = FakePlatform::new()
            .with_member(1, MemberStatus::Creator)
            .with_member(2, MemberStatus::Administrator);

        assert!(is_administrator(&platform, CHAT, 1).await);
        assert!(is_administrator(&platform, CHAT, 2).await);
    }

    #[tokio::test]
    async fn test_regular_members_fail() {
        let platform = FakePlatform::new()
            .with_member(3, MemberStatus::Member)
            .with_member(4, MemberStatus::Restricted);

        assert!(!is_administrator(&platform, CHAT, 3).await);
        assert!(!is_administrator(&platform, CHAT, 4).await);
    }

    #[tokio::test]
    async fn test_unknown_user_fails_closed() {
        let platform = FakePlatform::new();
        assert!(!is_administrator(&platform, CHAT, 99).await);
    }

    #[tokio::test]
    async fn test_lookup_error_fails_closed() {
        let platform = FakePlatform::new()
            .with_member(1, MemberStatus::Creator)
            .failing_on(Op::MemberStatus);
        assert!(!is_administrator(&platform, CHAT, 1).await);
    }

    #[tokio::test]
    async fn test_every_check_is_a_fresh_lookup() {
        let platform = FakePlatform::new().with_member(1, MemberStatus::Administrator);

        is_administrator(&platform, CHAT, 1).await;
        is_administrator(&platform, CHAT, 1).await;

        let lookups = platform
            .calls()
            .into_iter()
            .filter(|c| matches!(c, Call::MemberStatus { .. }))
            .count();
        assert_eq!(lookups, 2);
    }
}
