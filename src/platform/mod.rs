pub mod telegram;
#[cfg(test)]
pub mod testing;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// The user issuing a command, and the chat it was issued in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub user_id: u64,
    pub chat_id: i64,
}

/// Author of a message, as far as the handlers care about it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatUser {
    pub id: u64,
    pub first_name: String,
    pub last_name: Option<String>,
    pub username: Option<String>,
}

/// The message a command was sent in reply to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepliedMessage {
    pub message_id: i32,
    /// Missing for channel posts and other anonymous senders
    pub author: Option<ChatUser>,
}

/// Membership status as reported by the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberStatus {
    Creator,
    Administrator,
    Member,
    Restricted,
    Left,
    Banned,
}

impl MemberStatus {
    /// Owners count as administrators.
    pub fn is_admin(self) -> bool {
        matches!(self, MemberStatus::Creator | MemberStatus::Administrator)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    #[error(transparent)]
    Request(#[from] teloxide::RequestError),
    #[error("invalid url '{0}'")]
    InvalidUrl(String),
    /// Failures injected by the in-memory test platform
    #[cfg(test)]
    #[error("{0}")]
    Other(String),
}

/// Outbound operations the bot performs against the chat platform.
///
/// Every call is a single request with no retries; a failure is reported
/// back to the caller, which decides what the user gets to see.
#[async_trait]
pub trait ChatPlatform: Send + Sync {
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<(), PlatformError>;

    /// Send text formatted with the platform's HTML subset
    async fn send_html(&self, chat_id: i64, html: &str) -> Result<(), PlatformError>;

    async fn send_photo(&self, chat_id: i64, url: &str) -> Result<(), PlatformError>;

    async fn send_poll(
        &self,
        chat_id: i64,
        question: &str,
        options: &[String],
        is_anonymous: bool,
    ) -> Result<(), PlatformError>;

    async fn member_status(&self, chat_id: i64, user_id: u64)
        -> Result<MemberStatus, PlatformError>;

    async fn pin_message(&self, chat_id: i64, message_id: i32) -> Result<(), PlatformError>;

    async fn unpin_all(&self, chat_id: i64) -> Result<(), PlatformError>;

    async fn ban_member(&self, chat_id: i64, user_id: u64) -> Result<(), PlatformError>;

    async fn unban_member(&self, chat_id: i64, user_id: u64) -> Result<(), PlatformError>;

    /// Take away the member's ability to send messages until `until`
    async fn restrict_until(
        &self,
        chat_id: i64,
        user_id: u64,
        until: DateTime<Utc>,
    ) -> Result<(), PlatformError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_creator_and_administrator_are_admins() {
        assert!(MemberStatus::Creator.is_admin());
        assert!(MemberStatus::Administrator.is_admin());
        assert!(!MemberStatus::Member.is_admin());
        assert!(!MemberStatus::Restricted.is_admin());
        assert!(!MemberStatus::Left.is_admin());
        assert!(!MemberStatus::Banned.is_admin());
    }
}
