use std::fmt;

use chrono::{DateTime, Duration, Utc};
use teloxide::utils::html;
use tracing::{error, info};

use crate::auth::is_administrator;
use crate::errors::CommandError;
use crate::platform::{Actor, ChatPlatform, ChatUser, PlatformError, RepliedMessage};
use crate::router::Reply;

/// Default length of a mute, in minutes
pub const DEFAULT_MUTE_MINUTES: i64 = 60;

pub fn default_mute() -> Duration {
    Duration::minutes(DEFAULT_MUTE_MINUTES)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModerationKind {
    Pin,
    Unpin,
    Kick,
    Ban,
    Mute,
}

impl ModerationKind {
    pub fn verb(self) -> &'static str {
        match self {
            ModerationKind::Pin => "pin",
            ModerationKind::Unpin => "unpin",
            ModerationKind::Kick => "kick",
            ModerationKind::Ban => "ban",
            ModerationKind::Mute => "mute",
        }
    }

    /// Kick, ban and mute act on another member and never on an admin.
    pub fn needs_target(self) -> bool {
        matches!(
            self,
            ModerationKind::Kick | ModerationKind::Ban | ModerationKind::Mute
        )
    }
}

impl fmt::Display for ModerationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.verb())
    }
}

/// A privileged action, fully resolved from one inbound message.
#[derive(Debug, Clone, PartialEq)]
pub struct ModerationAction {
    pub kind: ModerationKind,
    pub actor: Actor,
    pub target: Option<ChatUser>,
    /// Message to pin
    pub message_id: Option<i32>,
    /// Mute length
    pub duration: Option<Duration>,
}

impl ModerationAction {
    /// Work out what the action applies to.
    ///
    /// The target only ever comes from the replied-to message. A missing
    /// reply fails here, before the admin lookup or any other platform call.
    pub fn resolve(
        kind: ModerationKind,
        actor: Actor,
        reply_to: Option<&RepliedMessage>,
        mute_duration: Duration,
    ) -> Result<Self, CommandError> {
        let mut action = ModerationAction {
            kind,
            actor,
            target: None,
            message_id: None,
            duration: None,
        };

        match kind {
            ModerationKind::Pin => {
                let reply = reply_to.ok_or(CommandError::MissingReply(kind))?;
                action.message_id = Some(reply.message_id);
            }
            ModerationKind::Unpin => {}
            ModerationKind::Kick | ModerationKind::Ban | ModerationKind::Mute => {
                let target = reply_to
                    .and_then(|reply| reply.author.clone())
                    .ok_or(CommandError::MissingReply(kind))?;
                action.target = Some(target);
                if kind == ModerationKind::Mute {
                    action.duration = Some(mute_duration);
                }
            }
        }

        Ok(action)
    }
}

/// When a mute issued at `invoked_at` runs out
pub fn mute_expiry(invoked_at: DateTime<Utc>, duration: Duration) -> DateTime<Utc> {
    invoked_at + duration
}

/// "1 hour", "30 minutes", "2 hours 15 minutes"
pub fn describe_duration(duration: Duration) -> String {
    let hours = duration.num_hours();
    let minutes = duration.num_minutes() - hours * 60;

    let unit = |n: i64, one: &str, many: &str| {
        format!("{} {}", n, if n == 1 { one } else { many })
    };

    match (hours, minutes) {
        (0, m) => unit(m, "minute", "minutes"),
        (h, 0) => unit(h, "hour", "hours"),
        (h, m) => format!("{} {}", unit(h, "hour", "hours"), unit(m, "minute", "minutes")),
    }
}

/// HTML link that mentions the user by first name
pub fn mention_html(user: &ChatUser) -> String {
    format!(
        "<a href=\"tg://user?id={}\">{}</a>",
        user.id,
        html::escape(&user.first_name)
    )
}

/// Runs moderation actions against the platform.
///
/// Checks are always made in the same order: actor is admin, then target
/// is not admin, then the platform steps. Nothing is cached between calls.
pub struct Sequencer<'a> {
    platform: &'a dyn ChatPlatform,
}

impl<'a> Sequencer<'a> {
    pub fn new(platform: &'a dyn ChatPlatform) -> Self {
        Self { platform }
    }

    pub async fn execute(
        &self,
        action: &ModerationAction,
        now: DateTime<Utc>,
    ) -> Result<Reply, CommandError> {
        let chat_id = action.actor.chat_id;

        if !is_administrator(self.platform, chat_id, action.actor.user_id).await {
            return Err(CommandError::Unauthorized);
        }

        let target = if action.kind.needs_target() {
            let target = action
                .target
                .as_ref()
                .ok_or(CommandError::MissingReply(action.kind))?;
            if is_administrator(self.platform, chat_id, target.id).await {
                return Err(CommandError::TargetProtected(action.kind));
            }
            Some(target)
        } else {
            None
        };

        let result = match (action.kind, target) {
            (ModerationKind::Pin, _) => {
                let message_id = action
                    .message_id
                    .ok_or(CommandError::MissingReply(action.kind))?;
                self.platform
                    .pin_message(chat_id, message_id)
                    .await
                    .map(|_| Reply::text("Message pinned."))
            }
            (ModerationKind::Unpin, _) => self
                .platform
                .unpin_all(chat_id)
                .await
                .map(|_| Reply::text("All messages unpinned.")),
            (ModerationKind::Kick, Some(target)) => self.kick(chat_id, target).await,
            (ModerationKind::Ban, Some(target)) => self
                .platform
                .ban_member(chat_id, target.id)
                .await
                .map(|_| Reply::Html(format!("User {} banned.", mention_html(target)))),
            (ModerationKind::Mute, Some(target)) => {
                let duration = action.duration.unwrap_or_else(default_mute);
                self.platform
                    .restrict_until(chat_id, target.id, mute_expiry(now, duration))
                    .await
                    .map(|_| {
                        Reply::Html(format!(
                            "User {} muted for {}.",
                            mention_html(target),
                            describe_duration(duration)
                        ))
                    })
            }
            (kind, None) => return Err(CommandError::MissingReply(kind)),
        };

        match result {
            Ok(reply) => {
                info!(
                    "{} done in chat {} by {} (target {:?})",
                    action.kind,
                    chat_id,
                    action.actor.user_id,
                    target.map(|t| t.id)
                );
                Ok(reply)
            }
            Err(e) => {
                error!(
                    "{} failed in chat {} by {} (target {:?}): {}",
                    action.kind,
                    chat_id,
                    action.actor.user_id,
                    target.map(|t| t.id),
                    e
                );
                Err(CommandError::platform(action.kind.verb(), e))
            }
        }
    }

    /// Ban, then lift the ban so the user can rejoin. The unban is only sent
    /// once the ban has gone through.
    async fn kick(&self, chat_id: i64, target: &ChatUser) -> Result<Reply, PlatformError> {
        self.platform.ban_member(chat_id, target.id).await?;
        self.platform.unban_member(chat_id, target.id).await?;
        Ok(Reply::Html(format!("User {} kicked.", mention_html(target))))
    }
}
