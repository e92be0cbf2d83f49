use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, error, info};

use crate::content::ContentClient;
use crate::errors::CommandError;
use crate::platform::{ChatPlatform, PlatformError};
use crate::router::{Reply, Request, Router};

/// Shared application state. Read-only after startup; everything
/// request-specific lives in [`Request`].
pub struct AppState {
    pub platform: Arc<dyn ChatPlatform>,
    pub content: ContentClient,
    pub router: Router,
    /// Our own username, for `/cmd@botname` addressing
    pub bot_username: String,
    /// Captured once in `main`, used by /uptime
    pub started_at: DateTime<Utc>,
    pub mute_duration: Duration,
}

impl AppState {
    pub fn new(
        platform: Arc<dyn ChatPlatform>,
        content: ContentClient,
        bot_username: String,
        started_at: DateTime<Utc>,
        mute_duration: Duration,
    ) -> Self {
        Self {
            platform,
            content,
            router: Router::new(),
            bot_username,
            started_at,
            mute_duration,
        }
    }
}

/// Route one command and send exactly one reply. Never fails: every error
/// turns into a chat message or, if even that is impossible, a log line.
pub async fn handle(state: &AppState, req: Request) {
    let name = req.command.name.as_str();
    let chat_id = req.actor.chat_id;

    if !req.command.is_addressed_to(&state.bot_username) {
        debug!("Ignoring /{} addressed to another bot", name);
        return;
    }

    let kind = match state.router.resolve(name) {
        Some(kind) => kind,
        None => {
            debug!("Ignoring unregistered command /{}", name);
            return;
        }
    };

    info!(
        "Command /{} from user {} in chat {}",
        name, req.actor.user_id, chat_id
    );

    let reply = match state.router.invoke(kind, state, &req).await {
        Ok(reply) => reply,
        Err(e) => {
            debug!("/{} in chat {} ended early: {}", name, chat_id, e);
            Reply::Text(e.reply_text())
        }
    };

    let fallback = match &reply {
        Reply::Poll { .. } => Some("poll"),
        Reply::Photo(_) => Some("photo"),
        Reply::Text(_) | Reply::Html(_) => None,
    };

    if let Err(e) = deliver(state.platform.as_ref(), chat_id, reply).await {
        error!("Failed to answer /{} in chat {}: {}", name, chat_id, e);
        if let Some(action) = fallback {
            let text = CommandError::platform(action, e).reply_text();
            if let Err(e) = state.platform.send_text(chat_id, &text).await {
                error!("Failed to send fallback reply in chat {}: {}", chat_id, e);
            }
        }
    }
}

async fn deliver(
    platform: &dyn ChatPlatform,
    chat_id: i64,
    reply: Reply,
) -> Result<(), PlatformError> {
    match reply {
        Reply::Text(text) => platform.send_text(chat_id, &text).await,
        Reply::Html(html) => platform.send_html(chat_id, &html).await,
        Reply::Photo(url) => platform.send_photo(chat_id, &url).await,
        Reply::Poll { question, options } => {
            platform.send_poll(chat_id, &question, &options, false).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::ContentClient;
    use crate::errors::NOT_ADMIN;
    use crate::moderation::default_mute;
    use crate::platform::testing::{Call, FakePlatform, Op};
    use crate::platform::{Actor, ChatUser, MemberStatus, RepliedMessage};
    use crate::router::Command;

    const CHAT: i64 = -1001;
    const ADMIN: u64 = 10;
    const MEMBER: u64 = 20;

    fn state(platform: FakePlatform) -> (AppState, Arc<FakePlatform>) {
        let platform = Arc::new(platform);
        let content = ContentClient::new(std::time::Duration::from_secs(1)).unwrap();
        let state = AppState::new(
            platform.clone(),
            content,
            "commandbot".to_string(),
            Utc::now(),
            default_mute(),
        );
        (state, platform)
    }

    fn user(id: u64, name: &str) -> ChatUser {
        ChatUser {
            id,
            first_name: name.to_string(),
            last_name: None,
            username: None,
        }
    }

    fn request(text: &str, from: u64, reply_author: Option<u64>) -> Request {
        Request {
            command: Command::parse(text).unwrap(),
            actor: Actor {
                user_id: from,
                chat_id: CHAT,
            },
            sender: user(from, "Sender"),
            chat_kind: "supergroup".to_string(),
            reply_to: reply_author.map(|id| RepliedMessage {
                message_id: 5,
                author: Some(user(id, "Target")),
            }),
        }
    }

    fn moderated() -> FakePlatform {
        FakePlatform::new()
            .with_member(ADMIN, MemberStatus::Administrator)
            .with_member(MEMBER, MemberStatus::Member)
    }

    #[tokio::test]
    async fn test_kick_end_to_end() {
        let (state, platform) = state(moderated());

        handle(&state, request("/kick", ADMIN, Some(MEMBER))).await;

        let calls = platform.calls();
        assert_eq!(
            calls,
            vec![
                Call::MemberStatus {
                    chat_id: CHAT,
                    user_id: ADMIN
                },
                Call::MemberStatus {
                    chat_id: CHAT,
                    user_id: MEMBER
                },
                Call::Ban {
                    chat_id: CHAT,
                    user_id: MEMBER
                },
                Call::Unban {
                    chat_id: CHAT,
                    user_id: MEMBER
                },
                Call::SendHtml {
                    chat_id: CHAT,
                    html: "User <a href=\"tg://user?id=20\">Target</a> kicked.".to_string()
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_kick_of_admin_replies_without_mutation() {
        let (state, platform) = state(moderated());

        handle(&state, request("/kick", ADMIN, Some(ADMIN))).await;

        assert!(platform.mutations().is_empty());
        assert_eq!(
            platform.calls().last(),
            Some(&Call::SendText {
                chat_id: CHAT,
                text: "I cannot kick an administrator.".to_string()
            })
        );
    }

    #[tokio::test]
    async fn test_non_admin_gets_fixed_message() {
        let (state, platform) = state(moderated());

        handle(&state, request("/mute", MEMBER, Some(ADMIN))).await;

        assert!(platform.mutations().is_empty());
        assert_eq!(
            platform.calls().last(),
            Some(&Call::SendText {
                chat_id: CHAT,
                text: NOT_ADMIN.to_string()
            })
        );
    }

    #[tokio::test]
    async fn test_missing_reply_answers_without_lookup() {
        let (state, platform) = state(moderated());

        handle(&state, request("/ban", ADMIN, None)).await;

        assert_eq!(
            platform.calls(),
            vec![Call::SendText {
                chat_id: CHAT,
                text: "Please reply to a user's message to ban them.".to_string()
            }]
        );
    }

    #[tokio::test]
    async fn test_command_for_another_bot_is_ignored() {
        let (state, platform) = state(moderated());

        handle(&state, request("/ban@SomeOtherModBot", ADMIN, Some(MEMBER))).await;

        assert!(platform.calls().is_empty());
    }

    #[tokio::test]
    async fn test_command_addressed_to_us_runs() {
        let (state, platform) = state(moderated());

        handle(&state, request("/ban@CommandBot", ADMIN, Some(MEMBER))).await;

        assert_eq!(
            platform.mutations(),
            vec![Call::Ban {
                chat_id: CHAT,
                user_id: MEMBER
            }]
        );
    }

    #[tokio::test]
    async fn test_unregistered_command_is_ignored() {
        let (state, platform) = state(moderated());
        handle(&state, request("/clear", ADMIN, None)).await;
        assert!(platform.calls().is_empty());
    }

    #[tokio::test]
    async fn test_poll_is_sent_non_anonymous() {
        let (state, platform) = state(FakePlatform::new());

        handle(
            &state,
            request(r#"/poll "Question?" "A" "B""#, MEMBER, None),
        )
        .await;

        assert_eq!(
            platform.calls(),
            vec![Call::SendPoll {
                chat_id: CHAT,
                question: "Question?".to_string(),
                options: vec!["A".to_string(), "B".to_string()],
                is_anonymous: false,
            }]
        );
    }

    #[tokio::test]
    async fn test_poll_usage_error() {
        let (state, platform) = state(FakePlatform::new());

        handle(&state, request(r#"/poll "Question?" "A""#, MEMBER, None)).await;

        assert_eq!(
            platform.calls(),
            vec![Call::SendText {
                chat_id: CHAT,
                text: crate::args::POLL_USAGE.to_string()
            }]
        );
    }

    #[tokio::test]
    async fn test_failed_poll_falls_back_to_text() {
        let (state, platform) = state(FakePlatform::new().failing_on(Op::SendPoll));

        handle(
            &state,
            request(r#"/poll "Question?" "A" "B""#, MEMBER, None),
        )
        .await;

        assert_eq!(
            platform.calls().last(),
            Some(&Call::SendText {
                chat_id: CHAT,
                text: "Could not create the poll. Please try again later.".to_string()
            })
        );
    }

    #[tokio::test]
    async fn test_failed_text_reply_is_only_logged() {
        let (state, platform) = state(FakePlatform::new().failing_on(Op::SendText));
        handle(&state, request("/ping", MEMBER, None)).await;
        assert_eq!(platform.calls().len(), 1);
    }
}
