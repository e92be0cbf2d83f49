use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use teloxide::prelude::*;
use teloxide::types::{
    ChatId, ChatMemberStatus, ChatPermissions, InputFile, InputPollOption, MessageId, ParseMode,
    UserId,
};
use tracing::{debug, info};

use crate::bot::{self, AppState};
use crate::platform::{Actor, ChatPlatform, ChatUser, MemberStatus, PlatformError, RepliedMessage};
use crate::router::{Command, Request};

/// Telegram caps a message at 4096 characters
const MAX_MESSAGE_LEN: usize = 4000;

/// Split long messages for Telegram's 4096 char limit
fn split_message(text: &str, max_len: usize) -> Vec<String> {
    if text.len() <= max_len {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut start = 0;

    while start < text.len() {
        let mut end = (start + max_len).min(text.len());
        // Walk back to a valid UTF-8 char boundary so slicing doesn't panic
        while end > start && !text.is_char_boundary(end) {
            end -= 1;
        }
        let actual_end = if end < text.len() {
            text[start..end]
                .rfind('\n')
                .or_else(|| text[start..end].rfind(' '))
                .map(|pos| start + pos + 1)
                .unwrap_or(end)
        } else {
            end
        };

        chunks.push(text[start..actual_end].to_string());
        start = actual_end;
    }

    chunks
}

/// [`ChatPlatform`] backed by the Telegram Bot API
#[derive(Clone)]
pub struct TelegramPlatform {
    bot: Bot,
}

impl TelegramPlatform {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

impl From<ChatMemberStatus> for MemberStatus {
    fn from(status: ChatMemberStatus) -> Self {
        match status {
            ChatMemberStatus::Owner => MemberStatus::Creator,
            ChatMemberStatus::Administrator => MemberStatus::Administrator,
            ChatMemberStatus::Member => MemberStatus::Member,
            ChatMemberStatus::Restricted => MemberStatus::Restricted,
            ChatMemberStatus::Left => MemberStatus::Left,
            ChatMemberStatus::Banned => MemberStatus::Banned,
        }
    }
}

#[async_trait]
impl ChatPlatform for TelegramPlatform {
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<(), PlatformError> {
        for chunk in split_message(text, MAX_MESSAGE_LEN) {
            self.bot.send_message(ChatId(chat_id), chunk).await?;
        }
        Ok(())
    }

    async fn send_html(&self, chat_id: i64, html: &str) -> Result<(), PlatformError> {
        self.bot
            .send_message(ChatId(chat_id), html)
            .parse_mode(ParseMode::Html)
            .await?;
        Ok(())
    }

    async fn send_photo(&self, chat_id: i64, url: &str) -> Result<(), PlatformError> {
        let url = url::Url::parse(url).map_err(|_| PlatformError::InvalidUrl(url.to_string()))?;
        self.bot
            .send_photo(ChatId(chat_id), InputFile::url(url))
            .await?;
        Ok(())
    }

    async fn send_poll(
        &self,
        chat_id: i64,
        question: &str,
        options: &[String],
        is_anonymous: bool,
    ) -> Result<(), PlatformError> {
        let options: Vec<InputPollOption> = options
            .iter()
            .cloned()
            .map(InputPollOption::new)
            .collect();
        self.bot
            .send_poll(ChatId(chat_id), question, options)
            .is_anonymous(is_anonymous)
            .await?;
        Ok(())
    }

    async fn member_status(
        &self,
        chat_id: i64,
        user_id: u64,
    ) -> Result<MemberStatus, PlatformError> {
        let member = self
            .bot
            .get_chat_member(ChatId(chat_id), UserId(user_id))
            .await?;
        Ok(member.kind.status().into())
    }

    async fn pin_message(&self, chat_id: i64, message_id: i32) -> Result<(), PlatformError> {
        self.bot
            .pin_chat_message(ChatId(chat_id), MessageId(message_id))
            .await?;
        Ok(())
    }

    async fn unpin_all(&self, chat_id: i64) -> Result<(), PlatformError> {
        self.bot.unpin_all_chat_messages(ChatId(chat_id)).await?;
        Ok(())
    }

    async fn ban_member(&self, chat_id: i64, user_id: u64) -> Result<(), PlatformError> {
        self.bot
            .ban_chat_member(ChatId(chat_id), UserId(user_id))
            .await?;
        Ok(())
    }

    async fn unban_member(&self, chat_id: i64, user_id: u64) -> Result<(), PlatformError> {
        self.bot
            .unban_chat_member(ChatId(chat_id), UserId(user_id))
            .await?;
        Ok(())
    }

    async fn restrict_until(
        &self,
        chat_id: i64,
        user_id: u64,
        until: DateTime<Utc>,
    ) -> Result<(), PlatformError> {
        let mut req =
            self.bot
                .restrict_chat_member(ChatId(chat_id), UserId(user_id), ChatPermissions::empty());
        req.until_date = Some(until);
        req.await?;
        Ok(())
    }
}

fn chat_user(user: &teloxide::types::User) -> ChatUser {
    ChatUser {
        id: user.id.0,
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
        username: user.username.clone(),
    }
}

fn chat_kind(msg: &Message) -> &'static str {
    if msg.chat.is_private() {
        "private"
    } else if msg.chat.is_supergroup() {
        "supergroup"
    } else if msg.chat.is_group() {
        "group"
    } else {
        "channel"
    }
}

/// Build a [`Request`] from an inbound message, `None` if it isn't a
/// command from a known user.
fn to_request(msg: &Message) -> Option<Request> {
    let sender = msg.from.as_ref()?;
    let command = Command::parse(msg.text()?)?;

    let reply_to = msg.reply_to_message().map(|reply| RepliedMessage {
        message_id: reply.id.0,
        author: reply.from.as_ref().map(chat_user),
    });

    Some(Request {
        command,
        actor: Actor {
            user_id: sender.id.0,
            chat_id: msg.chat.id.0,
        },
        sender: chat_user(sender),
        chat_kind: chat_kind(msg).to_string(),
        reply_to,
    })
}

/// Run the Telegram long-polling loop until interrupted
pub async fn run(state: Arc<AppState>, bot: Bot) -> Result<()> {
    info!("Starting Telegram platform...");

    let handler = Update::filter_message()
        .filter_map(|msg: Message| to_request(&msg))
        .endpoint(handle_request);

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .default_handler(|upd| async move {
            debug!("Ignoring update {:?}", upd.id);
        })
        .error_handler(LoggingErrorHandler::with_custom_text("telegram"))
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}

async fn handle_request(req: Request, state: Arc<AppState>) -> ResponseResult<()> {
    bot::handle(&state, req).await;
    Ok(())
}
