//! In-memory chat platform that records every outbound call.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::{ChatPlatform, MemberStatus, PlatformError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    SendText,
    SendHtml,
    SendPhoto,
    SendPoll,
    MemberStatus,
    Pin,
    UnpinAll,
    Ban,
    Unban,
    Restrict,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    SendText { chat_id: i64, text: String },
    SendHtml { chat_id: i64, html: String },
    SendPhoto { chat_id: i64, url: String },
    SendPoll {
        chat_id: i64,
        question: String,
        options: Vec<String>,
        is_anonymous: bool,
    },
    MemberStatus { chat_id: i64, user_id: u64 },
    Pin { chat_id: i64, message_id: i32 },
    UnpinAll { chat_id: i64 },
    Ban { chat_id: i64, user_id: u64 },
    Unban { chat_id: i64, user_id: u64 },
    Restrict {
        chat_id: i64,
        user_id: u64,
        until: DateTime<Utc>,
    },
}

impl Call {
    /// Calls that change chat state, as opposed to lookups and replies
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            Call::Pin { .. }
                | Call::UnpinAll { .. }
                | Call::Ban { .. }
                | Call::Unban { .. }
                | Call::Restrict { .. }
        )
    }
}

/// Users without a configured status make `member_status` fail, which is
/// how lookup errors are simulated.
#[derive(Default)]
pub struct FakePlatform {
    calls: Mutex<Vec<Call>>,
    statuses: Mutex<HashMap<u64, MemberStatus>>,
    failing: Mutex<HashSet<Op>>,
}

impl FakePlatform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_member(self, user_id: u64, status: MemberStatus) -> Self {
        self.statuses.lock().unwrap().insert(user_id, status);
        self
    }

    pub fn failing_on(self, op: Op) -> Self {
        self.failing.lock().unwrap().insert(op);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn mutations(&self) -> Vec<Call> {
        self.calls().into_iter().filter(Call::is_mutation).collect()
    }

    fn record(&self, op: Op, call: Call) -> Result<(), PlatformError> {
        self.calls.lock().unwrap().push(call);
        if self.failing.lock().unwrap().contains(&op) {
            return Err(PlatformError::Other(format!("simulated {:?} failure", op)));
        }
        Ok(())
    }
}

#[async_trait]
impl ChatPlatform for FakePlatform {
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<(), PlatformError> {
        self.record(
            Op::SendText,
            Call::SendText {
                chat_id,
                text: text.to_string(),
            },
        )
    }

    async fn send_html(&self, chat_id: i64, html: &str) -> Result<(), PlatformError> {
        self.record(
            Op::SendHtml,
            Call::SendHtml {
                chat_id,
                html: html.to_string(),
            },
        )
    }

    async fn send_photo(&self, chat_id: i64, url: &str) -> Result<(), PlatformError> {
        self.record(
            Op::SendPhoto,
            Call::SendPhoto {
                chat_id,
                url: url.to_string(),
            },
        )
    }

    async fn send_poll(
        &self,
        chat_id: i64,
        question: &str,
        options: &[String],
        is_anonymous: bool,
    ) -> Result<(), PlatformError> {
        self.record(
            Op::SendPoll,
            Call::SendPoll {
                chat_id,
                question: question.to_string(),
                options: options.to_vec(),
                is_anonymous,
            },
        )
    }

    async fn member_status(
        &self,
        chat_id: i64,
        user_id: u64,
    ) -> Result<MemberStatus, PlatformError> {
        self.record(Op::MemberStatus, Call::MemberStatus { chat_id, user_id })?;
        self.statuses
            .lock()
            .unwrap()
            .get(&user_id)
            .copied()
            .ok_or_else(|| PlatformError::Other(format!("user {} not found", user_id)))
    }

    async fn pin_message(&self, chat_id: i64, message_id: i32) -> Result<(), PlatformError> {
        self.record(
            Op::Pin,
            Call::Pin {
                chat_id,
                message_id,
            },
        )
    }

    async fn unpin_all(&self, chat_id: i64) -> Result<(), PlatformError> {
        self.record(Op::UnpinAll, Call::UnpinAll { chat_id })
    }

    async fn ban_member(&self, chat_id: i64, user_id: u64) -> Result<(), PlatformError> {
        self.record(Op::Ban, Call::Ban { chat_id, user_id })
    }

    async fn unban_member(&self, chat_id: i64, user_id: u64) -> Result<(), PlatformError> {
        self.record(Op::Unban, Call::Unban { chat_id, user_id })
    }

    async fn restrict_until(
        &self,
        chat_id: i64,
        user_id: u64,
        until: DateTime<Utc>,
    ) -> Result<(), PlatformError> {
        self.record(
            Op::Restrict,
            Call::Restrict {
                chat_id,
                user_id,
                until,
            },
        )
    }
}
