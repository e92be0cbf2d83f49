use crate::calc::CalcError;
use crate::content::ContentError;
use crate::moderation::ModerationKind;
use crate::platform::PlatformError;

pub const NOT_ADMIN: &str = "You must be an administrator to use this command.";

/// Everything that can stop a command short of a normal reply.
///
/// None of these escape a handler: each one becomes exactly one chat reply
/// through [`CommandError::reply_text`].
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    /// Bad or missing arguments; carries the usage text shown to the user
    #[error("invalid arguments: {0}")]
    Validation(String),

    #[error("actor is not an administrator")]
    Unauthorized,

    #[error("target of {0} is an administrator")]
    TargetProtected(ModerationKind),

    #[error("{0} needs a replied-to message")]
    MissingReply(ModerationKind),

    #[error("platform call '{action}' failed: {source}")]
    Platform {
        action: &'static str,
        #[source]
        source: PlatformError,
    },

    #[error("could not fetch {what}: {source}")]
    Content {
        what: &'static str,
        #[source]
        source: ContentError,
    },

    #[error(transparent)]
    Calc(#[from] CalcError),
}

impl CommandError {
    pub fn validation(message: impl Into<String>) -> Self {
        CommandError::Validation(message.into())
    }

    pub fn platform(action: &'static str, source: PlatformError) -> Self {
        CommandError::Platform { action, source }
    }

    pub fn content(what: &'static str, source: ContentError) -> Self {
        CommandError::Content { what, source }
    }

    /// The single chat reply for this failure. Never includes the text of
    /// an underlying transport or HTTP error.
    pub fn reply_text(&self) -> String {
        match self {
            CommandError::Validation(usage) => usage.clone(),
            CommandError::Unauthorized => NOT_ADMIN.to_string(),
            CommandError::TargetProtected(kind) => {
                format!("I cannot {} an administrator.", kind.verb())
            }
            CommandError::MissingReply(ModerationKind::Pin) => {
                "Please reply to a message to pin it.".to_string()
            }
            CommandError::MissingReply(kind) => {
                format!("Please reply to a user's message to {} them.", kind.verb())
            }
            CommandError::Platform { action, .. } => platform_failure_text(action).to_string(),
            CommandError::Content { what, .. } => {
                format!("Sorry, I couldn't fetch a {} right now.", what)
            }
            CommandError::Calc(e) => format!("Error: {}", e),
        }
    }
}

fn platform_failure_text(action: &str) -> &'static str {
    match action {
        "pin" => "Could not pin the message. Make sure I have pin permissions.",
        "unpin" => "Could not unpin messages. Make sure I have unpin permissions.",
        "kick" => "Could not kick the user. Make sure I have kick permissions.",
        "ban" => "Could not ban the user. Make sure I have ban permissions.",
        "mute" => "Could not mute the user. Make sure I have restrict permissions.",
        "poll" => "Could not create the poll. Please try again later.",
        _ => "Something went wrong while talking to Telegram. Please try again later.",
    }
}
