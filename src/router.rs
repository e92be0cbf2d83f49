use std::collections::HashMap;

use chrono::Utc;
use tracing::error;

use crate::args;
use crate::bot::AppState;
use crate::calc;
use crate::content::{self, WikiLookup};
use crate::errors::CommandError;
use crate::games;
use crate::moderation::{ModerationAction, ModerationKind, Sequencer};
use crate::platform::{Actor, ChatUser, RepliedMessage};

/// A command as typed by the user: `/name@bot arg1 arg2`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub name: String,
    pub args: Vec<String>,
    /// Bot named by an `@botname` suffix, if any
    pub addressee: Option<String>,
}

impl Command {
    /// `None` for text that isn't a command. The name is lowercased and
    /// any `@botname` suffix split off into `addressee`.
    pub fn parse(text: &str) -> Option<Self> {
        let mut tokens = text.split_whitespace();
        let head = tokens.next()?.strip_prefix('/')?;
        let (name, addressee) = match head.split_once('@') {
            Some((name, bot)) => (name, Some(bot.to_string())),
            None => (head, None),
        };
        if name.is_empty() {
            return None;
        }
        Some(Command {
            name: name.to_lowercase(),
            args: tokens.map(str::to_string).collect(),
            addressee,
        })
    }

    /// False when the command was sent to a different bot. Usernames
    /// compare case-insensitively.
    pub fn is_addressed_to(&self, bot_username: &str) -> bool {
        self.addressee
            .as_deref()
            .map_or(true, |bot| bot.eq_ignore_ascii_case(bot_username))
    }
}

/// Everything the handlers know about one inbound command message.
#[derive(Debug, Clone)]
pub struct Request {
    pub command: Command,
    pub actor: Actor,
    pub sender: ChatUser,
    /// "private", "group", "supergroup" or "channel"
    pub chat_kind: String,
    pub reply_to: Option<RepliedMessage>,
}

/// What a handler wants sent back to the chat
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Text(String),
    Html(String),
    Photo(String),
    /// Posted to the chat as a non-anonymous poll
    Poll {
        question: String,
        options: Vec<String>,
    },
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Reply::Text(text.into())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    Start,
    Help,
    Ping,
    Uptime,
    Info,
    Joke,
    Roll,
    Flip,
    Rps,
    EightBall,
    Cat,
    Dog,
    Quote,
    Fact,
    Weather,
    Crypto,
    Qr,
    Shorten,
    Translate,
    Calc,
    Wiki,
    Time,
    Poll,
    Define,
    Moderation(ModerationKind),
}

pub struct CommandSpec {
    pub name: &'static str,
    pub usage: &'static str,
    pub description: &'static str,
    pub kind: CommandKind,
}

const fn spec(
    name: &'static str,
    usage: &'static str,
    description: &'static str,
    kind: CommandKind,
) -> CommandSpec {
    CommandSpec {
        name,
        usage,
        description,
        kind,
    }
}

/// Every command the bot answers to, in `/help` order
pub const COMMANDS: &[CommandSpec] = &[
    spec("start", "", "Welcomes the user.", CommandKind::Start),
    spec("help", "", "Lists all available commands.", CommandKind::Help),
    spec("ping", "", "Checks if the bot is responsive.", CommandKind::Ping),
    spec("uptime", "", "Shows how long the bot has been running.", CommandKind::Uptime),
    spec("info", "", "Gets information about the user or chat.", CommandKind::Info),
    spec("joke", "", "Tells a random joke.", CommandKind::Joke),
    spec("roll", "<NdS>", "Rolls dice (e.g., /roll 2d6).", CommandKind::Roll),
    spec("flip", "", "Flips a coin.", CommandKind::Flip),
    spec("rps", "<rock|paper|scissors>", "Play Rock, Paper, Scissors.", CommandKind::Rps),
    spec("8ball", "<question>", "Ask the magic 8-ball a question.", CommandKind::EightBall),
    spec("cat", "", "Sends a random picture of a cat.", CommandKind::Cat),
    spec("dog", "", "Sends a random picture of a dog.", CommandKind::Dog),
    spec("quote", "", "Provides an inspirational quote.", CommandKind::Quote),
    spec("fact", "", "Get a random interesting fact.", CommandKind::Fact),
    spec("weather", "<city>", "Gets the current weather.", CommandKind::Weather),
    spec("crypto", "<coin>", "Gets the latest price of a cryptocurrency (e.g., Bitcoin).", CommandKind::Crypto),
    spec("qr", "<text>", "Generates a QR code.", CommandKind::Qr),
    spec("shorten", "<url>", "Shortens a long URL.", CommandKind::Shorten),
    spec("translate", "<lang> <text>", "Translates text to a specified language.", CommandKind::Translate),
    spec("calc", "<expression>", "A simple calculator.", CommandKind::Calc),
    spec("wiki", "<query>", "Searches Wikipedia.", CommandKind::Wiki),
    spec("time", "<city>", "Gets the current time in a city.", CommandKind::Time),
    spec("poll", "\"Question\" \"Option 1\" \"Option 2\" ...", "Creates a poll in the chat.", CommandKind::Poll),
    spec("define", "<word>", "Gets the definition of a word.", CommandKind::Define),
    spec("pin", "", "Pins the message it replies to (admins only).", CommandKind::Moderation(ModerationKind::Pin)),
    spec("unpin", "", "Unpins all pinned messages (admins only).", CommandKind::Moderation(ModerationKind::Unpin)),
    spec("kick", "", "Kicks the user you reply to from the group (admins only).", CommandKind::Moderation(ModerationKind::Kick)),
    spec("ban", "", "Bans the user you reply to from the group (admins only).", CommandKind::Moderation(ModerationKind::Ban)),
    spec("mute", "", "Mutes the user you reply to for an hour (admins only).", CommandKind::Moderation(ModerationKind::Mute)),
];

pub fn help_text() -> String {
    let mut text = String::from("Available commands:\n");
    for command in COMMANDS {
        if command.usage.is_empty() {
            text.push_str(&format!("/{} - {}\n", command.name, command.description));
        } else {
            text.push_str(&format!(
                "/{} {} - {}\n",
                command.name, command.usage, command.description
            ));
        }
    }
    text
}

/// Name -> handler lookup, built once at startup and never changed.
pub struct Router {
    table: HashMap<&'static str, CommandKind>,
}

impl Router {
    pub fn new() -> Self {
        let table = COMMANDS.iter().map(|c| (c.name, c.kind)).collect();
        Self { table }
    }

    pub fn resolve(&self, name: &str) -> Option<CommandKind> {
        self.table.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Run the handler for `kind`. No validation happens here; each
    /// handler checks its own arguments.
    pub async fn invoke(
        &self,
        kind: CommandKind,
        state: &AppState,
        req: &Request,
    ) -> Result<Reply, CommandError> {
        let args = &req.command.args;

        match kind {
            CommandKind::Start => Ok(Reply::text(
                "Hi! I am a feature-rich Telegram bot. Send /help to see what I can do.",
            )),
            CommandKind::Help => Ok(Reply::Text(help_text())),
            CommandKind::Ping => Ok(Reply::text("Pong!")),
            CommandKind::Uptime => {
                let elapsed = Utc::now() - state.started_at;
                Ok(Reply::Text(format!("Uptime: {}", format_uptime(elapsed))))
            }
            CommandKind::Info => Ok(Reply::Text(info_text(req))),

            // The thread-local generator must not be held across an await
            CommandKind::Roll => {
                let text = games::roll(args, &mut rand::thread_rng())?;
                Ok(Reply::Text(text))
            }
            CommandKind::Flip => {
                let text = games::flip(&mut rand::thread_rng());
                Ok(Reply::Text(text))
            }
            CommandKind::Rps => {
                let text = games::rps(args, &mut rand::thread_rng())?;
                Ok(Reply::Text(text))
            }
            CommandKind::EightBall => {
                let answer = games::eight_ball(args, &mut rand::thread_rng())?;
                Ok(Reply::text(answer))
            }

            CommandKind::Joke => {
                let joke = state
                    .content
                    .joke()
                    .await
                    .map_err(|e| content_failed("joke", e))?;
                Ok(Reply::Text(joke))
            }
            CommandKind::Cat => {
                let url = state
                    .content
                    .cat_image_url()
                    .await
                    .map_err(|e| content_failed("cat picture", e))?;
                Ok(Reply::Photo(url))
            }
            CommandKind::Dog => {
                let url = state
                    .content
                    .dog_image_url()
                    .await
                    .map_err(|e| content_failed("dog picture", e))?;
                Ok(Reply::Photo(url))
            }
            CommandKind::Quote => {
                let quote = state
                    .content
                    .quote()
                    .await
                    .map_err(|e| content_failed("quote", e))?;
                Ok(Reply::Text(format!("\"{}\" - {}", quote.content, quote.author)))
            }
            CommandKind::Fact => {
                let fact = state
                    .content
                    .fact()
                    .await
                    .map_err(|e| content_failed("fact", e))?;
                Ok(Reply::Text(fact))
            }
            CommandKind::Crypto => {
                let coin = args::require_first(
                    args,
                    "Please provide a cryptocurrency name (e.g., bitcoin).",
                )?
                .to_lowercase();
                let price = state
                    .content
                    .crypto_price(&coin)
                    .await
                    .map_err(|e| content_failed("crypto price", e))?;
                Ok(Reply::Text(match price {
                    Some(price) => format!(
                        "The current price of {} is ${} USD.",
                        content::capitalize(&coin),
                        content::format_usd(price)
                    ),
                    None => format!("Could not find the price for '{}'.", coin),
                }))
            }
            CommandKind::Define => {
                let word = args::require_first(
                    args,
                    "Please provide a word to define (e.g., /define hello).",
                )?;
                let definition = state
                    .content
                    .definition(word)
                    .await
                    .map_err(|e| content_failed("definition", e))?;
                Ok(match definition {
                    Some(definition) => Reply::Html(format!(
                        "<b>{}</b>: {}",
                        teloxide::utils::html::escape(&content::capitalize(word)),
                        teloxide::utils::html::escape(&definition)
                    )),
                    None => Reply::Text(format!("Could not find a definition for '{}'.", word)),
                })
            }
            CommandKind::Wiki => {
                let query = args::require_text(args, "Please provide a search query.")?;
                let lookup = state
                    .content
                    .wiki_summary(&query)
                    .await
                    .map_err(|e| content_failed("Wikipedia summary", e))?;
                Ok(match lookup {
                    WikiLookup::Found {
                        title,
                        summary,
                        url,
                    } => Reply::Html(format!(
                        "<b>{}</b>\n{}...\n\n{}",
                        teloxide::utils::html::escape(&title),
                        teloxide::utils::html::escape(&summary),
                        url
                    )),
                    WikiLookup::Ambiguous { title, url } => {
                        Reply::Text(ambiguous_wiki_text(&title, &url))
                    }
                    WikiLookup::NotFound => Reply::Text(format!(
                        "Sorry, I couldn't find a Wikipedia page for '{}'.",
                        query
                    )),
                })
            }
            CommandKind::Qr => {
                let text = args::require_text(args, "Please provide text to encode in the QR code.")?;
                let url = content::qr_image_url(&text).map_err(|e| content_failed("QR code", e))?;
                Ok(Reply::Photo(url))
            }

            CommandKind::Weather => {
                let city = args::require_text(args, "Please provide a city name.")?;
                Ok(Reply::Text(format!(
                    "I can't get the weather for {} yet, but I'm learning!",
                    city
                )))
            }
            CommandKind::Time => {
                let city = args::require_text(args, "Please provide a city name.")?;
                Ok(Reply::Text(format!(
                    "I can't get the time for {} yet, but I'm learning!",
                    city
                )))
            }
            CommandKind::Shorten => {
                let url = args::require_first(args, "Please provide a URL to shorten.")?;
                Ok(Reply::Text(format!(
                    "I can't shorten {} yet, but I'm learning!",
                    url
                )))
            }
            CommandKind::Translate => {
                if args.len() < 2 {
                    return Err(CommandError::validation(
                        "Usage: /translate <lang_code> <text>",
                    ));
                }
                Ok(Reply::Text(format!(
                    "I can't translate to {} yet, but I'm learning!",
                    args[0]
                )))
            }
            CommandKind::Calc => {
                if args.is_empty() {
                    return Err(CommandError::validation(
                        "Please provide a mathematical expression.",
                    ));
                }
                let result = calc::evaluate(&args.concat())?;
                Ok(Reply::Text(format!("Result: {}", result)))
            }

            CommandKind::Poll => {
                let poll = args::parse_poll(args)?;
                Ok(Reply::Poll {
                    question: poll.question,
                    options: poll.options,
                })
            }

            CommandKind::Moderation(kind) => {
                let action = ModerationAction::resolve(
                    kind,
                    req.actor,
                    req.reply_to.as_ref(),
                    state.mute_duration,
                )?;
                Sequencer::new(state.platform.as_ref())
                    .execute(&action, Utc::now())
                    .await
            }
        }
    }
}

fn content_failed(what: &'static str, e: content::ContentError) -> CommandError {
    error!("Error fetching {}: {}", what, e);
    CommandError::content(what, e)
}

fn ambiguous_wiki_text(title: &str, url: &str) -> String {
    let mut text = format!(
        "'{}' is ambiguous. Please try a more specific search.",
        title
    );
    if !url.is_empty() {
        text.push_str(&format!("\nPossible pages: {}", url));
    }
    text
}

fn info_text(req: &Request) -> String {
    let sender = &req.sender;
    format!(
        "User ID: {}\nFirst Name: {}\nLast Name: {}\nUsername: @{}\nChat ID: {}\nChat Type: {}",
        sender.id,
        sender.first_name,
        sender.last_name.as_deref().unwrap_or("N/A"),
        sender.username.as_deref().unwrap_or("N/A"),
        req.actor.chat_id,
        req.chat_kind
    )
}

/// `3:04:05`, or `2 days, 3:04:05` past the first day
pub fn format_uptime(elapsed: chrono::Duration) -> String {
    let total = elapsed.num_seconds().max(0);
    let days = total / 86_400;
    let hours = (total % 86_400) / 3_600;
    let minutes = (total % 3_600) / 60;
    let seconds = total % 60;

    let clock = format!("{}:{:02}:{:02}", hours, minutes, seconds);
    match days {
        0 => clock,
        1 => format!("1 day, {}", clock),
        d => format!("{} days, {}", d, clock),
    }
}
