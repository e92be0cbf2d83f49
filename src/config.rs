use std::io::{self, BufRead, Write};
use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use crate::moderation::DEFAULT_MUTE_MINUTES;

pub const TOKEN_ENV: &str = "TELEGRAM_BOT_TOKEN";

/// Telegram holds a long-poll `getUpdates` open for up to 10 s
const LONG_POLL_MARGIN: Duration = Duration::from_secs(10);

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub moderation: ModerationConfig,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct TelegramConfig {
    /// Used when TELEGRAM_BOT_TOKEN is not set
    #[serde(default)]
    pub bot_token: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ModerationConfig {
    #[serde(default = "default_mute_minutes")]
    pub mute_minutes: i64,
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_mute_minutes() -> i64 {
    DEFAULT_MUTE_MINUTES
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl Default for ModerationConfig {
    fn default() -> Self {
        Self {
            mute_minutes: default_mute_minutes(),
        }
    }
}

impl Config {
    /// Load the config file. A missing file is not an error: every
    /// setting has a default.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        if config.http.request_timeout_secs == 0 {
            bail!("[http] request_timeout_secs must be greater than zero");
        }
        if config.moderation.mute_minutes <= 0 {
            bail!("[moderation] mute_minutes must be greater than zero");
        }
        Ok(config)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.http.request_timeout_secs)
    }

    /// Timeout for Bot API calls: the request timeout plus room for a
    /// long poll to come back empty.
    pub fn telegram_timeout(&self) -> Duration {
        self.request_timeout() + LONG_POLL_MARGIN
    }

    pub fn mute_duration(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.moderation.mute_minutes)
    }

    /// Bot token from the environment, then the config file, then an
    /// interactive prompt.
    pub fn resolve_token(&self) -> Result<String> {
        if let Some(token) = pick_token(
            std::env::var(TOKEN_ENV).ok(),
            self.telegram.bot_token.clone(),
        ) {
            return Ok(token);
        }

        print!("Please enter your Telegram bot token: ");
        io::stdout().flush().context("Failed to write prompt")?;
        let mut line = String::new();
        io::stdin()
            .lock()
            .read_line(&mut line)
            .context("Failed to read bot token from stdin")?;

        match pick_token(Some(line), None) {
            Some(token) => Ok(token),
            None => bail!("No bot token provided"),
        }
    }
}

/// First non-blank candidate, trimmed
fn pick_token(env: Option<String>, file: Option<String>) -> Option<String> {
    [env, file]
        .into_iter()
        .flatten()
        .map(|t| t.trim().to_string())
        .find(|t| !t.is_empty())
}
