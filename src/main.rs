mod args;
mod auth;
mod bot;
mod calc;
mod config;
mod content;
mod errors;
mod games;
mod moderation;
mod platform;
mod router;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use teloxide::requests::Requester;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::bot::AppState;
use crate::config::Config;
use crate::content::ContentClient;
use crate::platform::telegram::{self, TelegramPlatform};

#[tokio::main]
async fn main() -> Result<()> {
    let started_at = Utc::now();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,commandbot=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config_path = std::env::var("COMMANDBOT_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    info!("Loading configuration from: {}", config_path.display());
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    info!("  Request timeout: {:?}", config.request_timeout());
    info!("  Mute duration: {} minutes", config.moderation.mute_minutes);

    let token = config.resolve_token()?;
    let client = teloxide::net::default_reqwest_settings()
        .timeout(config.telegram_timeout())
        .build()
        .context("Failed to build Telegram HTTP client")?;
    let bot = teloxide::Bot::with_client(token, client);

    let me = bot.get_me().await.context("Failed to fetch bot identity")?;
    let bot_username = me.username().to_string();
    info!("Logged in as @{}", bot_username);

    let content = ContentClient::new(config.request_timeout())?;
    let platform = Arc::new(TelegramPlatform::new(bot.clone()));
    let state = Arc::new(AppState::new(
        platform,
        content,
        bot_username,
        started_at,
        config.mute_duration(),
    ));

    info!("Registered {} commands", state.router.len());
    info!("Bot is starting...");
    telegram::run(state, bot).await?;

    Ok(())
}
