mod bot;
mod config;
mod dispatcher;
mod platform;
mod replies;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::bot::AppState;
use crate::config::Config;
use crate::dispatcher::Dispatcher;
use crate::platform::line::LineClient;
use crate::platform::webhook::WebhookParser;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,linebot=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration; the file is optional when the environment provides everything
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.toml"));

    if config_path.exists() {
        info!("Loading configuration from: {}", config_path.display());
    } else {
        info!(
            "No config file at {}, reading settings from the environment",
            config_path.display()
        );
    }
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    let (secret_source, token_source) = config.credential_sources();
    info!("Configuration loaded successfully");
    info!("  Channel secret from: {}", secret_source);
    info!("  Channel access token from: {}", token_source);
    if !config.env_overrides.is_empty() {
        info!("  Environment overrides: {}", config.env_overrides.join(", "));
    }
    info!("  API base URL: {}", config.line.api_base_url);
    info!("  Listen address: {}", config.listen_addr());

    // One client for the whole process, shared by every delivery
    let client = Arc::new(LineClient::new(&config.line));
    let state = AppState::new(
        WebhookParser::new(config.line.channel_secret.clone()),
        Dispatcher::new(client),
    );

    info!("Bot is starting...");
    bot::run(state, &config.listen_addr()).await?;

    Ok(())
}
