use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

/// Environment variables honoured on top of the config file.
const ENV_CHANNEL_SECRET: &str = "ChannelSecret";
const ENV_CHANNEL_ACCESS_TOKEN: &str = "ChannelAccessToken";
const ENV_PORT: &str = "PORT";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub line: LineConfig,
    #[serde(default)]
    pub server: ServerConfig,
    /// Environment variables that overrode file values, in application order.
    #[serde(skip)]
    pub env_overrides: Vec<&'static str>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LineConfig {
    /// Used to verify the `X-Line-Signature` of inbound webhooks.
    #[serde(default)]
    pub channel_secret: String,
    /// Bearer token for outbound Messaging API calls.
    #[serde(default)]
    pub channel_access_token: String,
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
}

impl Default for LineConfig {
    fn default() -> Self {
        Self {
            channel_secret: String::new(),
            channel_access_token: String::new(),
            api_base_url: default_api_base_url(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_api_base_url() -> String {
    "https://api.line.me".to_string()
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Config {
    /// Address the webhook server binds to.
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Load the config file (if present), then apply environment overrides.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            Self::parse(&content)?
        } else {
            Config::default()
        };

        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;

        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse config file")
    }

    /// Overlay values from the environment. `lookup` is `std::env::var` in
    /// production and a map in tests.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(secret) = lookup(ENV_CHANNEL_SECRET).filter(|s| !s.is_empty()) {
            self.line.channel_secret = secret;
            self.env_overrides.push(ENV_CHANNEL_SECRET);
        }
        if let Some(token) = lookup(ENV_CHANNEL_ACCESS_TOKEN).filter(|s| !s.is_empty()) {
            self.line.channel_access_token = token;
            self.env_overrides.push(ENV_CHANNEL_ACCESS_TOKEN);
        }
        if let Some(port) = lookup(ENV_PORT).filter(|s| !s.is_empty()) {
            self.server.port = port
                .trim()
                .parse()
                .with_context(|| format!("Invalid {} value: {}", ENV_PORT, port))?;
            self.env_overrides.push(ENV_PORT);
        }
        Ok(())
    }

    /// Where the channel credentials were taken from, for the startup log.
    pub fn credential_sources(&self) -> (&'static str, &'static str) {
        let source = |var: &'static str| {
            if self.env_overrides.contains(&var) {
                "environment"
            } else {
                "config file"
            }
        };
        (source(ENV_CHANNEL_SECRET), source(ENV_CHANNEL_ACCESS_TOKEN))
    }

    pub fn validate(&self) -> Result<()> {
        if self.line.channel_secret.is_empty() {
            anyhow::bail!(
                "LINE channel secret is not set (line.channel_secret or {})",
                ENV_CHANNEL_SECRET
            );
        }
        if self.line.channel_access_token.is_empty() {
            anyhow::bail!(
                "LINE channel access token is not set (line.channel_access_token or {})",
                ENV_CHANNEL_ACCESS_TOKEN
            );
        }
        Ok(())
    }
}
