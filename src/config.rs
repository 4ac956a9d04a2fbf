use crate::error::{AppError, Result};

pub const GATEWAY_URL: &str = "wss://gateway.discord.gg/?v=10&encoding=json";
pub const API_BASE_URL: &str = "https://discord.com/api/v10";

/// Command that triggers a slate run, e.g. `!slate <pasted rows>` or
/// `!slate` with an attached file.
pub const DEFAULT_COMMAND_PREFIX: &str = "!slate";

/// Fallback heartbeat period if the gateway hello frame is missing one.
pub const HEARTBEAT_FALLBACK_SECS: u64 = 41;

/// Gateway intents: guilds, guild messages, message content.
pub const GATEWAY_INTENTS: u64 = (1 << 0) | (1 << 9) | (1 << 15);

/// Reconnect backoff values in milliseconds.
pub const RECONNECT_BACKOFF_MS: &[u64] = &[500, 1_000, 2_000, 5_000, 10_000];

/// Channel capacity for internal message routing.
pub const CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone)]
pub struct Config {
    /// Bot credential (BOT_TOKEN). The only required setting.
    pub bot_token: String,
    pub gateway_url: String,
    pub api_base_url: String,
    pub command_prefix: String,
    /// Channel ids allowed to trigger slate runs (ALLOWED_CHANNELS,
    /// comma-separated). Empty = any channel.
    pub allowed_channels: Vec<String>,
    /// Role ids allowed to trigger slate runs (ALLOWED_ROLES,
    /// comma-separated). Empty = any author.
    pub allowed_roles: Vec<String>,
    pub log_level: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let bot_token = std::env::var("BOT_TOKEN")
            .map_err(|_| AppError::Config("BOT_TOKEN must be set".to_string()))?;
        if bot_token.trim().is_empty() {
            return Err(AppError::Config("BOT_TOKEN must not be empty".to_string()));
        }

        Ok(Self {
            bot_token,
            gateway_url: std::env::var("GATEWAY_URL").unwrap_or_else(|_| GATEWAY_URL.to_string()),
            api_base_url: std::env::var("API_BASE_URL")
                .unwrap_or_else(|_| API_BASE_URL.to_string()),
            command_prefix: std::env::var("COMMAND_PREFIX")
                .unwrap_or_else(|_| DEFAULT_COMMAND_PREFIX.to_string()),
            allowed_channels: id_list(std::env::var("ALLOWED_CHANNELS").unwrap_or_default()),
            allowed_roles: id_list(std::env::var("ALLOWED_ROLES").unwrap_or_default()),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        })
    }

    /// Authorization gate, applied before the core pipeline runs.
    /// An empty allow-list means that dimension is unrestricted.
    pub fn permits(&self, channel_id: &str, role_ids: &[String]) -> bool {
        let channel_ok = self.allowed_channels.is_empty()
            || self.allowed_channels.iter().any(|c| c == channel_id);
        let role_ok = self.allowed_roles.is_empty()
            || role_ids.iter().any(|r| self.allowed_roles.contains(r));
        channel_ok && role_ok
    }
}

fn id_list(raw: String) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
