use std::env;

use exchange::Sizing;

/// Process configuration, read once at startup from the environment
/// (`.env` is loaded by main before this runs).
#[derive(Debug, Clone)]
pub struct Config {
    pub quote_asset: String,
    pub global_sizing: Sizing,
    pub auto_execute: bool,
    /// Empty means every chat is allowed.
    pub allowed_chats: Vec<i64>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let quote_asset = env::var("QUOTE_ASSET").unwrap_or_else(|_| "USDT".to_string());

        let position_size = match env::var("DEFAULT_POSITION_SIZE") {
            Ok(v) => v.parse()?,
            Err(_) => 100.0,
        };
        let leverage = match env::var("DEFAULT_LEVERAGE") {
            Ok(v) => v.parse()?,
            Err(_) => 1,
        };

        let auto_execute = env::var("AUTO_EXECUTE")
            .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        let allowed_chats = match env::var("ALLOWED_CHAT_IDS") {
            Ok(list) => list
                .split(',')
                .filter(|s| !s.trim().is_empty())
                .map(|s| s.trim().parse())
                .collect::<Result<Vec<i64>, _>>()?,
            Err(_) => Vec::new(),
        };

        Ok(Self {
            quote_asset,
            global_sizing: Sizing {
                position_size,
                leverage,
            },
            auto_execute,
            allowed_chats,
        })
    }
}
