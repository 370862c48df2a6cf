use std::sync::Arc;

use dotenvy::dotenv;
use tracing::{debug, info};

use common::logger;
use exchange::{BinanceFuturesClient, OrderBuilder, StaticSettingsStore};
use signals::SignalParser;

use crate::config::Config;
use crate::services::orchestrator::Orchestrator;
use crate::services::telegram_service::{ChatAllowList, TelegramService};

mod config;
mod services;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    logger::setup_logger();
    debug!("System starting up...");

    let config = Config::from_env()?;
    info!(
        "Defaults: {} {} at {}x, auto_execute={}",
        config.global_sizing.position_size,
        config.quote_asset,
        config.global_sizing.leverage,
        config.auto_execute
    );

    let client = Arc::new(BinanceFuturesClient::from_env());
    let settings = Arc::new(StaticSettingsStore::default());

    let orchestrator = Arc::new(Orchestrator::new(
        client,
        settings,
        OrderBuilder::new(config.global_sizing),
        SignalParser::new(config.quote_asset.clone()),
        config.auto_execute,
    ));

    TelegramService::new(orchestrator, ChatAllowList::new(config.allowed_chats))
        .run()
        .await;
    Ok(())
}
