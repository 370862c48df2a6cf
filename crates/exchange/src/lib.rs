pub mod client;
pub mod error;
pub mod orders;
pub mod settings;

pub use client::{BinanceFuturesClient, ExchangeClient, OrderAck};
pub use error::ExchangeError;
pub use orders::{OrderBuilder, Sizing};
pub use settings::{SettingsStore, StaticSettingsStore, UserDefaults};
