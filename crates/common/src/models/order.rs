use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::signal::TradeSignal;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderKind {
    Limit,
    Market,
}

impl OrderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderKind::Limit => "LIMIT",
            OrderKind::Market => "MARKET",
        }
    }
}

/// Exchange-ready order parameters. Built fresh per execution attempt and
/// discarded after submission.
#[derive(Debug, Clone, Serialize)]
pub struct OrderRequest {
    pub symbol: String,
    /// "BUY" or "SELL".
    pub side: String,
    #[serde(rename = "type")]
    pub kind: OrderKind,
    /// Base-asset quantity, already rounded to 8 fractional digits.
    pub quantity: String,
    /// Limit price. None for market orders.
    pub price: Option<f64>,
    /// Only the nearest target is ever sent to the exchange.
    #[serde(rename = "takeProfit")]
    pub take_profit: f64,
    #[serde(rename = "stopLoss")]
    pub stop_loss: f64,
    /// Trigger price source for TP/SL. Fixed to the exchange mark price.
    #[serde(rename = "workingType")]
    pub working_type: String,
    /// "GTC" for limit entries, absent for market entries.
    #[serde(rename = "timeInForce")]
    pub time_in_force: Option<String>,
    /// Idempotency token, unique per attempt.
    #[serde(rename = "newClientOrderId")]
    pub client_order_id: String,
}

/// Outcome of one execution attempt, returned to the UI layer for rendering.
#[derive(Debug, Clone)]
pub struct TradeResult {
    pub success: bool,
    pub order_id: Option<u64>,
    pub message: String,
    pub signal: TradeSignal,
    pub executed_at: DateTime<Utc>,
}

impl TradeResult {
    pub fn filled(order_id: u64, signal: TradeSignal) -> Self {
        Self {
            success: true,
            order_id: Some(order_id),
            message: format!("Order accepted (id {order_id})"),
            signal,
            executed_at: Utc::now(),
        }
    }

    pub fn failed(message: impl Into<String>, signal: TradeSignal) -> Self {
        Self {
            success: false,
            order_id: None,
            message: message.into(),
            signal,
            executed_at: Utc::now(),
        }
    }
}
