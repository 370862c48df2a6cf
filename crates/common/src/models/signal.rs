use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Long,
    Short,
}

impl Side {
    /// Exchange order side: longs open with a BUY, shorts with a SELL.
    pub fn order_side(&self) -> &'static str {
        match self {
            Side::Long => "BUY",
            Side::Short => "SELL",
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Long => write!(f, "LONG"),
            Side::Short => write!(f, "SHORT"),
        }
    }
}

/// A parsed trade intent. `take_profits` is non-empty and ordered favorably
/// from entry (ascending for LONG, descending for SHORT), so index 0 is the
/// nearest target regardless of how the source message listed them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeSignal {
    pub symbol: String,
    pub side: Side,
    pub entry_price: f64,
    pub take_profits: Vec<f64>,
    pub stop_loss: f64,
    pub leverage: Option<u32>,
    pub position_size: Option<f64>,
    /// Original message text, kept for audit. Never re-parsed.
    pub raw: String,
}

impl TradeSignal {
    /// Sorts targets so the first element is the one price reaches first.
    pub fn order_targets(&mut self) {
        self.take_profits
            .sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        if self.side == Side::Short {
            self.take_profits.reverse();
        }
    }

    pub fn first_target(&self) -> f64 {
        self.take_profits[0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signal(side: Side, tps: Vec<f64>) -> TradeSignal {
        TradeSignal {
            symbol: "BTCUSDT".to_string(),
            side,
            entry_price: 100.0,
            take_profits: tps,
            stop_loss: 90.0,
            leverage: None,
            position_size: None,
            raw: String::new(),
        }
    }

    #[test]
    fn long_targets_sort_ascending() {
        let mut s = signal(Side::Long, vec![120.0, 105.0, 110.0]);
        s.order_targets();
        assert_eq!(s.take_profits, vec![105.0, 110.0, 120.0]);
        assert_eq!(s.first_target(), 105.0);
    }

    #[test]
    fn short_targets_sort_descending() {
        let mut s = signal(Side::Short, vec![80.0, 95.0, 85.0]);
        s.order_targets();
        assert_eq!(s.take_profits, vec![95.0, 85.0, 80.0]);
        assert_eq!(s.first_target(), 95.0);
    }
}
