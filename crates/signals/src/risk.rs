use common::models::TradeSignal;

/// Reward-to-risk ratio against the nearest target only. A degenerate
/// signal with entry == stop yields infinity (or NaN when the target also
/// equals entry); callers render that case specially instead of crashing.
pub fn risk_reward(signal: &TradeSignal) -> f64 {
    let risk = (signal.entry_price - signal.stop_loss).abs();
    let reward = (signal.first_target() - signal.entry_price).abs();
    reward / risk
}

/// Display form for chat messages: two decimals, non-finite as "∞".
pub fn format_risk_reward(ratio: f64) -> String {
    if ratio.is_finite() {
        format!("{ratio:.2}")
    } else {
        "∞".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::models::Side;

    fn signal(entry: f64, stop: f64, tp: f64) -> TradeSignal {
        TradeSignal {
            symbol: "BTCUSDT".to_string(),
            side: Side::Long,
            entry_price: entry,
            take_profits: vec![tp],
            stop_loss: stop,
            leverage: None,
            position_size: None,
            raw: String::new(),
        }
    }

    #[test]
    fn two_to_one_long() {
        assert_eq!(risk_reward(&signal(100.0, 95.0, 110.0)), 2.0);
    }

    #[test]
    fn scale_invariant() {
        let base = risk_reward(&signal(100.0, 95.0, 110.0));
        let scaled = risk_reward(&signal(200.0, 190.0, 220.0));
        assert!((base - scaled).abs() < 1e-12);
    }

    #[test]
    fn only_nearest_target_counts() {
        let mut s = signal(100.0, 95.0, 110.0);
        s.take_profits = vec![110.0, 150.0];
        assert_eq!(risk_reward(&s), 2.0);
    }

    #[test]
    fn degenerate_stop_renders_specially() {
        let ratio = risk_reward(&signal(100.0, 100.0, 110.0));
        assert!(ratio.is_infinite());
        assert_eq!(format_risk_reward(ratio), "∞");
        assert_eq!(format_risk_reward(2.0), "2.00");
    }
}
