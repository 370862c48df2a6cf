//! Best-effort extraction of trade intents from free-text chat messages.
//!
//! Two strategies are attempted in order: a structured line-labeled format
//! ([`structured`]) and a generic whole-message scan ([`freeform`]). The
//! structured tier never returns a partial result; any missing core field
//! drops the whole message down to the free-form tier.

mod extract;
mod freeform;
mod structured;

use common::models::{Side, TradeSignal};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("no symbol/side header found")]
    NoHeader,
    #[error("no entry price found")]
    MissingEntry,
    #[error("no stop loss found")]
    MissingStop,
    #[error("no take-profit targets found")]
    MissingTargets,
    #[error("{0} must be positive")]
    NonPositive(&'static str),
}

/// Field values pulled out of a message before validation. Either tier may
/// leave any field unset; [`SignalParser::finish`] decides what that means.
#[derive(Debug, Default)]
struct Extracted {
    symbol: Option<String>,
    side: Option<Side>,
    entry: Option<f64>,
    stop: Option<f64>,
    targets: Vec<f64>,
    leverage: Option<u32>,
}

impl Extracted {
    fn is_complete(&self) -> bool {
        self.entry.is_some() && self.stop.is_some() && !self.targets.is_empty()
    }
}

pub struct SignalParser {
    quote_asset: String,
}

impl Default for SignalParser {
    fn default() -> Self {
        Self::new("USDT")
    }
}

impl SignalParser {
    pub fn new(quote_asset: impl Into<String>) -> Self {
        Self {
            quote_asset: quote_asset.into().to_uppercase(),
        }
    }

    /// Parses a chat message into a trade signal. Failure is a normal
    /// outcome for non-signal chatter; the specific missing field is logged
    /// at debug and returned, never raised.
    pub fn parse(&self, text: &str) -> Result<TradeSignal, ParseError> {
        let result = self.run(text);
        if let Err(e) = &result {
            debug!("signal parse failed: {e}");
        }
        result
    }

    fn run(&self, text: &str) -> Result<TradeSignal, ParseError> {
        if let Some(fields) = structured::extract(text) {
            if fields.is_complete() {
                return self.finish(fields, text);
            }
            debug!("structured extraction incomplete, trying free-form");
        }
        self.finish(freeform::extract(text), text)
    }

    fn finish(&self, fields: Extracted, raw: &str) -> Result<TradeSignal, ParseError> {
        let (symbol, side) = match (fields.symbol, fields.side) {
            (Some(symbol), Some(side)) => (symbol, side),
            _ => return Err(ParseError::NoHeader),
        };
        let entry_price = fields.entry.ok_or(ParseError::MissingEntry)?;
        let stop_loss = fields.stop.ok_or(ParseError::MissingStop)?;
        if fields.targets.is_empty() {
            return Err(ParseError::MissingTargets);
        }

        if entry_price <= 0.0 {
            return Err(ParseError::NonPositive("entry price"));
        }
        if stop_loss <= 0.0 {
            return Err(ParseError::NonPositive("stop loss"));
        }
        if fields.targets.iter().any(|t| *t <= 0.0) {
            return Err(ParseError::NonPositive("take profit"));
        }

        let mut signal = TradeSignal {
            symbol: self.normalize_symbol(&symbol),
            side,
            entry_price,
            take_profits: fields.targets,
            stop_loss,
            leverage: fields.leverage,
            position_size: None,
            raw: raw.to_string(),
        };
        signal.order_targets();
        Ok(signal)
    }

    fn normalize_symbol(&self, symbol: &str) -> String {
        let upper = symbol.to_uppercase();
        if upper.ends_with("USDT") || upper.ends_with("USD") || upper.ends_with("PERP") {
            upper
        } else {
            format!("{upper}{}", self.quote_asset)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Result<TradeSignal, ParseError> {
        SignalParser::default().parse(text)
    }

    #[test]
    fn structured_signal_with_ranges_and_noise() {
        let s = parse(
            "BTC LONG\nLeverage: 10-25x\nEntry: 95,093 / Current Price 95,337.89\nStop Loss: 94,861.68\nTake Profit: 96,117.71",
        )
        .unwrap();
        assert_eq!(s.symbol, "BTCUSDT");
        assert_eq!(s.side, Side::Long);
        assert_eq!(s.entry_price, 95093.0);
        assert_eq!(s.stop_loss, 94861.68);
        assert_eq!(s.take_profits, vec![96117.71]);
        assert_eq!(s.leverage, Some(10));
    }

    #[test]
    fn structured_take_profit_range_emits_both_targets() {
        let s = parse("ETH LONG SCALP\nEntry: 3000\nStop Loss: 2950\nTake Profit: 3050-3120")
            .unwrap();
        assert_eq!(s.take_profits, vec![3050.0, 3120.0]);
    }

    #[test]
    fn structured_numbered_take_profit_lines_collect_every_level() {
        let s = parse("BTC LONG\nEntry: 100\nStop Loss: 90\nTake Profit 1: 110\nTake Profit 2: 120")
            .unwrap();
        assert_eq!(s.take_profits, vec![110.0, 120.0]);
    }

    #[test]
    fn one_liner_falls_through_to_freeform() {
        let s = parse("ETH SHORT @ 3500 | TP: 3400, 3300 | SL: 3600").unwrap();
        assert_eq!(s.symbol, "ETHUSDT");
        assert_eq!(s.side, Side::Short);
        assert_eq!(s.entry_price, 3500.0);
        assert_eq!(s.take_profits, vec![3400.0, 3300.0]);
        assert_eq!(s.stop_loss, 3600.0);
    }

    #[test]
    fn incomplete_structured_tier_is_discarded_wholesale() {
        // Header and labeled entry/TP are fine, but the stop only parses in
        // the generic tier. The whole message must re-parse there.
        let s = parse("BTC LONG\nEntry: 100\nTake Profit: 110\nsl 90").unwrap();
        assert_eq!(s.entry_price, 100.0);
        assert_eq!(s.stop_loss, 90.0);
        assert_eq!(s.take_profits, vec![110.0]);
    }

    #[test]
    fn buy_and_sell_keywords_map_to_sides() {
        let long = parse("buy btc entry 100 target 110 stop 90").unwrap();
        assert_eq!(long.side, Side::Long);
        assert_eq!(long.symbol, "BTCUSDT");

        let short = parse("sell sol @ 200 tp 190 sl 210").unwrap();
        assert_eq!(short.side, Side::Short);
        assert_eq!(short.symbol, "SOLUSDT");
    }

    #[test]
    fn targets_are_sorted_favorably_from_entry() {
        let long = parse("btc long @ 100 tp1 120 tp2 105 tp3 110 sl 95").unwrap();
        assert_eq!(long.take_profits, vec![105.0, 110.0, 120.0]);

        let short = parse("btc short @ 100 tp 80 tp 95 tp 85 sl 110").unwrap();
        assert_eq!(short.take_profits, vec![95.0, 85.0, 80.0]);
    }

    #[test]
    fn duplicate_targets_deduplicated() {
        let s = parse("btc long @ 100 tp1 110 tp2 110 tp3 120 sl 90").unwrap();
        assert_eq!(s.take_profits, vec![110.0, 120.0]);
    }

    #[test]
    fn existing_quote_suffix_is_kept() {
        let s = parse("ethusdt long entry 3000 tp 3100 sl 2900").unwrap();
        assert_eq!(s.symbol, "ETHUSDT");
    }

    #[test]
    fn leverage_range_keeps_lower_bound_in_freeform() {
        let s = parse("btc long @ 100 tp 110 sl 90 lev 10-25x").unwrap();
        assert_eq!(s.leverage, Some(10));
    }

    #[test]
    fn chatter_without_side_keyword_fails_cleanly() {
        assert_eq!(parse("gm everyone, market looking juicy"), Err(ParseError::NoHeader));
    }

    #[test]
    fn missing_fields_are_reported_specifically() {
        assert_eq!(parse("btc long @ 100 tp 110"), Err(ParseError::MissingStop));
        assert_eq!(parse("btc long tp 110 sl 90"), Err(ParseError::MissingEntry));
        assert_eq!(parse("btc long @ 100 sl 90"), Err(ParseError::MissingTargets));
    }

    #[test]
    fn unparseable_numeric_token_treated_as_absent() {
        // "soon" is not a price; the entry stays unresolved.
        assert_eq!(
            parse("btc long entry soon tp 110 sl 90"),
            Err(ParseError::MissingEntry)
        );
    }

    #[test]
    fn zero_entry_rejected() {
        assert_eq!(
            parse("BTC LONG\nEntry: 0\nStop Loss: 90\nTake Profit: 110"),
            Err(ParseError::NonPositive("entry price"))
        );
    }
}
