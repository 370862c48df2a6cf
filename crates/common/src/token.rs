//! Compact transport token for sharing a parsed signal through constrained
//! channels (Telegram `/start` deeplinks allow only `A-Za-z0-9_-`).
//!
//! The payload is a versioned pipe-delimited string, base64url-encoded
//! without padding. Position size is intentionally not carried: sizing is
//! resolved on the receiving side from that user's own defaults.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use thiserror::Error;

use crate::models::{Side, TradeSignal};

const VERSION: &str = "1";

#[derive(Error, Debug)]
pub enum TokenError {
    #[error("token is not valid base64url")]
    Encoding,
    #[error("unsupported token version {0:?}")]
    Version(String),
    #[error("token field {0} is missing or malformed")]
    Field(&'static str),
}

pub fn encode(signal: &TradeSignal) -> String {
    let side = match signal.side {
        Side::Long => "L",
        Side::Short => "S",
    };
    let targets = signal
        .take_profits
        .iter()
        .map(|t| t.to_string())
        .collect::<Vec<_>>()
        .join(",");
    let leverage = signal
        .leverage
        .map(|l| l.to_string())
        .unwrap_or_default();
    let payload = format!(
        "{VERSION}|{}|{side}|{}|{targets}|{}|{leverage}",
        signal.symbol, signal.entry_price, signal.stop_loss
    );
    URL_SAFE_NO_PAD.encode(payload)
}

/// Tokens come from untrusted deeplinks; a price that is not a finite
/// positive number is malformed, not merely unusual.
fn parse_price(raw: &str, field: &'static str) -> Result<f64, TokenError> {
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() && v > 0.0 => Ok(v),
        _ => Err(TokenError::Field(field)),
    }
}

pub fn decode(token: &str) -> Result<TradeSignal, TokenError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(token.trim())
        .map_err(|_| TokenError::Encoding)?;
    let payload = String::from_utf8(bytes).map_err(|_| TokenError::Encoding)?;

    let fields: Vec<&str> = payload.split('|').collect();
    if fields.len() != 7 {
        return Err(TokenError::Field("count"));
    }
    if fields[0] != VERSION {
        return Err(TokenError::Version(fields[0].to_string()));
    }

    let symbol = fields[1];
    if symbol.is_empty() {
        return Err(TokenError::Field("symbol"));
    }
    let side = match fields[2] {
        "L" => Side::Long,
        "S" => Side::Short,
        _ => return Err(TokenError::Field("side")),
    };
    let entry_price = parse_price(fields[3], "entry")?;
    let take_profits = fields[4]
        .split(',')
        .map(|t| parse_price(t, "targets"))
        .collect::<Result<Vec<f64>, _>>()?;
    if take_profits.is_empty() {
        return Err(TokenError::Field("targets"));
    }
    let stop_loss = parse_price(fields[5], "stop")?;
    let leverage = if fields[6].is_empty() {
        None
    } else {
        match fields[6].parse() {
            Ok(l) if l > 0 => Some(l),
            _ => return Err(TokenError::Field("leverage")),
        }
    };

    Ok(TradeSignal {
        symbol: symbol.to_string(),
        side,
        entry_price,
        take_profits,
        stop_loss,
        leverage,
        position_size: None,
        raw: payload,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> TradeSignal {
        TradeSignal {
            symbol: "BTCUSDT".to_string(),
            side: Side::Long,
            entry_price: 95093.0,
            take_profits: vec![96117.71, 97500.0],
            stop_loss: 94861.68,
            leverage: Some(10),
            position_size: Some(250.0),
            raw: "BTC LONG ...".to_string(),
        }
    }

    #[test]
    fn round_trip_preserves_trade_fields() {
        let original = sample();
        let decoded = decode(&encode(&original)).unwrap();

        assert_eq!(decoded.symbol, original.symbol);
        assert_eq!(decoded.side, original.side);
        assert_eq!(decoded.entry_price, original.entry_price);
        assert_eq!(decoded.take_profits, original.take_profits);
        assert_eq!(decoded.stop_loss, original.stop_loss);
        assert_eq!(decoded.leverage, original.leverage);
    }

    #[test]
    fn leverage_may_be_absent() {
        let mut s = sample();
        s.leverage = None;
        let decoded = decode(&encode(&s)).unwrap();
        assert_eq!(decoded.leverage, None);
    }

    #[test]
    fn token_is_deeplink_safe() {
        let token = encode(&sample());
        assert!(token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-'));
    }

    #[test]
    fn garbage_is_rejected_not_panicked() {
        assert!(decode("not base64 ïŋ―").is_err());
        assert!(decode(&URL_SAFE_NO_PAD.encode("2|BTCUSDT|L|1|2|3|")).is_err());
        assert!(decode(&URL_SAFE_NO_PAD.encode("1|BTCUSDT|L|x|2|3|")).is_err());
    }

    #[test]
    fn non_positive_prices_are_rejected() {
        assert!(decode(&URL_SAFE_NO_PAD.encode("1|BTCUSDT|L|-5|110|90|")).is_err());
        assert!(decode(&URL_SAFE_NO_PAD.encode("1|BTCUSDT|L|0|110|90|")).is_err());
        assert!(decode(&URL_SAFE_NO_PAD.encode("1|BTCUSDT|L|NaN|110|90|")).is_err());
        assert!(decode(&URL_SAFE_NO_PAD.encode("1|BTCUSDT|L|100|110,-120|90|")).is_err());
        assert!(decode(&URL_SAFE_NO_PAD.encode("1|BTCUSDT|L|100|110|90|0")).is_err());
    }
}
