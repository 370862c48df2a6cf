use std::time::{SystemTime, UNIX_EPOCH};

use uuid::Uuid;

use common::models::{OrderKind, OrderRequest, Side, TradeSignal};

use crate::error::ExchangeError;
use crate::settings::UserDefaults;

/// Resolved notional sizing in quote-currency units plus leverage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sizing {
    pub position_size: f64,
    pub leverage: u32,
}

/// Turns a parsed signal into exchange-ready order parameters.
///
/// Sizing resolves most-specific-first per field: explicit per-call override,
/// then values embedded in the signal itself, then the requester's stored
/// defaults, then the global config.
pub struct OrderBuilder {
    global: Sizing,
}

impl OrderBuilder {
    pub fn new(global: Sizing) -> Self {
        Self { global }
    }

    pub fn build(
        &self,
        signal: &TradeSignal,
        user: &UserDefaults,
        call_override: Option<Sizing>,
        kind: OrderKind,
    ) -> Result<OrderRequest, ExchangeError> {
        validate_levels(signal)?;

        let sizing = self.resolve_sizing(signal, user, call_override);
        if sizing.position_size <= 0.0 || sizing.leverage == 0 {
            return Err(ExchangeError::InvalidSignal(
                "resolved position size and leverage must be positive".to_string(),
            ));
        }

        let quantity = sizing.position_size * sizing.leverage as f64 / signal.entry_price;

        Ok(OrderRequest {
            symbol: signal.symbol.clone(),
            side: signal.side.order_side().to_string(),
            kind,
            // Fixed 8-fractional-digit precision for submission.
            quantity: format!("{quantity:.8}"),
            price: match kind {
                OrderKind::Limit => Some(signal.entry_price),
                OrderKind::Market => None,
            },
            take_profit: signal.first_target(),
            stop_loss: signal.stop_loss,
            working_type: "MARK_PRICE".to_string(),
            time_in_force: match kind {
                OrderKind::Limit => Some("GTC".to_string()),
                OrderKind::Market => None,
            },
            client_order_id: client_order_id(),
        })
    }

    fn resolve_sizing(
        &self,
        signal: &TradeSignal,
        user: &UserDefaults,
        call_override: Option<Sizing>,
    ) -> Sizing {
        Sizing {
            position_size: call_override
                .map(|o| o.position_size)
                .or(signal.position_size)
                .or(user.position_size)
                .unwrap_or(self.global.position_size),
            leverage: call_override
                .map(|o| o.leverage)
                .or(signal.leverage)
                .or(user.leverage)
                .unwrap_or(self.global.leverage),
        }
    }
}

/// The parser never checks level ordering, so it is enforced here: the stop
/// must sit on the adverse side of entry and the nearest target on the
/// favorable side.
fn validate_levels(signal: &TradeSignal) -> Result<(), ExchangeError> {
    let entry = signal.entry_price;
    let stop_ok = match signal.side {
        Side::Long => signal.stop_loss < entry,
        Side::Short => signal.stop_loss > entry,
    };
    if !stop_ok {
        return Err(ExchangeError::InvalidSignal(format!(
            "stop {} is not adverse to {} entry {entry}",
            signal.stop_loss, signal.side
        )));
    }
    let target_ok = match signal.side {
        Side::Long => signal.first_target() > entry,
        Side::Short => signal.first_target() < entry,
    };
    if !target_ok {
        return Err(ExchangeError::InvalidSignal(format!(
            "target {} is not favorable to {} entry {entry}",
            signal.first_target(),
            signal.side
        )));
    }
    Ok(())
}

/// Idempotency token, unique per attempt: millisecond timestamp plus a
/// random suffix.
fn client_order_id() -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("Time went backwards")
        .as_millis();
    let suffix = Uuid::new_v4().simple().to_string();
    format!("sig-{millis}-{}", &suffix[..8])
}
