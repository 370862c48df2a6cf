//! Parse → await confirmation → build → submit → report.
//!
//! Each requester owns one pending-signal slot; a new signal silently
//! replaces an unconfirmed one (last write wins, no queueing) and entries
//! never survive past confirm, cancel, or the end of a submission attempt.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use common::models::{OrderKind, Side, TradeResult, TradeSignal};
use exchange::{ExchangeClient, OrderBuilder, SettingsStore};
use signals::SignalParser;

pub type RequesterId = i64;

/// What happened to an inbound chat message.
pub enum SignalOutcome {
    /// Parsed and held; the requester must confirm or cancel.
    Pending(TradeSignal),
    /// Auto-execute mode skipped the confirmation step.
    AutoExecuted(TradeResult),
    /// Not a signal. Non-signal chatter is ignored silently.
    Ignored,
}

/// What happened to a confirm button press.
pub enum ConfirmOutcome {
    NoPending,
    /// The market already crossed the entry in the order's favor; a limit
    /// order would fill immediately at an unintended price. The signal
    /// stays pending so the requester can pick market execution or cancel.
    PriceCrossed { signal: TradeSignal, current: f64 },
    Done(TradeResult),
}

pub struct Orchestrator {
    client: Arc<dyn ExchangeClient>,
    settings: Arc<dyn SettingsStore>,
    builder: OrderBuilder,
    parser: SignalParser,
    auto_execute: bool,
    pending: Mutex<HashMap<RequesterId, TradeSignal>>,
}

impl Orchestrator {
    pub fn new(
        client: Arc<dyn ExchangeClient>,
        settings: Arc<dyn SettingsStore>,
        builder: OrderBuilder,
        parser: SignalParser,
        auto_execute: bool,
    ) -> Self {
        Self {
            client,
            settings,
            builder,
            parser,
            auto_execute,
            pending: Mutex::new(HashMap::new()),
        }
    }

    pub async fn on_message(&self, requester: RequesterId, text: &str) -> SignalOutcome {
        let Ok(signal) = self.parser.parse(text) else {
            return SignalOutcome::Ignored;
        };
        if self.auto_execute {
            info!("auto-executing signal for {requester}: {}", signal.symbol);
            return SignalOutcome::AutoExecuted(
                self.execute(requester, signal, OrderKind::Market).await,
            );
        }
        self.hold(requester, signal.clone()).await;
        SignalOutcome::Pending(signal)
    }

    /// Parks a signal for confirmation, superseding any unconfirmed one.
    pub async fn hold(&self, requester: RequesterId, signal: TradeSignal) {
        let mut pending = self.pending.lock().await;
        if let Some(prev) = pending.insert(requester, signal) {
            debug!("superseded unconfirmed {} signal for {requester}", prev.symbol);
        }
    }

    pub async fn pending_for(&self, requester: RequesterId) -> Option<TradeSignal> {
        self.pending.lock().await.get(&requester).cloned()
    }

    /// Opaque balance payload, relayed as-is to the presentation layer.
    pub async fn balance(&self) -> Result<String, exchange::ExchangeError> {
        self.client.balance().await
    }

    pub async fn cancel(&self, requester: RequesterId) -> bool {
        self.pending.lock().await.remove(&requester).is_some()
    }

    pub async fn confirm(&self, requester: RequesterId, kind: OrderKind) -> ConfirmOutcome {
        let Some(signal) = self.pending_for(requester).await else {
            return ConfirmOutcome::NoPending;
        };

        if kind == OrderKind::Limit {
            match self.client.mark_price(&signal.symbol).await {
                Ok(current) if price_crossed(signal.side, signal.entry_price, current) => {
                    info!(
                        "limit guard fired for {}: price {current} already crossed entry {}",
                        signal.symbol, signal.entry_price
                    );
                    return ConfirmOutcome::PriceCrossed { signal, current };
                }
                Ok(_) => {}
                // Fail-open: an unavailable price feed must not block order
                // submission.
                Err(e) => warn!("limit guard skipped, price feed unavailable: {e}"),
            }
        }

        // Claim the slot, but only if it still holds the signal this
        // confirmation was issued for. A concurrent confirm or cancel may
        // have emptied it, and a newer signal may have superseded it while
        // the price fetch was in flight; a superseded signal was never
        // confirmed and must not execute.
        let claimed = {
            let mut pending = self.pending.lock().await;
            match pending.get(&requester) {
                Some(current) if *current == signal => pending.remove(&requester),
                _ => None,
            }
        };
        let Some(signal) = claimed else {
            return ConfirmOutcome::NoPending;
        };
        ConfirmOutcome::Done(self.execute(requester, signal, kind).await)
    }

    /// One submission attempt. Never retried; the requester re-initiates
    /// after a failure.
    async fn execute(
        &self,
        requester: RequesterId,
        signal: TradeSignal,
        kind: OrderKind,
    ) -> TradeResult {
        let defaults = self.settings.get_defaults(requester).await;
        let order = match self.builder.build(&signal, &defaults, None, kind) {
            Ok(order) => order,
            Err(e) => return TradeResult::failed(e.to_string(), signal),
        };
        match self.client.submit_order(&order).await {
            Ok(ack) => {
                let mut result = TradeResult::filled(ack.order_id, signal);
                if let Some(issue) = ack.protection_error {
                    result.message =
                        format!("{}; WARNING, position is unprotected: {issue}", result.message);
                }
                result
            }
            Err(e) => TradeResult::failed(e.to_string(), signal),
        }
    }
}

fn price_crossed(side: Side, entry: f64, current: f64) -> bool {
    match side {
        Side::Long => current <= entry,
        Side::Short => current >= entry,
    }
}
