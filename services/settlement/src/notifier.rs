//! Trade broadcast and last-price cache.
//!
//! Both are post-commit, best-effort surfaces: a lost broadcast or a cold
//! cache never affects the ledger.

use dashmap::DashMap;
use tokio::sync::broadcast;
use tracing::debug;

use matching_engine::events::TradeExecuted;
use types::ids::Instrument;
use types::numeric::Price;

/// Fan-out boundary for confirmed trades.
pub trait TradeNotifier: Send + Sync {
    fn publish(&self, event: &TradeExecuted);
}

/// Notifier over a tokio broadcast channel.
///
/// Sending with no subscribers is not an error; the event is simply dropped.
pub struct BroadcastNotifier {
    tx: broadcast::Sender<TradeExecuted>,
}

impl BroadcastNotifier {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TradeExecuted> {
        self.tx.subscribe()
    }
}

impl TradeNotifier for BroadcastNotifier {
    fn publish(&self, event: &TradeExecuted) {
        if self.tx.send(event.clone()).is_err() {
            debug!(trade_id = %event.trade_id, "no trade subscribers; event dropped");
        }
    }
}

/// Read-side cache of the last execution price per instrument.
///
/// Callers fall back to a holding's average cost when an instrument has not
/// printed yet.
#[derive(Debug, Default)]
pub struct LastPriceCache {
    prices: DashMap<Instrument, Price>,
}

impl LastPriceCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, instrument: Instrument, price: Price) {
        self.prices.insert(instrument, price);
    }

    pub fn get(&self, instrument: &Instrument) -> Option<Price> {
        self.prices.get(instrument).map(|entry| *entry.value())
    }
}
