//! Settlement processor.
//!
//! Implements the engine's [`TradeSettler`] boundary: builds the settlement
//! unit for each trade, drives it through the repository's atomic commit,
//! and on success performs the best-effort post-commit work (trade broadcast
//! and last-price refresh).

use std::sync::{Arc, Mutex};

use tracing::{info, warn};

use matching_engine::events::TradeExecuted;
use matching_engine::{OrderFill, TradeSettler};
use types::errors::SettlementError;
use types::trade::Trade;

use crate::notifier::{LastPriceCache, TradeNotifier};
use crate::repository::{LedgerRepository, SettlementUnit};

/// Applies each trade's cash and position consequences atomically.
///
/// The ledger lock is held only for the commit itself; broadcast and cache
/// refresh happen after it is released.
pub struct SettlementProcessor<L: LedgerRepository> {
    ledger: Arc<Mutex<L>>,
    notifier: Arc<dyn TradeNotifier>,
    last_prices: Arc<LastPriceCache>,
}

impl<L: LedgerRepository> SettlementProcessor<L> {
    pub fn new(
        ledger: Arc<Mutex<L>>,
        notifier: Arc<dyn TradeNotifier>,
        last_prices: Arc<LastPriceCache>,
    ) -> Self {
        Self {
            ledger,
            notifier,
            last_prices,
        }
    }
}

impl<L: LedgerRepository> TradeSettler for SettlementProcessor<L> {
    fn settle(
        &mut self,
        trade: &Trade,
        taker: &OrderFill,
        maker: &OrderFill,
    ) -> Result<(), SettlementError> {
        let unit = SettlementUnit {
            trade: trade.clone(),
            taker: taker.clone(),
            maker: maker.clone(),
        };

        {
            let mut ledger = self
                .ledger
                .lock()
                .map_err(|_| SettlementError::Storage("ledger lock poisoned".into()))?;
            if let Err(error) = ledger.commit_settlement(&unit) {
                warn!(
                    trade_id = %trade.trade_id,
                    instrument = %trade.instrument,
                    %error,
                    "settlement commit failed"
                );
                return Err(error);
            }
        }

        // Post-commit, best-effort: never rolls the trade back.
        self.last_prices.set(trade.instrument.clone(), trade.price);
        self.notifier.publish(&TradeExecuted::from(trade));

        info!(
            trade_id = %trade.trade_id,
            instrument = %trade.instrument,
            price = %trade.price,
            quantity = trade.quantity,
            "trade settled"
        );
        Ok(())
    }
}
