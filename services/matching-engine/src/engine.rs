//! Per-instrument matching engine.
//!
//! One `MatchingEngine` owns one instrument's book and is the only writer to
//! it. The matching loop walks the opposite side in priority order, settles
//! each candidate trade through the [`TradeSettler`] boundary *before*
//! touching any book state, and rests whatever quantity survives.

use std::collections::HashMap;

use tracing::debug;

use types::errors::SettlementError;
use types::ids::{Instrument, OrderId};
use types::numeric::Price;
use types::order::{Order, OrderStatus, Side};
use types::trade::Trade;

use crate::book::{AskBook, BidBook, BookEntry, PriceLevel};
use crate::matching::crosses;

/// Post-trade snapshot of one order's quantity and status, persisted as part
/// of the settlement unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderFill {
    pub order_id: OrderId,
    pub remaining: u64,
    pub status: OrderStatus,
}

/// Boundary to the settlement processor.
///
/// `settle` must apply the trade, both order updates, and both counterparty
/// ledger updates as a single all-or-nothing unit. An `Err` return means
/// nothing was applied; the engine then aborts the match attempt with the
/// book exactly as it was before this step.
pub trait TradeSettler {
    fn settle(
        &mut self,
        trade: &Trade,
        taker: &OrderFill,
        maker: &OrderFill,
    ) -> Result<(), SettlementError>;
}

/// Result of submitting one order.
#[derive(Debug)]
pub enum MatchOutcome {
    /// No match; the order rests in the book.
    Rested,
    /// Some quantity traded; the residual rests in the book.
    PartiallyFilled { trades: Vec<Trade> },
    /// The full quantity traded; nothing rests.
    Filled { trades: Vec<Trade> },
    /// Settlement failed mid-loop. `trades` are the units that committed
    /// before the failure; the residual order is parked, not rested.
    Aborted {
        trades: Vec<Trade>,
        error: SettlementError,
    },
}

impl MatchOutcome {
    pub fn trades(&self) -> &[Trade] {
        match self {
            MatchOutcome::Rested => &[],
            MatchOutcome::PartiallyFilled { trades }
            | MatchOutcome::Filled { trades }
            | MatchOutcome::Aborted { trades, .. } => trades,
        }
    }
}

/// Price-time priority matching engine for a single instrument.
pub struct MatchingEngine {
    instrument: Instrument,
    bids: BidBook,
    asks: AskBook,
    /// Resting-order index: order id → (side, price), so cancels need no
    /// external lookup.
    resting: HashMap<OrderId, (Side, Price)>,
    arrival_seq: u64,
    trade_seq: u64,
}

impl MatchingEngine {
    pub fn new(instrument: Instrument) -> Self {
        Self {
            instrument,
            bids: BidBook::new(),
            asks: AskBook::new(),
            resting: HashMap::new(),
            arrival_seq: 0,
            trade_seq: 0,
        }
    }

    pub fn instrument(&self) -> &Instrument {
        &self.instrument
    }

    /// Submit an incoming order, matching it against the opposite side.
    ///
    /// The order's arrival sequence is assigned here; its quantity and
    /// status are updated in place as fills commit. Residual quantity rests
    /// in the book unless settlement aborted the attempt.
    pub fn submit<S: TradeSettler>(
        &mut self,
        order: &mut Order,
        settler: &mut S,
        now: i64,
    ) -> MatchOutcome {
        self.arrival_seq += 1;
        order.sequence = self.arrival_seq;

        let mut trades = Vec::new();
        let mut removed = Vec::new();

        let result = match order.side {
            Side::Buy => match_levels(
                self.asks.levels_mut(),
                &self.instrument,
                order,
                settler,
                &mut self.trade_seq,
                now,
                &mut trades,
                &mut removed,
            ),
            Side::Sell => match_levels(
                self.bids.levels_mut(),
                &self.instrument,
                order,
                settler,
                &mut self.trade_seq,
                now,
                &mut trades,
                &mut removed,
            ),
        };

        match order.side {
            Side::Buy => self.asks.prune_empty(),
            Side::Sell => self.bids.prune_empty(),
        }
        for order_id in &removed {
            self.resting.remove(order_id);
        }

        match result {
            Err(error) => {
                debug!(
                    instrument = %self.instrument,
                    order_id = %order.order_id,
                    committed = trades.len(),
                    %error,
                    "match attempt aborted by settlement"
                );
                MatchOutcome::Aborted { trades, error }
            }
            Ok(()) if order.remaining == 0 => MatchOutcome::Filled { trades },
            Ok(()) => {
                let entry = BookEntry {
                    order_id: order.order_id,
                    account_id: order.account_id,
                    remaining: order.remaining,
                    sequence: order.sequence,
                };
                match order.side {
                    Side::Buy => self.bids.insert(order.price, entry),
                    Side::Sell => self.asks.insert(order.price, entry),
                }
                self.resting.insert(order.order_id, (order.side, order.price));
                if trades.is_empty() {
                    MatchOutcome::Rested
                } else {
                    MatchOutcome::PartiallyFilled { trades }
                }
            }
        }
    }

    /// Remove a resting order from the book.
    ///
    /// Returns the removed entry, or `None` when the order is not resting
    /// (already filled, cancelled, or never rested here).
    pub fn cancel(&mut self, order_id: &OrderId) -> Option<BookEntry> {
        let (side, price) = self.resting.remove(order_id)?;
        match side {
            Side::Buy => self.bids.remove(order_id, price),
            Side::Sell => self.asks.remove(order_id, price),
        }
    }

    pub fn is_resting(&self, order_id: &OrderId) -> bool {
        self.resting.contains_key(order_id)
    }

    pub fn best_bid(&self) -> Option<Price> {
        self.bids.best_price()
    }

    pub fn best_ask(&self) -> Option<Price> {
        self.asks.best_price()
    }

    /// Total resting quantity on one side, for conservation checks.
    pub fn resting_quantity(&self, side: Side) -> u64 {
        match side {
            Side::Buy => self.bids.total_quantity(),
            Side::Sell => self.asks.total_quantity(),
        }
    }

    /// Top-of-book snapshot: best `depth` levels per side.
    pub fn depth(&self, depth: usize) -> (Vec<(Price, u64)>, Vec<(Price, u64)>) {
        (self.bids.depth(depth), self.asks.depth(depth))
    }
}

/// Walk opposite-side levels in priority order, committing one settled trade
/// per step. Entries owned by the taker's own account are skipped in place.
#[allow(clippy::too_many_arguments)]
fn match_levels<'a, S: TradeSettler>(
    levels: impl Iterator<Item = (Price, &'a mut PriceLevel)>,
    instrument: &Instrument,
    order: &mut Order,
    settler: &mut S,
    trade_seq: &mut u64,
    now: i64,
    trades: &mut Vec<Trade>,
    removed: &mut Vec<OrderId>,
) -> Result<(), SettlementError> {
    for (price, level) in levels {
        if order.remaining == 0 {
            break;
        }
        if !crosses(order.side, order.price, price) {
            break;
        }

        let mut idx = 0;
        while order.remaining > 0 {
            let Some(i) = level.first_counterparty(&order.account_id, idx) else {
                break;
            };
            idx = i;
            // Bounds hold: first_counterparty returned a live index.
            let maker = level
                .entry(idx)
                .cloned()
                .expect("first_counterparty returned a live index");

            let quantity = order.remaining.min(maker.remaining);
            let (buyer_account, seller_account, buyer_order, seller_order) = match order.side {
                Side::Buy => (
                    order.account_id,
                    maker.account_id,
                    order.order_id,
                    maker.order_id,
                ),
                Side::Sell => (
                    maker.account_id,
                    order.account_id,
                    maker.order_id,
                    order.order_id,
                ),
            };
            let trade = Trade::new(
                *trade_seq + 1,
                instrument.clone(),
                price,
                quantity,
                buyer_account,
                seller_account,
                buyer_order,
                seller_order,
                order.side,
                now,
            );

            let taker_fill = OrderFill {
                order_id: order.order_id,
                remaining: order.remaining - quantity,
                status: if order.remaining == quantity {
                    OrderStatus::Filled
                } else {
                    OrderStatus::PartiallyFilled
                },
            };
            let maker_fill = OrderFill {
                order_id: maker.order_id,
                remaining: maker.remaining - quantity,
                status: if maker.remaining == quantity {
                    OrderStatus::Filled
                } else {
                    OrderStatus::PartiallyFilled
                },
            };

            // Settle first; any failure propagates with zero book mutation.
            settler.settle(&trade, &taker_fill, &maker_fill)?;

            *trade_seq += 1;
            let fill = level
                .fill_at(idx, quantity)
                .expect("fill bounds checked against live entry");
            order
                .fill(quantity, now)
                .expect("taker fill bounded by remaining");
            trades.push(trade);

            if fill.removed {
                removed.push(maker.order_id);
                // Next entry shifted into `idx`; re-scan from there.
            }
            // A surviving maker means the taker is exhausted; the while
            // condition ends the loop.
        }
    }
    Ok(())
}
