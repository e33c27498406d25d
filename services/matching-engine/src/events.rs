//! Events emitted by the matching pipeline for external observers.

use serde::{Deserialize, Serialize};

use types::ids::{AccountId, Instrument, OrderId, TradeId};
use types::numeric::Price;
use types::order::Side;
use types::trade::Trade;

/// A confirmed, settled trade, broadcast to subscribers after commit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeExecuted {
    pub trade_id: TradeId,
    pub sequence: u64,
    pub instrument: Instrument,
    pub price: Price,
    pub quantity: u64,
    pub buyer_account_id: AccountId,
    pub seller_account_id: AccountId,
    pub buyer_order_id: OrderId,
    pub seller_order_id: OrderId,
    pub taker_side: Side,
    pub executed_at: i64,
}

impl From<&Trade> for TradeExecuted {
    fn from(trade: &Trade) -> Self {
        Self {
            trade_id: trade.trade_id,
            sequence: trade.sequence,
            instrument: trade.instrument.clone(),
            price: trade.price,
            quantity: trade.quantity,
            buyer_account_id: trade.buyer_account_id,
            seller_account_id: trade.seller_account_id,
            buyer_order_id: trade.buyer_order_id,
            seller_order_id: trade.seller_order_id,
            taker_side: trade.taker_side,
            executed_at: trade.executed_at,
        }
    }
}
