//! Immutable trade records.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ids::{AccountId, Instrument, OrderId, TradeId};
use crate::numeric::Price;
use crate::order::Side;

/// One execution between a resting (maker) and an incoming (taker) order.
///
/// The execution price is always the maker's limit price. Trades are
/// immutable once created; `sequence` is monotonic per instrument and fixes
/// the deterministic trade order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub trade_id: TradeId,
    pub sequence: u64,
    pub instrument: Instrument,
    pub price: Price,
    pub quantity: u64,
    pub buyer_account_id: AccountId,
    pub seller_account_id: AccountId,
    pub buyer_order_id: OrderId,
    pub seller_order_id: OrderId,
    /// Side of the incoming order (BUY means the buyer was the taker).
    pub taker_side: Side,
    pub executed_at: i64,
}

impl Trade {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        sequence: u64,
        instrument: Instrument,
        price: Price,
        quantity: u64,
        buyer_account_id: AccountId,
        seller_account_id: AccountId,
        buyer_order_id: OrderId,
        seller_order_id: OrderId,
        taker_side: Side,
        executed_at: i64,
    ) -> Self {
        Self {
            trade_id: TradeId::new(),
            sequence,
            instrument,
            price,
            quantity,
            buyer_account_id,
            seller_account_id,
            buyer_order_id,
            seller_order_id,
            taker_side,
            executed_at,
        }
    }

    /// Cash moved by this trade (price × quantity).
    pub fn notional(&self) -> Decimal {
        self.price.notional(self.quantity)
    }

    /// True when the buyer and seller are the same account.
    pub fn is_self_trade(&self) -> bool {
        self.buyer_account_id == self.seller_account_id
    }
}
