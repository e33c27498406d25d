//! Price-cross detection.
//!
//! An incoming order can trade against a resting order only when their limit
//! prices cross; execution then happens at the resting (maker) price.

use types::numeric::Price;
use types::order::Side;

/// Does an incoming order at `taker_price` cross a resting order at
/// `maker_price`?
///
/// - Incoming BUY crosses when the maker asks no more than the taker bids.
/// - Incoming SELL crosses when the maker bids no less than the taker asks.
pub fn crosses(taker_side: Side, taker_price: Price, maker_price: Price) -> bool {
    match taker_side {
        Side::Buy => maker_price <= taker_price,
        Side::Sell => maker_price >= taker_price,
    }
}
