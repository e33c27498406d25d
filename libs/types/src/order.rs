//! Order lifecycle types.
//!
//! Lifecycle: `PENDING` on acceptance, `PARTIALLY_FILLED` while some quantity
//! has traded and some remains, then terminally `FILLED`, `CANCELLED`, or
//! `REJECTED`. No transition leaves a terminal state.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::CoreError;
use crate::ids::{AccountId, Instrument, OrderId};
use crate::numeric::Price;

/// Order side (bid or ask).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn opposite(&self) -> Self {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

/// Why an accepted order was later rejected by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RejectReason {
    /// The atomic settlement unit for the first match failed.
    SettlementFailed,
    /// Unexpected internal fault; the order was parked.
    Internal,
}

/// Order status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "state", content = "reason")]
pub enum OrderStatus {
    /// Accepted, no quantity traded yet.
    #[serde(rename = "PENDING")]
    Pending,

    /// Some quantity traded, some remains.
    #[serde(rename = "PARTIALLY_FILLED")]
    PartiallyFilled,

    /// All quantity traded (terminal).
    #[serde(rename = "FILLED")]
    Filled,

    /// Explicitly cancelled while quantity remained (terminal).
    #[serde(rename = "CANCELLED")]
    Cancelled,

    /// Rejected by the engine after acceptance (terminal).
    #[serde(rename = "REJECTED")]
    Rejected(RejectReason),
}

impl OrderStatus {
    /// Terminal states admit no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Filled | OrderStatus::Cancelled | OrderStatus::Rejected(_)
        )
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderStatus::Pending => write!(f, "PENDING"),
            OrderStatus::PartiallyFilled => write!(f, "PARTIALLY_FILLED"),
            OrderStatus::Filled => write!(f, "FILLED"),
            OrderStatus::Cancelled => write!(f, "CANCELLED"),
            OrderStatus::Rejected(reason) => write!(f, "REJECTED({reason:?})"),
        }
    }
}

/// A limit order.
///
/// Invariant: `0 <= remaining <= quantity`, checked on every fill.
/// `sequence` is the arrival number assigned by the instrument's book and
/// fixes time priority for the order's whole resting life.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub order_id: OrderId,
    pub account_id: AccountId,
    pub instrument: Instrument,
    pub side: Side,
    pub price: Price,
    pub quantity: u64,
    pub remaining: u64,
    pub status: OrderStatus,
    pub sequence: u64,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Order {
    /// Create a new pending order. Quantity must already be validated > 0.
    pub fn new(
        account_id: AccountId,
        instrument: Instrument,
        side: Side,
        price: Price,
        quantity: u64,
        timestamp: i64,
    ) -> Self {
        Self {
            order_id: OrderId::new(),
            account_id,
            instrument,
            side,
            price,
            quantity,
            remaining: quantity,
            status: OrderStatus::Pending,
            sequence: 0,
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    pub fn filled_quantity(&self) -> u64 {
        self.quantity - self.remaining
    }

    pub fn is_filled(&self) -> bool {
        self.remaining == 0
    }

    /// Apply a fill, decrementing `remaining` and advancing the status.
    pub fn fill(&mut self, quantity: u64, timestamp: i64) -> Result<(), CoreError> {
        if self.status.is_terminal() {
            return Err(CoreError::EngineFault(format!(
                "fill on terminal order {} ({})",
                self.order_id, self.status
            )));
        }
        if quantity > self.remaining {
            return Err(CoreError::EngineFault(format!(
                "fill of {quantity} exceeds remaining {} on order {}",
                self.remaining, self.order_id
            )));
        }
        self.remaining -= quantity;
        self.status = if self.remaining == 0 {
            OrderStatus::Filled
        } else {
            OrderStatus::PartiallyFilled
        };
        self.updated_at = timestamp;
        Ok(())
    }

    /// Cancel the order while quantity remains.
    pub fn cancel(&mut self, timestamp: i64) -> Result<(), CoreError> {
        if self.status.is_terminal() {
            return Err(CoreError::AlreadyTerminal {
                order_id: self.order_id,
                status: self.status,
            });
        }
        self.status = OrderStatus::Cancelled;
        self.updated_at = timestamp;
        Ok(())
    }

    /// Park the order as rejected (settlement abort or engine fault).
    pub fn reject(&mut self, reason: RejectReason, timestamp: i64) {
        self.status = OrderStatus::Rejected(reason);
        self.updated_at = timestamp;
    }
}
