//! Error taxonomy for the matching and settlement core.
//!
//! Three layers: `ValidationError` rejects malformed submissions at the
//! boundary before an order exists, `SettlementError` covers failures of the
//! atomic settlement unit, and `CoreError` is the umbrella the venue exposes.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::ids::{AccountId, OrderId};
use crate::order::OrderStatus;

/// Rejections raised before an order is created.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("invalid instrument: {0:?}")]
    InvalidInstrument(String),

    #[error("price must be positive, got {0}")]
    InvalidPrice(Decimal),

    #[error("quantity must be positive")]
    InvalidQuantity,

    #[error("unknown account: {0}")]
    UnknownAccount(AccountId),

    #[error("insufficient funds: required {required}, available {available}")]
    InsufficientFunds {
        required: Decimal,
        available: Decimal,
    },

    #[error("insufficient position: required {required}, available {available}")]
    InsufficientPosition { required: u64, available: u64 },
}

/// Failures of the atomic settlement unit.
///
/// Any of these aborts the current match attempt and leaves the book and
/// ledger exactly as they were before the attempt began.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SettlementError {
    #[error("buyer overdraft: cost {required}, balance {available}")]
    InsufficientFunds {
        required: Decimal,
        available: Decimal,
    },

    #[error("seller position short: required {required}, held {available}")]
    InsufficientPosition { required: u64, available: u64 },

    #[error("unknown account: {0}")]
    UnknownAccount(AccountId),

    #[error("unknown order: {0}")]
    UnknownOrder(OrderId),

    #[error("storage failure: {0}")]
    Storage(String),
}

/// Umbrella error for operations exposed by the venue.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("order not found: {0}")]
    OrderNotFound(OrderId),

    #[error("account not found: {0}")]
    AccountNotFound(AccountId),

    #[error("order {order_id} is already terminal ({status})")]
    AlreadyTerminal {
        order_id: OrderId,
        status: OrderStatus,
    },

    #[error(transparent)]
    Settlement(#[from] SettlementError),

    #[error("engine fault: {0}")]
    EngineFault(String),
}
