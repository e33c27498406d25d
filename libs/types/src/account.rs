//! Cash accounts and per-instrument holdings.
//!
//! An `Account` carries a single exact-decimal cash balance. A `Holding` is
//! the (account, instrument) position with its weighted-average cost basis.
//! Both enforce their own invariants: a debit may not overdraw the balance
//! and a sell may not exceed the held quantity.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::SettlementError;
use crate::ids::{AccountId, Instrument};
use crate::numeric::Price;

/// A trading account with an exact-decimal cash balance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub account_id: AccountId,
    pub name: String,
    pub balance: Decimal,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Account {
    pub fn new(name: impl Into<String>, opening_balance: Decimal, timestamp: i64) -> Self {
        Self {
            account_id: AccountId::new(),
            name: name.into(),
            balance: opening_balance,
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    /// Remove cash from the account.
    ///
    /// Fails without mutating when the debit would drive the balance
    /// negative; settlement treats that as an abort of the whole unit.
    pub fn debit(&mut self, amount: Decimal, timestamp: i64) -> Result<(), SettlementError> {
        if amount > self.balance {
            return Err(SettlementError::InsufficientFunds {
                required: amount,
                available: self.balance,
            });
        }
        self.balance -= amount;
        self.updated_at = timestamp;
        Ok(())
    }

    /// Add cash to the account.
    pub fn credit(&mut self, amount: Decimal, timestamp: i64) {
        self.balance += amount;
        self.updated_at = timestamp;
    }
}

/// A position in one instrument, unique per (account, instrument) pair.
///
/// `quantity == 0` means flat; the quantity is never negative. The average
/// cost is meaningful only while the quantity is positive and is recomputed
/// only by quantity-increasing settlements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    pub account_id: AccountId,
    pub instrument: Instrument,
    pub quantity: u64,
    pub average_cost: Decimal,
}

impl Holding {
    /// Open a fresh position from a buy fill.
    pub fn open(account_id: AccountId, instrument: Instrument, quantity: u64, price: Price) -> Self {
        Self {
            account_id,
            instrument,
            quantity,
            average_cost: price.as_decimal(),
        }
    }

    /// Fold a buy fill into the position, recomputing the weighted-average
    /// cost: `(c0*q0 + p*q) / (q0 + q)`.
    pub fn apply_buy(&mut self, quantity: u64, price: Price) {
        let old_value = self.average_cost * Decimal::from(self.quantity);
        let new_total = self.quantity + quantity;
        if new_total > 0 {
            self.average_cost = (old_value + price.notional(quantity)) / Decimal::from(new_total);
        }
        self.quantity = new_total;
    }

    /// Reduce the position by a sell fill. The cost basis of the remainder
    /// is unchanged; selling more than is held fails without mutating.
    pub fn apply_sell(&mut self, quantity: u64) -> Result<(), SettlementError> {
        if quantity > self.quantity {
            return Err(SettlementError::InsufficientPosition {
                required: quantity,
                available: self.quantity,
            });
        }
        self.quantity -= quantity;
        Ok(())
    }

    /// Value the position at `last_price`, falling back to the average cost
    /// when no trade has printed for the instrument yet.
    pub fn market_value(&self, last_price: Option<Price>) -> Decimal {
        let mark = last_price.map_or(self.average_cost, |p| p.as_decimal());
        mark * Decimal::from(self.quantity)
    }
}
