//! Validated price type.
//!
//! Prices are exact decimals via `rust_decimal`; share quantities across the
//! core are plain integral `u64` counts, so only the price carries a newtype.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::ValidationError;

/// A strictly positive limit or execution price.
///
/// Construction is validated; a `Price` in hand is always > 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    /// Validate and wrap a decimal price.
    pub fn new(value: Decimal) -> Result<Self, ValidationError> {
        if value > Decimal::ZERO {
            Ok(Self(value))
        } else {
            Err(ValidationError::InvalidPrice(value))
        }
    }

    /// Convenience constructor for whole-number prices.
    pub fn from_int(value: u64) -> Self {
        Self(Decimal::from(value))
    }

    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    /// Cash value of `quantity` shares at this price.
    pub fn notional(&self, quantity: u64) -> Decimal {
        self.0 * Decimal::from(quantity)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
