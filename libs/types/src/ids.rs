//! Unique identifier types for ledger entities.
//!
//! Entity IDs use UUID v7 so identifiers sort in creation order, which keeps
//! chronological queries cheap. Instruments are validated ticker symbols.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::errors::ValidationError;

macro_rules! uuid_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Create a new id stamped with the current time.
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

uuid_id! {
    /// Unique identifier for an order.
    OrderId
}

uuid_id! {
    /// Unique identifier for a trade.
    TradeId
}

uuid_id! {
    /// Unique identifier for an account.
    AccountId
}

/// Maximum ticker length accepted by [`Instrument::parse`].
const MAX_TICKER_LEN: usize = 12;

/// A validated instrument ticker (e.g. `"AAPL"`, `"BRK.B"`).
///
/// Tickers are 1..=12 characters of uppercase ASCII letters, digits,
/// `.` or `-`. Each instrument has exactly one order book.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Instrument(String);

impl Instrument {
    /// Parse and validate a ticker symbol.
    pub fn parse(symbol: impl Into<String>) -> Result<Self, ValidationError> {
        let s = symbol.into();
        let valid = !s.is_empty()
            && s.len() <= MAX_TICKER_LEN
            && s.chars()
                .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '.' || c == '-');
        if valid {
            Ok(Self(s))
        } else {
            Err(ValidationError::InvalidInstrument(s))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Instrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
