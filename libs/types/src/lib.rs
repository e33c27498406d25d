//! Shared type definitions for the matching and settlement core.
//!
//! Everything with a ledger invariant lives here: identifiers, validated
//! prices, the ledger entities (accounts, holdings, orders, trades) and the
//! error taxonomy used across the engine, settlement, and venue services.
//!
//! # Modules
//! - `ids`: unique identifiers (`OrderId`, `TradeId`, `AccountId`, `Instrument`)
//! - `numeric`: validated decimal price type
//! - `account`: cash accounts and per-instrument holdings
//! - `order`: order lifecycle types
//! - `trade`: immutable trade records
//! - `errors`: error taxonomy

pub mod account;
pub mod errors;
pub mod ids;
pub mod numeric;
pub mod order;
pub mod trade;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::account::*;
    pub use crate::errors::*;
    pub use crate::ids::*;
    pub use crate::numeric::*;
    pub use crate::order::*;
    pub use crate::trade::*;
}
