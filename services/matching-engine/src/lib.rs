//! Matching engine.
//!
//! Per-instrument order books with strict price-time priority and the
//! matching loop that turns one incoming order into zero or more trades.
//!
//! **Key invariants:**
//! - Price-time priority: best price first, earliest arrival among equals
//! - Execution price is always the resting (maker) order's price
//! - A failed settlement aborts the current match step with no book mutation
//! - Deterministic: same input sequence, same trades

pub mod book;
pub mod engine;
pub mod events;
pub mod matching;

pub use engine::{MatchOutcome, MatchingEngine, OrderFill, TradeSettler};
