//! Order book infrastructure.
//!
//! Price levels with FIFO queues, plus the bid and ask sides.

pub mod ask_book;
pub mod bid_book;
pub mod price_level;

pub use ask_book::AskBook;
pub use bid_book::BidBook;
pub use price_level::{BookEntry, PriceLevel};
