//! Venue service.
//!
//! The outermost layer of the core: accepts order submissions, validates and
//! risk-checks them at the boundary, hands them to per-instrument matching
//! workers over queues, and answers account queries (open orders, trade
//! history, portfolio with last-price marks).
//!
//! Orders for one instrument are processed by exactly one worker task, so
//! matching and settlement for that instrument are single-writer and every
//! cancel travels through the same queue as the submissions it races.

pub mod config;
pub mod gateway;
pub mod seed;
mod worker;

pub use config::VenueConfig;
pub use gateway::{OrderRequest, Portfolio, Position, Venue};

pub(crate) mod clock {
    use chrono::Utc;

    /// Current wall clock as unix nanos.
    pub fn now_nanos() -> i64 {
        Utc::now().timestamp_nanos_opt().unwrap_or(i64::MAX)
    }
}
