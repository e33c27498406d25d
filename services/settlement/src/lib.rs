//! Settlement service.
//!
//! Applies the cash and position consequences of each trade as a single
//! all-or-nothing unit, behind an explicit repository boundary, and fans
//! confirmed trades out to observers after commit.
//!
//! **Key invariants:**
//! - One trade settles atomically: trade row, both order rows, both
//!   (account, holding) rows commit or fail together
//! - A failed commit leaves the ledger byte-for-byte untouched
//! - Broadcast and last-price refresh happen strictly after commit and are
//!   best-effort; their failure never rolls a trade back

pub mod memory;
pub mod notifier;
pub mod processor;
pub mod repository;

pub use memory::MemoryLedger;
pub use notifier::{BroadcastNotifier, LastPriceCache, TradeNotifier};
pub use processor::SettlementProcessor;
pub use repository::{LedgerRepository, SettlementUnit};
