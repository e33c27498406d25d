//! Repository boundary for the ledger.
//!
//! The core never talks to a storage technology directly; it sees this trait.
//! Reads return owned snapshots (storage semantics, not shared references).
//! The single write path with algorithmic weight is `commit_settlement`: an
//! explicit transaction primitive replacing framework-managed transactions.

use types::account::{Account, Holding};
use types::errors::SettlementError;
use types::ids::{AccountId, Instrument, OrderId};
use types::order::{Order, Side};
use types::trade::Trade;

use matching_engine::OrderFill;

/// Everything one trade changes, committed as a single unit.
#[derive(Debug, Clone)]
pub struct SettlementUnit {
    pub trade: Trade,
    /// Post-trade snapshot of the incoming order.
    pub taker: OrderFill,
    /// Post-trade snapshot of the resting order.
    pub maker: OrderFill,
}

/// CRUD access to accounts, holdings, orders, and trades, plus the atomic
/// settlement commit.
///
/// Implementations must guarantee that `commit_settlement` applies the whole
/// unit or nothing: no partially settled state may ever be observable, even
/// after an error return.
pub trait LedgerRepository {
    // -- accounts -----------------------------------------------------------

    fn insert_account(&mut self, account: Account);
    fn account(&self, account_id: &AccountId) -> Option<Account>;
    fn accounts(&self) -> Vec<Account>;

    // -- holdings -----------------------------------------------------------

    fn upsert_holding(&mut self, holding: Holding);
    fn holding(&self, account_id: &AccountId, instrument: &Instrument) -> Option<Holding>;
    fn holdings_for_account(&self, account_id: &AccountId) -> Vec<Holding>;

    // -- orders -------------------------------------------------------------

    fn insert_order(&mut self, order: Order);
    fn order(&self, order_id: &OrderId) -> Option<Order>;
    /// Overwrite an order row (status/quantity changes outside settlement,
    /// e.g. cancellation or parking).
    fn update_order(&mut self, order: &Order);
    /// Non-terminal orders of one account.
    fn open_orders_for_account(&self, account_id: &AccountId) -> Vec<Order>;
    /// Resting (non-terminal) orders for an instrument side, in matching
    /// priority order. Durability/recovery view; the live book is in memory.
    fn resting_orders(&self, instrument: &Instrument, side: Side) -> Vec<Order>;

    // -- trades -------------------------------------------------------------

    /// Trades where the account was buyer or seller, oldest first.
    fn trades_for_account(&self, account_id: &AccountId) -> Vec<Trade>;
    fn trades(&self) -> Vec<Trade>;

    // -- settlement ---------------------------------------------------------

    /// Apply one settlement unit atomically: insert the trade, update both
    /// order rows, debit the buyer / credit the seller, and move the
    /// position (weighted-average cost on the buy side). All or nothing.
    fn commit_settlement(&mut self, unit: &SettlementUnit) -> Result<(), SettlementError>;
}
