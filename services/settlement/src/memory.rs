//! In-memory reference implementation of the ledger repository.
//!
//! Commit works in two phases: stage every change against cloned rows,
//! validating as it goes, then swap the staged rows in. Any error during
//! staging returns before the first write, so a failed commit leaves the
//! store untouched.

use std::collections::HashMap;

use tracing::warn;

use types::account::{Account, Holding};
use types::errors::SettlementError;
use types::ids::{AccountId, Instrument, OrderId};
use types::order::{Order, Side};
use types::trade::Trade;

use matching_engine::OrderFill;

use crate::repository::{LedgerRepository, SettlementUnit};

/// Ledger store backed by hash maps. Not internally synchronized; callers
/// share it behind a lock.
#[derive(Debug, Default)]
pub struct MemoryLedger {
    accounts: HashMap<AccountId, Account>,
    holdings: HashMap<(AccountId, Instrument), Holding>,
    orders: HashMap<OrderId, Order>,
    trades: Vec<Trade>,
    /// Fault-injection counter: while positive, commits fail with a storage
    /// error. Test hook for atomicity-under-failure coverage.
    fail_commits: u32,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Force the next `n` settlement commits to fail with a storage error.
    pub fn fail_next_commits(&mut self, n: u32) {
        self.fail_commits = n;
    }

    fn apply_fill(&mut self, fill: &OrderFill, now: i64) {
        if let Some(order) = self.orders.get_mut(&fill.order_id) {
            order.remaining = fill.remaining;
            order.status = fill.status;
            order.updated_at = now;
        }
    }
}

impl LedgerRepository for MemoryLedger {
    fn insert_account(&mut self, account: Account) {
        self.accounts.insert(account.account_id, account);
    }

    fn account(&self, account_id: &AccountId) -> Option<Account> {
        self.accounts.get(account_id).cloned()
    }

    fn accounts(&self) -> Vec<Account> {
        self.accounts.values().cloned().collect()
    }

    fn upsert_holding(&mut self, holding: Holding) {
        self.holdings
            .insert((holding.account_id, holding.instrument.clone()), holding);
    }

    fn holding(&self, account_id: &AccountId, instrument: &Instrument) -> Option<Holding> {
        self.holdings.get(&(*account_id, instrument.clone())).cloned()
    }

    fn holdings_for_account(&self, account_id: &AccountId) -> Vec<Holding> {
        let mut holdings: Vec<Holding> = self
            .holdings
            .values()
            .filter(|h| &h.account_id == account_id)
            .cloned()
            .collect();
        holdings.sort_by(|a, b| a.instrument.cmp(&b.instrument));
        holdings
    }

    fn insert_order(&mut self, order: Order) {
        self.orders.insert(order.order_id, order);
    }

    fn order(&self, order_id: &OrderId) -> Option<Order> {
        self.orders.get(order_id).cloned()
    }

    fn update_order(&mut self, order: &Order) {
        self.orders.insert(order.order_id, order.clone());
    }

    fn open_orders_for_account(&self, account_id: &AccountId) -> Vec<Order> {
        let mut orders: Vec<Order> = self
            .orders
            .values()
            .filter(|o| &o.account_id == account_id && !o.status.is_terminal())
            .cloned()
            .collect();
        orders.sort_by_key(|o| o.created_at);
        orders
    }

    fn resting_orders(&self, instrument: &Instrument, side: Side) -> Vec<Order> {
        let mut orders: Vec<Order> = self
            .orders
            .values()
            .filter(|o| {
                &o.instrument == instrument && o.side == side && !o.status.is_terminal()
            })
            .cloned()
            .collect();
        // Matching priority: best price first, then earliest arrival.
        orders.sort_by(|a, b| {
            let by_price = match side {
                Side::Buy => b.price.cmp(&a.price),
                Side::Sell => a.price.cmp(&b.price),
            };
            by_price.then(a.sequence.cmp(&b.sequence))
        });
        orders
    }

    fn trades_for_account(&self, account_id: &AccountId) -> Vec<Trade> {
        self.trades
            .iter()
            .filter(|t| &t.buyer_account_id == account_id || &t.seller_account_id == account_id)
            .cloned()
            .collect()
    }

    fn trades(&self) -> Vec<Trade> {
        self.trades.clone()
    }

    fn commit_settlement(&mut self, unit: &SettlementUnit) -> Result<(), SettlementError> {
        if self.fail_commits > 0 {
            self.fail_commits -= 1;
            warn!(trade_id = %unit.trade.trade_id, "injected storage failure");
            return Err(SettlementError::Storage("injected commit failure".into()));
        }

        let trade = &unit.trade;
        debug_assert!(!trade.is_self_trade(), "self-trades never reach settlement");
        let now = trade.executed_at;
        let cost = trade.notional();

        // Stage phase: validate everything against cloned rows.
        let mut buyer = self
            .accounts
            .get(&trade.buyer_account_id)
            .cloned()
            .ok_or(SettlementError::UnknownAccount(trade.buyer_account_id))?;
        let mut seller = self
            .accounts
            .get(&trade.seller_account_id)
            .cloned()
            .ok_or(SettlementError::UnknownAccount(trade.seller_account_id))?;
        for fill in [&unit.taker, &unit.maker] {
            if !self.orders.contains_key(&fill.order_id) {
                return Err(SettlementError::UnknownOrder(fill.order_id));
            }
        }

        buyer.debit(cost, now)?;
        seller.credit(cost, now);

        let buyer_key = (trade.buyer_account_id, trade.instrument.clone());
        let buyer_holding = match self.holdings.get(&buyer_key) {
            Some(existing) => {
                let mut holding = existing.clone();
                holding.apply_buy(trade.quantity, trade.price);
                holding
            }
            None => Holding::open(
                trade.buyer_account_id,
                trade.instrument.clone(),
                trade.quantity,
                trade.price,
            ),
        };

        let seller_key = (trade.seller_account_id, trade.instrument.clone());
        let mut seller_holding = self.holdings.get(&seller_key).cloned().ok_or(
            SettlementError::InsufficientPosition {
                required: trade.quantity,
                available: 0,
            },
        )?;
        seller_holding.apply_sell(trade.quantity)?;

        // Commit phase: nothing below can fail.
        self.accounts.insert(buyer.account_id, buyer);
        self.accounts.insert(seller.account_id, seller);
        self.holdings.insert(buyer_key, buyer_holding);
        self.holdings.insert(seller_key, seller_holding);
        self.apply_fill(&unit.taker, now);
        self.apply_fill(&unit.maker, now);
        self.trades.push(trade.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use types::numeric::Price;
    use types::order::{Order, OrderStatus};

    fn instrument() -> Instrument {
        Instrument::parse("AAPL").unwrap()
    }

    struct Fixture {
        ledger: MemoryLedger,
        buyer: AccountId,
        seller: AccountId,
        buy_order: Order,
        sell_order: Order,
    }

    /// Buyer with 10_000 cash; seller with 100 shares at cost 100 and
    /// matching PENDING orders for `quantity` shares at `price`.
    fn fixture(price: u64, quantity: u64) -> Fixture {
        let mut ledger = MemoryLedger::new();

        let buyer = Account::new("buyer", Decimal::from(10_000), 0);
        let seller = Account::new("seller", Decimal::from(0), 0);
        let buyer_id = buyer.account_id;
        let seller_id = seller.account_id;
        ledger.insert_account(buyer);
        ledger.insert_account(seller);
        ledger.upsert_holding(Holding::open(
            seller_id,
            instrument(),
            100,
            Price::from_int(100),
        ));

        let buy_order = Order::new(
            buyer_id,
            instrument(),
            Side::Buy,
            Price::from_int(price),
            quantity,
            0,
        );
        let sell_order = Order::new(
            seller_id,
            instrument(),
            Side::Sell,
            Price::from_int(price),
            quantity,
            0,
        );
        ledger.insert_order(buy_order.clone());
        ledger.insert_order(sell_order.clone());

        Fixture {
            ledger,
            buyer: buyer_id,
            seller: seller_id,
            buy_order,
            sell_order,
        }
    }

    fn unit(f: &Fixture, price: u64, quantity: u64) -> SettlementUnit {
        let trade = Trade::new(
            1,
            instrument(),
            Price::from_int(price),
            quantity,
            f.buyer,
            f.seller,
            f.buy_order.order_id,
            f.sell_order.order_id,
            Side::Buy,
            10,
        );
        SettlementUnit {
            trade,
            taker: OrderFill {
                order_id: f.buy_order.order_id,
                remaining: f.buy_order.quantity - quantity,
                status: if f.buy_order.quantity == quantity {
                    OrderStatus::Filled
                } else {
                    OrderStatus::PartiallyFilled
                },
            },
            maker: OrderFill {
                order_id: f.sell_order.order_id,
                remaining: f.sell_order.quantity - quantity,
                status: if f.sell_order.quantity == quantity {
                    OrderStatus::Filled
                } else {
                    OrderStatus::PartiallyFilled
                },
            },
        }
    }

    #[test]
    fn test_commit_moves_cash_and_position() {
        let mut f = fixture(150, 50);
        f.ledger.commit_settlement(&unit(&f, 150, 50)).unwrap();

        assert_eq!(f.ledger.account(&f.buyer).unwrap().balance, Decimal::from(2_500));
        assert_eq!(f.ledger.account(&f.seller).unwrap().balance, Decimal::from(7_500));

        let buyer_holding = f.ledger.holding(&f.buyer, &instrument()).unwrap();
        assert_eq!(buyer_holding.quantity, 50);
        assert_eq!(buyer_holding.average_cost, Decimal::from(150));

        let seller_holding = f.ledger.holding(&f.seller, &instrument()).unwrap();
        assert_eq!(seller_holding.quantity, 50);
        assert_eq!(seller_holding.average_cost, Decimal::from(100), "sell keeps cost basis");

        assert_eq!(f.ledger.trades().len(), 1);
        let buy_row = f.ledger.order(&f.buy_order.order_id).unwrap();
        assert_eq!(buy_row.remaining, 0);
        assert_eq!(buy_row.status, OrderStatus::Filled);
    }

    #[test]
    fn test_commit_updates_existing_buyer_holding_wavg() {
        let mut f = fixture(160, 50);
        f.ledger.upsert_holding(Holding::open(
            f.buyer,
            instrument(),
            100,
            Price::from_int(150),
        ));
        f.ledger.commit_settlement(&unit(&f, 160, 50)).unwrap();

        let holding = f.ledger.holding(&f.buyer, &instrument()).unwrap();
        assert_eq!(holding.quantity, 150);
        assert_eq!(
            holding.average_cost.round_dp(2),
            "153.33".parse::<Decimal>().unwrap()
        );
    }

    #[test]
    fn test_overdraft_commit_leaves_store_untouched() {
        let mut f = fixture(500, 50); // cost 25_000 > 10_000 balance
        let before_trades = f.ledger.trades().len();

        let err = f.ledger.commit_settlement(&unit(&f, 500, 50)).unwrap_err();
        assert!(matches!(err, SettlementError::InsufficientFunds { .. }));

        assert_eq!(f.ledger.account(&f.buyer).unwrap().balance, Decimal::from(10_000));
        assert_eq!(f.ledger.account(&f.seller).unwrap().balance, Decimal::from(0));
        assert_eq!(
            f.ledger.holding(&f.seller, &instrument()).unwrap().quantity,
            100
        );
        assert!(f.ledger.holding(&f.buyer, &instrument()).is_none());
        assert_eq!(f.ledger.trades().len(), before_trades);
        assert_eq!(
            f.ledger.order(&f.buy_order.order_id).unwrap().remaining,
            50,
            "order rows untouched"
        );
    }

    #[test]
    fn test_oversell_commit_rejected() {
        let mut f = fixture(10, 150); // seller only holds 100
        let err = f.ledger.commit_settlement(&unit(&f, 10, 150)).unwrap_err();
        assert!(matches!(
            err,
            SettlementError::InsufficientPosition { required: 150, available: 100 }
        ));
        assert_eq!(
            f.ledger.holding(&f.seller, &instrument()).unwrap().quantity,
            100
        );
    }

    #[test]
    fn test_injected_failure_and_recovery() {
        let mut f = fixture(150, 50);
        f.ledger.fail_next_commits(1);

        let err = f.ledger.commit_settlement(&unit(&f, 150, 50)).unwrap_err();
        assert!(matches!(err, SettlementError::Storage(_)));
        assert!(f.ledger.trades().is_empty());

        // Next commit goes through.
        f.ledger.commit_settlement(&unit(&f, 150, 50)).unwrap();
        assert_eq!(f.ledger.trades().len(), 1);
    }

    #[test]
    fn test_resting_orders_priority_order() {
        let mut ledger = MemoryLedger::new();
        let account = Account::new("maker", Decimal::ZERO, 0);
        let account_id = account.account_id;
        ledger.insert_account(account);

        let mut sequence = 0u64;
        let mut add_sell = |price: u64| {
            sequence += 1;
            let mut order = Order::new(
                account_id,
                instrument(),
                Side::Sell,
                Price::from_int(price),
                10,
                sequence as i64,
            );
            order.sequence = sequence;
            ledger.insert_order(order.clone());
            order.order_id
        };
        let at_101 = add_sell(101);
        let at_99 = add_sell(99);
        let at_99_later = add_sell(99);

        let resting = ledger.resting_orders(&instrument(), Side::Sell);
        let ids: Vec<OrderId> = resting.iter().map(|o| o.order_id).collect();
        assert_eq!(ids, vec![at_99, at_99_later, at_101]);
    }
}
