//! Conservation properties under random order flow.
//!
//! Cash and shares only ever move between counterparties: with no deposits,
//! the totals across all accounts are constant no matter what sequence of
//! orders, fills, aborts, and rejections the engine processes.

use std::sync::{Arc, Mutex};

use proptest::prelude::*;
use rust_decimal::Decimal;

use matching_engine::{MatchOutcome, MatchingEngine};
use settlement::{
    BroadcastNotifier, LastPriceCache, LedgerRepository, MemoryLedger, SettlementProcessor,
    TradeNotifier,
};
use types::account::{Account, Holding};
use types::ids::{AccountId, Instrument};
use types::numeric::Price;
use types::order::{Order, RejectReason, Side};

const OPENING_CASH: u64 = 1_000_000;
const OPENING_SHARES: u64 = 1_000;

#[derive(Debug, Clone)]
struct Op {
    trader: usize,
    side: Side,
    price: u64,
    quantity: u64,
    /// Inject a storage failure just before this op's matching.
    poison: bool,
}

fn op_strategy(traders: usize) -> impl Strategy<Value = Op> {
    (
        0..traders,
        prop::bool::ANY,
        90u64..110,
        1u64..80,
        prop::bool::weighted(0.1),
    )
        .prop_map(|(trader, buy, price, quantity, poison)| Op {
            trader,
            side: if buy { Side::Buy } else { Side::Sell },
            price,
            quantity,
            poison,
        })
}

struct Harness {
    ledger: Arc<Mutex<MemoryLedger>>,
    processor: SettlementProcessor<MemoryLedger>,
    engine: MatchingEngine,
    accounts: Vec<AccountId>,
    instrument: Instrument,
}

fn harness(traders: usize) -> Harness {
    let instrument = Instrument::parse("AAPL").unwrap();
    let mut store = MemoryLedger::new();
    let mut accounts = Vec::new();
    for i in 0..traders {
        let account = Account::new(format!("trader_{i}"), Decimal::from(OPENING_CASH), 0);
        store.upsert_holding(Holding::open(
            account.account_id,
            instrument.clone(),
            OPENING_SHARES,
            Price::from_int(100),
        ));
        accounts.push(account.account_id);
        store.insert_account(account);
    }

    let ledger = Arc::new(Mutex::new(store));
    let notifier = Arc::new(BroadcastNotifier::new(1024));
    let processor = SettlementProcessor::new(
        ledger.clone(),
        notifier as Arc<dyn TradeNotifier>,
        Arc::new(LastPriceCache::new()),
    );
    Harness {
        ledger,
        processor,
        engine: MatchingEngine::new(instrument.clone()),
        accounts,
        instrument,
    }
}

/// Mirror of the venue worker's submit path, driven synchronously.
fn run_op(h: &mut Harness, op: &Op, now: i64) {
    if op.poison {
        h.ledger.lock().unwrap().fail_next_commits(1);
    }

    let mut order = Order::new(
        h.accounts[op.trader],
        h.instrument.clone(),
        op.side,
        Price::from_int(op.price),
        op.quantity,
        now,
    );
    h.ledger.lock().unwrap().insert_order(order.clone());

    let outcome = h.engine.submit(&mut order, &mut h.processor, now);
    match outcome {
        MatchOutcome::Filled { .. } => {}
        MatchOutcome::Rested | MatchOutcome::PartiallyFilled { .. } => {
            h.ledger.lock().unwrap().update_order(&order);
        }
        MatchOutcome::Aborted { trades, .. } => {
            if trades.is_empty() {
                order.reject(RejectReason::SettlementFailed, now);
            }
            h.ledger.lock().unwrap().update_order(&order);
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_cash_and_shares_conserved(ops in prop::collection::vec(op_strategy(4), 1..60)) {
        let mut h = harness(4);
        for (i, op) in ops.iter().enumerate() {
            run_op(&mut h, op, i as i64);
        }

        let ledger = h.ledger.lock().unwrap();
        let total_cash: Decimal = ledger.accounts().iter().map(|a| a.balance).sum();
        prop_assert_eq!(total_cash, Decimal::from(OPENING_CASH * 4), "cash conserved");

        let total_shares: u64 = h
            .accounts
            .iter()
            .filter_map(|id| ledger.holding(id, &h.instrument))
            .map(|holding| holding.quantity)
            .sum();
        prop_assert_eq!(total_shares, OPENING_SHARES * 4, "shares conserved");

        for account in ledger.accounts() {
            prop_assert!(account.balance >= Decimal::ZERO, "no account overdrawn");
        }
    }

    #[test]
    fn prop_trades_execute_at_maker_price_within_cross(
        ops in prop::collection::vec(op_strategy(3), 1..40)
    ) {
        let mut h = harness(3);
        for (i, op) in ops.iter().enumerate() {
            run_op(&mut h, op, i as i64);
        }

        let ledger = h.ledger.lock().unwrap();
        for trade in ledger.trades() {
            let buy = ledger.order(&trade.buyer_order_id).unwrap();
            let sell = ledger.order(&trade.seller_order_id).unwrap();
            // Execution at the maker's price, inside both limits.
            prop_assert!(trade.price <= buy.price);
            prop_assert!(trade.price >= sell.price);
            prop_assert!(trade.price == buy.price || trade.price == sell.price);
            prop_assert_ne!(trade.buyer_account_id, trade.seller_account_id, "no self-trades");
        }
    }
}
