//! Order gateway and venue facade.
//!
//! The `Venue` owns one matching worker per instrument and is the only entry
//! point into the core: it validates submissions, applies pre-trade risk
//! checks, deduplicates client retries, and routes accepted commands onto
//! the instrument's single-writer queue. Queries read the ledger directly;
//! they never touch a worker.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use dashmap::DashMap;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{debug, info};

use matching_engine::events::TradeExecuted;
use settlement::{BroadcastNotifier, LastPriceCache, LedgerRepository, MemoryLedger};
use types::account::Account;
use types::errors::{CoreError, ValidationError};
use types::ids::{AccountId, Instrument, OrderId};
use types::numeric::Price;
use types::order::{Order, Side};
use types::trade::Trade;

use crate::clock::now_nanos;
use crate::config::VenueConfig;
use crate::worker::{self, EngineCommand, WorkerContext};

/// A client order submission, pre-validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRequest {
    pub account_id: AccountId,
    pub instrument: String,
    pub side: Side,
    pub price: Decimal,
    pub quantity: u64,
    /// Client-chosen idempotency key. Resubmitting with the same key inside
    /// the dedup window returns the original order id instead of creating a
    /// second order.
    pub client_key: Option<String>,
}

/// One position line in a portfolio view.
#[derive(Debug, Clone, Serialize)]
pub struct Position {
    pub instrument: Instrument,
    pub quantity: u64,
    pub average_cost: Decimal,
    /// Last trade price, or the average cost when nothing has printed yet.
    pub mark_price: Decimal,
    pub market_value: Decimal,
}

/// Cash plus marked positions for one account.
#[derive(Debug, Clone, Serialize)]
pub struct Portfolio {
    pub account_id: AccountId,
    pub name: String,
    pub balance: Decimal,
    pub positions: Vec<Position>,
}

/// Bounded map of client keys to order ids, evicting oldest first.
struct DedupWindow {
    capacity: usize,
    by_key: HashMap<String, OrderId>,
    arrival: VecDeque<String>,
}

impl DedupWindow {
    fn new(capacity: usize) -> Self {
        Self {
            capacity,
            by_key: HashMap::new(),
            arrival: VecDeque::new(),
        }
    }

    fn get(&self, key: &str) -> Option<OrderId> {
        self.by_key.get(key).copied()
    }

    fn insert(&mut self, key: String, order_id: OrderId) {
        if self.by_key.len() >= self.capacity {
            if let Some(evicted) = self.arrival.pop_front() {
                self.by_key.remove(&evicted);
            }
        }
        if self.by_key.insert(key.clone(), order_id).is_none() {
            self.arrival.push_back(key);
        }
    }
}

/// The trading venue: gateway, worker registry, and read surfaces.
pub struct Venue<L: LedgerRepository + Send + 'static> {
    config: VenueConfig,
    ledger: Arc<Mutex<L>>,
    notifier: Arc<BroadcastNotifier>,
    last_prices: Arc<LastPriceCache>,
    workers: DashMap<Instrument, mpsc::Sender<EngineCommand>>,
    dedup: Mutex<DedupWindow>,
}

impl Venue<MemoryLedger> {
    /// A venue backed by the in-memory ledger.
    pub fn in_memory(config: VenueConfig) -> Self {
        Self::new(config, MemoryLedger::new())
    }
}

impl<L: LedgerRepository + Send + 'static> Venue<L> {
    pub fn new(config: VenueConfig, ledger: L) -> Self {
        let notifier = Arc::new(BroadcastNotifier::new(config.broadcast_capacity));
        let dedup = Mutex::new(DedupWindow::new(config.dedup_window));
        Self {
            config,
            ledger: Arc::new(Mutex::new(ledger)),
            notifier,
            last_prices: Arc::new(LastPriceCache::new()),
            workers: DashMap::new(),
            dedup,
        }
    }

    // -- accounts -------------------------------------------------------------

    pub fn create_account(&self, name: &str, opening_balance: Decimal) -> Result<Account, CoreError> {
        let account = Account::new(name, opening_balance, now_nanos());
        self.locked_ledger()?.insert_account(account.clone());
        info!(account_id = %account.account_id, name, "account created");
        Ok(account)
    }

    /// Install a pre-existing position, bypassing settlement. Bootstrap only.
    pub fn seed_holding(
        &self,
        account_id: AccountId,
        instrument: Instrument,
        quantity: u64,
        cost: Price,
    ) -> Result<(), CoreError> {
        let mut ledger = self.locked_ledger()?;
        if ledger.account(&account_id).is_none() {
            return Err(CoreError::AccountNotFound(account_id));
        }
        ledger.upsert_holding(types::account::Holding::open(
            account_id, instrument, quantity, cost,
        ));
        Ok(())
    }

    // -- order entry ----------------------------------------------------------

    /// Validate, risk-check, persist, and enqueue an order.
    ///
    /// Returns as soon as the order is accepted onto its instrument's queue;
    /// matching happens asynchronously on the worker. The returned id can be
    /// polled via [`Venue::order`] for the outcome.
    pub async fn place_order(&self, request: OrderRequest) -> Result<OrderId, CoreError> {
        let instrument = Instrument::parse(&request.instrument).map_err(CoreError::from)?;
        let price = Price::new(request.price).map_err(CoreError::from)?;
        if request.quantity == 0 {
            return Err(ValidationError::InvalidQuantity.into());
        }

        let order = {
            // The guard spans check and reserve, so two racing submissions
            // with the same key cannot both miss and create two orders.
            let mut dedup = match &request.client_key {
                Some(_) => Some(self.dedup.lock().map_err(|_| poisoned())?),
                None => None,
            };
            if let (Some(dedup), Some(key)) = (dedup.as_deref(), &request.client_key) {
                if let Some(existing) = dedup.get(key) {
                    debug!(client_key = key, order_id = %existing, "duplicate submission coalesced");
                    return Ok(existing);
                }
            }

            let mut ledger = self.locked_ledger()?;
            let account = ledger
                .account(&request.account_id)
                .ok_or(ValidationError::UnknownAccount(request.account_id))?;

            if self.config.risk_checks {
                check_risk(&*ledger, &account, &instrument, request.side, price, request.quantity)?;
            }

            let order = Order::new(
                request.account_id,
                instrument.clone(),
                request.side,
                price,
                request.quantity,
                now_nanos(),
            );
            ledger.insert_order(order.clone());
            // Reserved only on success, so a rejected submission leaves the
            // key free for a corrected retry.
            if let (Some(dedup), Some(key)) = (dedup.as_deref_mut(), request.client_key) {
                dedup.insert(key, order.order_id);
            }
            order
        };

        let order_id = order.order_id;
        self.route(&instrument, EngineCommand::Submit { order }).await?;
        Ok(order_id)
    }

    /// Cancel a live order.
    ///
    /// The cancel rides the same queue as submissions for its instrument, so
    /// a cancel racing a fill resolves deterministically: whichever the
    /// worker dequeues first wins, and a late cancel reports
    /// [`CoreError::AlreadyTerminal`].
    pub async fn cancel_order(&self, order_id: OrderId) -> Result<(), CoreError> {
        let order = self
            .locked_ledger()?
            .order(&order_id)
            .ok_or(CoreError::OrderNotFound(order_id))?;
        if order.status.is_terminal() {
            return Err(CoreError::AlreadyTerminal {
                order_id,
                status: order.status,
            });
        }

        let (reply, response) = oneshot::channel();
        self.route(&order.instrument, EngineCommand::Cancel { order_id, reply })
            .await?;
        response
            .await
            .map_err(|_| CoreError::EngineFault("matching worker dropped cancel reply".into()))?
    }

    /// Wait until every command queued before this call has been processed
    /// for the instrument.
    pub async fn flush(&self, instrument: &Instrument) -> Result<(), CoreError> {
        if !self.workers.contains_key(instrument) {
            return Ok(());
        }
        let (reply, response) = oneshot::channel();
        self.route(instrument, EngineCommand::Flush { reply }).await?;
        response
            .await
            .map_err(|_| CoreError::EngineFault("matching worker dropped flush reply".into()))
    }

    // -- queries --------------------------------------------------------------

    pub fn order(&self, order_id: &OrderId) -> Result<Order, CoreError> {
        self.locked_ledger()?
            .order(order_id)
            .ok_or(CoreError::OrderNotFound(*order_id))
    }

    pub fn open_orders(&self, account_id: &AccountId) -> Result<Vec<Order>, CoreError> {
        Ok(self.locked_ledger()?.open_orders_for_account(account_id))
    }

    pub fn trade_history(&self, account_id: &AccountId) -> Result<Vec<Trade>, CoreError> {
        Ok(self.locked_ledger()?.trades_for_account(account_id))
    }

    /// Cash plus every non-flat position, marked at the last trade price
    /// (average cost if the instrument has not traded yet).
    pub fn portfolio(&self, account_id: &AccountId) -> Result<Portfolio, CoreError> {
        let ledger = self.locked_ledger()?;
        let account = ledger
            .account(account_id)
            .ok_or(CoreError::AccountNotFound(*account_id))?;

        let positions = ledger
            .holdings_for_account(account_id)
            .into_iter()
            .filter(|h| h.quantity > 0)
            .map(|h| {
                let last = self.last_prices.get(&h.instrument);
                let mark_price = last.map_or(h.average_cost, |p| p.as_decimal());
                Position {
                    market_value: h.market_value(last),
                    instrument: h.instrument,
                    quantity: h.quantity,
                    average_cost: h.average_cost,
                    mark_price,
                }
            })
            .collect();

        Ok(Portfolio {
            account_id: account.account_id,
            name: account.name,
            balance: account.balance,
            positions,
        })
    }

    pub fn last_price(&self, instrument: &Instrument) -> Option<Price> {
        self.last_prices.get(instrument)
    }

    /// Live stream of settled trades across all instruments.
    pub fn subscribe_trades(&self) -> broadcast::Receiver<TradeExecuted> {
        self.notifier.subscribe()
    }

    /// Direct ledger access for bootstrap and tests.
    pub fn ledger(&self) -> Arc<Mutex<L>> {
        self.ledger.clone()
    }

    // -- routing --------------------------------------------------------------

    async fn route(&self, instrument: &Instrument, command: EngineCommand) -> Result<(), CoreError> {
        let tx = self.worker_for(instrument);
        tx.send(command)
            .await
            .map_err(|_| CoreError::EngineFault(format!("matching worker for {instrument} is gone")))
    }

    /// Lazily spawn the instrument's worker on first use.
    fn worker_for(&self, instrument: &Instrument) -> mpsc::Sender<EngineCommand> {
        if let Some(tx) = self.workers.get(instrument) {
            return tx.clone();
        }
        let entry = self.workers.entry(instrument.clone()).or_insert_with(|| {
            let (tx, rx) = mpsc::channel(self.config.queue_capacity);
            let ctx = WorkerContext {
                ledger: self.ledger.clone(),
                notifier: self.notifier.clone() as Arc<dyn settlement::TradeNotifier>,
                last_prices: self.last_prices.clone(),
            };
            tokio::spawn(worker::run(instrument.clone(), rx, ctx));
            tx
        });
        entry.clone()
    }

    fn locked_ledger(&self) -> Result<std::sync::MutexGuard<'_, L>, CoreError> {
        self.ledger.lock().map_err(|_| poisoned())
    }
}

fn poisoned() -> CoreError {
    CoreError::EngineFault("venue state lock poisoned".into())
}

/// Pre-trade risk: reject orders the account could not settle even if every
/// open commitment filled.
///
/// Buys reserve cash across all instruments (remaining notional of every open
/// buy plus the new order). Sells reserve the instrument's held quantity
/// against every open sell on it. Settlement re-checks both; this gate exists
/// to fail fast and keep the book free of orders doomed to abort.
fn check_risk<L: LedgerRepository>(
    ledger: &L,
    account: &Account,
    instrument: &Instrument,
    side: Side,
    price: Price,
    quantity: u64,
) -> Result<(), ValidationError> {
    let open = ledger.open_orders_for_account(&account.account_id);
    match side {
        Side::Buy => {
            let committed: Decimal = open
                .iter()
                .filter(|o| o.side == Side::Buy)
                .map(|o| o.price.notional(o.remaining))
                .sum();
            let required = committed + price.notional(quantity);
            if required > account.balance {
                return Err(ValidationError::InsufficientFunds {
                    required,
                    available: account.balance,
                });
            }
        }
        Side::Sell => {
            let held = ledger
                .holding(&account.account_id, instrument)
                .map_or(0, |h| h.quantity);
            let committed: u64 = open
                .iter()
                .filter(|o| o.side == Side::Sell && &o.instrument == instrument)
                .map(|o| o.remaining)
                .sum();
            let required = committed + quantity;
            if required > held {
                return Err(ValidationError::InsufficientPosition {
                    required,
                    available: held,
                });
            }
        }
    }
    Ok(())
}
