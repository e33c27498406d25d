//! Per-instrument matching worker.
//!
//! One task per instrument owns that instrument's book and pulls commands
//! off an mpsc queue: the explicit single-consumer loop that makes matching
//! and settlement single-writer per instrument. Submissions and cancels for
//! the same instrument travel through the same queue, so a cancel that loses
//! the race to a fill observes the terminal order and reports it as such.

use std::sync::{Arc, Mutex};

use tokio::sync::{mpsc, oneshot};
use tracing::{error, info, warn};

use matching_engine::{MatchOutcome, MatchingEngine};
use settlement::{LastPriceCache, LedgerRepository, SettlementProcessor, TradeNotifier};
use types::errors::CoreError;
use types::ids::{Instrument, OrderId};
use types::order::{Order, RejectReason};

use crate::clock::now_nanos;

/// Commands routed into an instrument's processing sequence.
pub(crate) enum EngineCommand {
    Submit {
        order: Order,
    },
    Cancel {
        order_id: OrderId,
        reply: oneshot::Sender<Result<(), CoreError>>,
    },
    /// Barrier: replies once every previously queued command has been
    /// processed. Used by tests and shutdown draining.
    Flush {
        reply: oneshot::Sender<()>,
    },
}

/// Shared handles a worker needs to settle and persist.
pub(crate) struct WorkerContext<L: LedgerRepository> {
    pub ledger: Arc<Mutex<L>>,
    pub notifier: Arc<dyn TradeNotifier>,
    pub last_prices: Arc<LastPriceCache>,
}

/// Consumer loop for one instrument.
///
/// No command is allowed to kill the loop: settlement failures abort only
/// the affected match attempt, and unexpected faults park the faulting order
/// and continue with the next command.
pub(crate) async fn run<L: LedgerRepository + Send + 'static>(
    instrument: Instrument,
    mut rx: mpsc::Receiver<EngineCommand>,
    ctx: WorkerContext<L>,
) {
    let mut engine = MatchingEngine::new(instrument.clone());
    let mut processor = SettlementProcessor::new(
        ctx.ledger.clone(),
        ctx.notifier.clone(),
        ctx.last_prices.clone(),
    );
    info!(instrument = %instrument, "matching worker started");

    while let Some(command) = rx.recv().await {
        match command {
            EngineCommand::Submit { order } => {
                handle_submit(&mut engine, &mut processor, &ctx, order);
            }
            EngineCommand::Cancel { order_id, reply } => {
                let result = handle_cancel(&mut engine, &ctx, &order_id);
                let _ = reply.send(result);
            }
            EngineCommand::Flush { reply } => {
                let _ = reply.send(());
            }
        }
    }
    info!(instrument = %instrument, "matching worker stopped");
}

fn handle_submit<L: LedgerRepository>(
    engine: &mut MatchingEngine,
    processor: &mut SettlementProcessor<L>,
    ctx: &WorkerContext<L>,
    mut order: Order,
) {
    let now = now_nanos();

    // A mis-routed order would corrupt another instrument's book; park it.
    if &order.instrument != engine.instrument() {
        error!(
            order_id = %order.order_id,
            expected = %engine.instrument(),
            got = %order.instrument,
            "order routed to wrong instrument worker; parking"
        );
        order.reject(RejectReason::Internal, now);
        update_order(ctx, &order);
        return;
    }

    let outcome = engine.submit(&mut order, processor, now);
    match outcome {
        MatchOutcome::Filled { trades } => {
            info!(
                order_id = %order.order_id,
                fills = trades.len(),
                "order fully filled"
            );
        }
        MatchOutcome::Rested => {
            update_order(ctx, &order);
        }
        MatchOutcome::PartiallyFilled { trades } => {
            info!(
                order_id = %order.order_id,
                fills = trades.len(),
                remaining = order.remaining,
                "order partially filled, residual resting"
            );
            update_order(ctx, &order);
        }
        MatchOutcome::Aborted { trades, error } => {
            warn!(
                order_id = %order.order_id,
                committed = trades.len(),
                %error,
                "settlement aborted match attempt"
            );
            if trades.is_empty() {
                // Nothing traded; the order is rejected outright.
                order.reject(RejectReason::SettlementFailed, now);
            }
            // With prior commits the order stays PARTIALLY_FILLED but is
            // parked (not resting) rather than re-attempted.
            update_order(ctx, &order);
        }
    }
}

fn handle_cancel<L: LedgerRepository>(
    engine: &mut MatchingEngine,
    ctx: &WorkerContext<L>,
    order_id: &OrderId,
) -> Result<(), CoreError> {
    let now = now_nanos();
    let Ok(mut ledger) = ctx.ledger.lock() else {
        return Err(CoreError::EngineFault("ledger lock poisoned".into()));
    };
    let mut order = ledger.order(order_id).ok_or(CoreError::OrderNotFound(*order_id))?;

    // Late cancel: a match already consumed the order, or it was cancelled
    // before. Report the terminal state, mutate nothing.
    order.cancel(now)?;

    engine.cancel(order_id);
    ledger.update_order(&order);
    info!(order_id = %order_id, remaining = order.remaining, "order cancelled");
    Ok(())
}

fn update_order<L: LedgerRepository>(ctx: &WorkerContext<L>, order: &Order) {
    if let Ok(mut ledger) = ctx.ledger.lock() {
        ledger.update_order(order);
    } else {
        error!(order_id = %order.order_id, "ledger lock poisoned; order row not updated");
    }
}
