//! Demo bootstrap: two accounts and an initial market.
//!
//! Seeds a retail trader with cash, a market maker with cash and inventory,
//! and a resting offer so the first demo buy has something to lift.

use rust_decimal::Decimal;
use tracing::info;

use settlement::LedgerRepository;
use types::account::Account;
use types::errors::CoreError;
use types::ids::Instrument;
use types::numeric::Price;
use types::order::Side;

use crate::gateway::{OrderRequest, Venue};

/// Handles to the seeded accounts.
pub struct SeededAccounts {
    pub trader: Account,
    pub market_maker: Account,
    pub instrument: Instrument,
}

/// Create the demo fixture: a trader with 10,000 cash, a market maker with
/// 1,000,000 cash plus 1,000 AAPL at a 100 cost basis, and a resting
/// SELL 100 @ 150 from the maker.
pub async fn seed_demo<L: LedgerRepository + Send + 'static>(
    venue: &Venue<L>,
) -> Result<SeededAccounts, CoreError> {
    let instrument = Instrument::parse("AAPL")?;

    let trader = venue.create_account("trader_1", Decimal::from(10_000))?;
    let market_maker = venue.create_account("market_maker", Decimal::from(1_000_000))?;

    venue.seed_holding(
        market_maker.account_id,
        instrument.clone(),
        1_000,
        Price::from_int(100),
    )?;

    venue
        .place_order(OrderRequest {
            account_id: market_maker.account_id,
            instrument: instrument.to_string(),
            side: Side::Sell,
            price: Decimal::from(150),
            quantity: 100,
            client_key: None,
        })
        .await?;
    venue.flush(&instrument).await?;

    info!("seeded demo accounts and initial AAPL offer");
    Ok(SeededAccounts {
        trader,
        market_maker,
        instrument,
    })
}
