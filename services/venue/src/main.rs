use rust_decimal::Decimal;
use tracing::info;
use tracing_subscriber::EnvFilter;

use types::order::Side;
use venue::{seed::seed_demo, OrderRequest, Venue, VenueConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let venue = Venue::in_memory(VenueConfig::default());
    let seeded = seed_demo(&venue).await?;
    let mut trades = venue.subscribe_trades();

    // The trader lifts part of the seeded offer.
    let order_id = venue
        .place_order(OrderRequest {
            account_id: seeded.trader.account_id,
            instrument: seeded.instrument.to_string(),
            side: Side::Buy,
            price: Decimal::from(150),
            quantity: 50,
            client_key: Some("demo-buy-1".into()),
        })
        .await?;
    venue.flush(&seeded.instrument).await?;

    let order = venue.order(&order_id)?;
    info!(order_id = %order_id, status = %order.status, "demo order processed");

    while let Ok(trade) = trades.try_recv() {
        info!(
            trade_id = %trade.trade_id,
            instrument = %trade.instrument,
            price = %trade.price,
            quantity = trade.quantity,
            "trade executed"
        );
    }

    for account in [&seeded.trader, &seeded.market_maker] {
        let portfolio = venue.portfolio(&account.account_id)?;
        info!(
            account = %portfolio.name,
            balance = %portfolio.balance,
            positions = portfolio.positions.len(),
            "portfolio"
        );
        for position in &portfolio.positions {
            info!(
                instrument = %position.instrument,
                quantity = position.quantity,
                average_cost = %position.average_cost,
                market_value = %position.market_value,
                "position"
            );
        }
    }

    Ok(())
}
