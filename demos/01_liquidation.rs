/// liquidation - a collateral price crash makes a loan liquidatable
use chrono::{Duration, TimeZone, Utc};
use lending_pool_rs::serialization::{LiquidationView, LoanView};
use lending_pool_rs::{
    borrow, deposit, liquidate, ActionDetail, AggregatedQuote, AssetId, CompensationPolicy, LendingError, PoolConfig,
    PoolSnapshot, PriceFeed, ProjectionContext, SafeTimeProvider, TimeSource, Uuid,
};
use tracing_subscriber::EnvFilter;

fn feed(asset: &AssetId, numerator: u64, denominator: u64, valid_until: chrono::DateTime<Utc>) -> PriceFeed {
    PriceFeed::Aggregated(vec![AggregatedQuote {
        asset: asset.clone(),
        numerator,
        denominator,
        valid_until,
    }])
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")))
        .init();

    println!("=== liquidation example ===\n");

    let time = SafeTimeProvider::new(TimeSource::Test(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()));
    let controller = time.test_control().unwrap();

    let token = AssetId::new("8fef2d34", "4c454e4649");
    let config = PoolConfig::standard();
    let pool = PoolSnapshot::open(AssetId::native(), token.clone(), "config-1");
    let pool = deposit(&pool, &config, 500_000_000, None)?.next;

    // token trades at 2 ada
    let context = ProjectionContext::from_time_provider(&time)
        .with_collateral_feed(feed(&token, 2, 1, time.now() + Duration::minutes(10)));
    let opened = borrow(&pool, &config, Uuid::new_v4(), 100_000_000, 80_000_000, &context)?;
    let loan = &opened.loans[0];
    println!("opened loan at {}% a year", loan.interest_rate.as_percentage());

    // healthy at the opening price
    controller.advance(Duration::days(90));
    let context = ProjectionContext::from_time_provider(&time)
        .with_collateral_feed(feed(&token, 2, 1, time.now() + Duration::minutes(10)));
    match liquidate(&opened.next, &config, &opened.loans, &context) {
        Err(LendingError::Overcollateralized { health_factor, .. }) => {
            println!("refused, health factor {}", health_factor);
        }
        other => println!("unexpected: {:?}", other.map(|p| p.next)),
    }

    // token drops to 1.3 ada
    let context = ProjectionContext::from_time_provider(&time)
        .with_collateral_feed(feed(&token, 13, 10, time.now() + Duration::minutes(10)))
        .with_compensation_policy(CompensationPolicy::PayBorrower);
    let closed = liquidate(&opened.next, &config, &opened.loans, &context)?;

    println!("\nloan before liquidation:");
    println!("{}", serde_json::to_string_pretty(&LoanView::from_loan(loan, time.now())?)?);

    if let ActionDetail::Liquidate(outcomes) = &closed.detail {
        for outcome in outcomes {
            println!("\nliquidation:");
            println!("{}", serde_json::to_string_pretty(&LiquidationView::from(outcome))?);
        }
    }

    println!(
        "\npool balance {} -> {}, lent out {} -> {}",
        opened.next.balance, closed.next.balance, opened.next.lent_out, closed.next.lent_out
    );

    Ok(())
}
