/// quick start - deposit, borrow and repay against a native pool
use chrono::{Duration, TimeZone, Utc};
use lending_pool_rs::serialization::ProjectionView;
use lending_pool_rs::{
    borrow, deposit, repay, AssetId, PoolConfig, PoolSnapshot, ProjectionContext, SafeTimeProvider, TimeSource,
    Uuid,
};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let time = SafeTimeProvider::new(TimeSource::Test(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()));
    let controller = time.test_control().unwrap();

    let config = PoolConfig::standard();
    let pool = PoolSnapshot::open(AssetId::native(), AssetId::new("8fef2d34", "4c454e4649"), "config-1");

    // seed the pool with 100 ada
    let seeded = deposit(&pool, &config, 100_000_000, None)?;
    println!("{}", ProjectionView::new(&pool, &seeded)?.to_json_pretty()?);

    // borrow 10 ada against 20 tokens valued at face
    let context = ProjectionContext::from_time_provider(&time);
    let opened = borrow(&seeded.next, &config, Uuid::new_v4(), 10_000_000, 20_000_000, &context)?;
    println!("{}", ProjectionView::new(&seeded.next, &opened)?.to_json_pretty()?);

    // repay after 30 days
    controller.advance(Duration::days(30));
    let context = ProjectionContext::from_time_provider(&time);
    let repaid = repay(&opened.next, &config, &opened.loans, &context)?;
    println!("{}", ProjectionView::new(&opened.next, &repaid)?.to_json_pretty()?);

    Ok(())
}
