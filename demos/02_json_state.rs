/// json state - project actions on a pool read from ledger json
use chrono::{TimeZone, Utc};
use lending_pool_rs::serialization::{loans_from_json, snapshot_from_json, PoolView, ProjectionView};
use lending_pool_rs::{project, PoolAction, PoolConfig, PriceFeed, ProjectionContext, WithdrawRequest};

const SNAPSHOT: &str = r#"{
    "balance": 75000000,
    "lent_out": 25000000,
    "total_shares": 80000000,
    "asset": { "policy_id": "", "asset_name": "" },
    "collateral_asset": { "policy_id": "8fef2d34", "asset_name": "4c454e4649" },
    "config_ref": "config-1"
}"#;

const CONFIG: &str = r#"{
    "interest": {
        "base_rate": 30000,
        "optimal_utilization": 600000,
        "slope_below_optimal": 75000,
        "slope_above_optimal": 300000
    },
    "pool_fee": 2000000,
    "min_fee": 9000000,
    "min_transition": 200,
    "min_loan": 2000000,
    "liquidation_threshold": 1200000,
    "liquidation_fee": 250000,
    "initial_collateral_ratio": 1500000,
    "platform_fees": {
        "tiers": [
            { "threshold": 250000, "fee": 100000 },
            { "threshold": 500000, "fee": 450000 },
            { "threshold": 1000000, "fee": 600000 }
        ]
    }
}"#;

const LOANS: &str = r#"[
    {
        "id": "6f1c2b1e-3f44-4c55-9b0a-2d7e6f1a9c01",
        "principal": 25000000,
        "interest_rate": 45000,
        "origination_time": "2024-01-01T00:00:00Z",
        "collateral_amount": 40000000,
        "collateral_asset": { "policy_id": "8fef2d34", "asset_name": "4c454e4649" },
        "loan_asset": { "policy_id": "", "asset_name": "" },
        "status": "Active",
        "terms": { "threshold": 1200000, "fee": 250000 },
        "pool_balance_at_origination": 100000000,
        "pool_lent_out_at_origination": 0
    }
]"#;

const FEED: &str = r#"{
    "Aggregated": [
        {
            "asset": { "policy_id": "8fef2d34", "asset_name": "4c454e4649" },
            "numerator": 7,
            "denominator": 10,
            "valid_until": "2024-07-01T00:10:00Z"
        }
    ]
}"#;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== json state example ===\n");

    let snapshot = snapshot_from_json(SNAPSHOT)?;
    let config = PoolConfig::from_json(CONFIG)?;
    let loans = loans_from_json(LOANS)?;
    let feed = PriceFeed::from_json(FEED)?;

    println!("pool:");
    println!("{}", PoolView::from_snapshot(&snapshot)?.to_json_pretty()?);

    let context = ProjectionContext::at(Utc.with_ymd_and_hms(2024, 7, 1, 0, 0, 0).unwrap()).with_collateral_feed(feed);

    let actions = vec![
        PoolAction::Deposit {
            amount: 10_000_000,
            max_shares: None,
        },
        PoolAction::Withdraw(WithdrawRequest::Amount(5_000_000)),
        PoolAction::Repay { loans: loans.clone() },
        PoolAction::Liquidate { loans },
    ];

    for action in &actions {
        println!("\n{}:", action.name());
        match project(&snapshot, &config, action, &context) {
            Ok(projection) => println!("{}", ProjectionView::new(&snapshot, &projection)?.to_json_pretty()?),
            Err(err) => println!("rejected: {} (retryable: {})", err, err.is_retryable()),
        }
    }

    Ok(())
}
