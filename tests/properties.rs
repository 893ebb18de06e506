use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;
use uuid::Uuid;

use lending_pool_rs::collateral::{assess_liquidation, health_factor, liquidate_batch, LiquidationPricing};
use lending_pool_rs::interest::interest_rate;
use lending_pool_rs::oracle::{asset_amount_for_value, value_in_unit_of_account};
use lending_pool_rs::{
    deposit, withdraw, ActionDetail, AggregatedQuote, AssetId, CompensationPolicy, Direction, LendingError,
    LiquidationTerms, LoanPosition, LoanStatus, PoolConfig, PoolSnapshot, PooledQuote, Ppm,
    PriceFeed, WithdrawRequest,
};

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

fn token() -> AssetId {
    AssetId::new("8fef2d34", "4c454e4649")
}

fn pool(balance: u64, lent_out: u64, total_shares: u64) -> PoolSnapshot {
    PoolSnapshot {
        balance,
        lent_out,
        total_shares,
        ..PoolSnapshot::open(AssetId::native(), token(), "config-1")
    }
}

fn frictionless() -> PoolConfig {
    PoolConfig {
        min_transition: 0,
        ..PoolConfig::fee_free()
    }
}

fn aggregated(numerator: u64, denominator: u64) -> PriceFeed {
    PriceFeed::Aggregated(vec![AggregatedQuote {
        asset: token(),
        numerator,
        denominator,
        valid_until: start() + Duration::days(3650),
    }])
}

fn pooled(reserve_asset: u64, reserve_quote: u64) -> PriceFeed {
    PriceFeed::Pooled(vec![PooledQuote {
        asset: token(),
        reserve_asset,
        reserve_quote,
        valid_until: start() + Duration::days(3650),
    }])
}

fn loan(principal: u64, collateral_amount: u64, rate: u64, age_days: i64) -> LoanPosition {
    LoanPosition {
        id: Uuid::from_u128(1),
        principal,
        interest_rate: Ppm::new(rate),
        origination_time: start() - Duration::days(age_days),
        collateral_amount,
        collateral_asset: token(),
        loan_asset: AssetId::native(),
        status: LoanStatus::Active,
        terms: LiquidationTerms {
            threshold: Ppm::from_percentage(120),
            fee: Ppm::from_percentage(25),
        },
        pool_balance_at_origination: principal.saturating_mul(4),
        pool_lent_out_at_origination: 0,
    }
}

proptest! {
    #[test]
    fn deposit_then_withdraw_never_creates_value(
        balance in 1_000_000u64..1_000_000_000_000,
        lent_out in 0u64..1_000_000_000_000,
        total_shares in 1u64..1_000_000_000_000,
        amount in 1u64..1_000_000,
    ) {
        let config = frictionless();
        let snapshot = pool(balance, lent_out, total_shares);

        let deposited = deposit(&snapshot, &config, amount, Some(u64::MAX));
        prop_assume!(deposited.is_ok());
        let deposited = deposited.unwrap();
        let minted = deposited.next.total_shares - total_shares;
        let accepted = match &deposited.detail {
            ActionDetail::Deposit(quote) => quote.amount,
            other => return Err(TestCaseError::fail(format!("unexpected detail {:?}", other))),
        };
        prop_assert!(accepted <= amount);

        match withdraw(&deposited.next, &config, WithdrawRequest::Shares(minted)) {
            Ok(withdrawn) => {
                let paid_out = deposited.next.balance - withdrawn.next.balance;
                prop_assert!(paid_out <= accepted);
                prop_assert!(paid_out + 1 >= accepted);
            }
            Err(err) => {
                let below_minimum = matches!(err, LendingError::BelowMinimumTransition { .. });
                prop_assert!(below_minimum, "unexpected error {:?}", err);
            }
        }
    }

    #[test]
    fn deposit_then_withdraw_loses_at_most_one_unit_at_par(
        balance in 1_000_000u64..1_000_000_000_000,
        lent_share in 0u64..100,
        amount in 1u64..1_000_000,
    ) {
        // one share per unit of value
        let lent_out = balance / 100 * lent_share;
        let config = frictionless();
        let snapshot = pool(balance, lent_out, balance + lent_out);

        let deposited = deposit(&snapshot, &config, amount, None).unwrap();
        let minted = deposited.next.total_shares - snapshot.total_shares;
        let withdrawn = withdraw(&deposited.next, &config, WithdrawRequest::Shares(minted)).unwrap();
        let paid_out = deposited.next.balance - withdrawn.next.balance;

        prop_assert!(paid_out <= amount);
        prop_assert!(paid_out + 1 >= amount);
    }

    #[test]
    fn interest_rate_is_monotone_in_loan_amount(
        balance in 1u64..1_000_000_000_000,
        lent_out in 0u64..1_000_000_000_000,
        small in 0u64..1_000_000_000_000,
        extra in 0u64..1_000_000_000_000,
    ) {
        let curve = PoolConfig::standard().interest;
        let snapshot = pool(balance, lent_out, balance + lent_out);

        let low = interest_rate(&curve, small, &snapshot).unwrap();
        let high = interest_rate(&curve, small + extra, &snapshot).unwrap();
        prop_assert!(low <= high);
    }

    #[test]
    fn healthy_loans_are_never_liquidated(
        principal in 1_000_000u64..1_000_000_000,
        collateral_amount in 1u64..10_000_000_000,
        numerator in 1u64..1_000,
        denominator in 1u64..1_000,
        rate in 0u64..500_000,
        age_days in 0i64..1_000,
    ) {
        let feed = aggregated(numerator, denominator);
        let l = loan(principal, collateral_amount, rate, age_days);
        let pricing = LiquidationPricing {
            loan_feed: None,
            collateral_feed: Some(&feed),
            policy: CompensationPolicy::PayBorrower,
            now: start(),
        };

        let collateral_value = collateral_amount as u128 * numerator as u128 / denominator as u128;
        let result = assess_liquidation(&l, &PoolConfig::standard(), &pricing);

        match result {
            Ok(outcome) => {
                prop_assert!(outcome.health_factor.is_liquidatable());
                prop_assert_eq!(outcome.collateral_value as u128, collateral_value);
            }
            Err(LendingError::Overcollateralized { .. }) => {
                let debt = principal + lending_pool_rs::interest::accrued_interest(&l, start()).unwrap();
                let hf = health_factor(collateral_value as u64, debt, l.terms.threshold).unwrap();
                prop_assert!(!hf.is_liquidatable());
            }
            Err(other) => prop_assert!(false, "unexpected error {:?}", other),
        }
    }

    #[test]
    fn liquidation_conserves_collateral_value(
        principal in 1_000_000u64..1_000_000_000,
        coverage in 0u64..1_200,
        numerator in 1u64..1_000,
        denominator in 1u64..1_000,
        rate in 0u64..500_000,
        age_days in 0i64..1_000,
        claim in any::<bool>(),
    ) {
        // collateral worth under 120% of principal is always liquidatable
        let collateral_amount = principal / 1_000 * coverage * denominator / numerator;
        let feed = aggregated(numerator, denominator);
        let l = loan(principal, collateral_amount, rate, age_days);
        let policy = if claim { CompensationPolicy::LeftoverClaim } else { CompensationPolicy::PayBorrower };
        let pricing = LiquidationPricing {
            loan_feed: None,
            collateral_feed: Some(&feed),
            policy,
            now: start(),
        };

        let outcome = assess_liquidation(&l, &PoolConfig::standard(), &pricing).unwrap();

        if outcome.collateral_value > outcome.debt_value {
            prop_assert_eq!(
                outcome.debt_value + outcome.liquidator_fee + outcome.remaining_value,
                outcome.collateral_value
            );
        } else {
            prop_assert_eq!(outcome.liquidator_fee, 0);
            prop_assert_eq!(outcome.remaining_value, 0);
        }

        let owed = asset_amount_for_value(&feed, &token(), outcome.remaining_value, start()).unwrap();
        prop_assert_eq!(outcome.borrower_compensation + outcome.protocol_claim, owed);
        prop_assert_eq!(
            outcome.liquidator_collateral + outcome.borrower_compensation + outcome.protocol_claim,
            collateral_amount
        );
        prop_assert!(outcome.platform_fee <= outcome.accrued_interest);
    }

    #[test]
    fn pooled_round_trip_never_creates_value(
        reserve_asset in 1_000u64..1_000_000_000_000,
        reserve_quote in 1_000u64..1_000_000_000_000,
        fraction in 1u64..1_000,
    ) {
        let feed = pooled(reserve_asset, reserve_quote);
        let amount = (reserve_asset / 1_000 * fraction).max(1);

        let proceeds = value_in_unit_of_account(&feed, &token(), amount, Direction::Selling, start()).unwrap();
        let cost = value_in_unit_of_account(&feed, &token(), amount, Direction::Buying, start()).unwrap();
        prop_assert!(proceeds <= cost);

        let bought_back = asset_amount_for_value(&feed, &token(), proceeds, start()).unwrap();
        prop_assert!(bought_back <= amount);
    }

    #[test]
    fn liquidation_batch_conserves_collateral(
        positions in prop::collection::vec((1_000_000u64..1_000_000_000, 0u64..1_200), 1..6),
        numerator in 1u64..1_000,
        spread in 0u64..1_000,
        rate in 0u64..500_000,
        age_days in 0i64..1_000,
    ) {
        // a unit of collateral is worth at most one unit of account
        let denominator = numerator + spread;
        let feed = aggregated(numerator, denominator);
        let loans: Vec<LoanPosition> = positions
            .iter()
            .enumerate()
            .map(|(i, &(principal, coverage))| LoanPosition {
                id: Uuid::from_u128(i as u128 + 1),
                ..loan(principal, principal / 1_000 * coverage * denominator / numerator, rate, age_days)
            })
            .collect();
        let pricing = LiquidationPricing {
            loan_feed: None,
            collateral_feed: Some(&feed),
            policy: CompensationPolicy::PayBorrower,
            now: start(),
        };

        let (outcomes, totals) = liquidate_batch(&loans, &PoolConfig::standard(), &pricing).unwrap();
        prop_assert_eq!(outcomes.len(), loans.len());

        let principal: u64 = loans.iter().map(|l| l.principal).sum();
        let debt: u64 = outcomes.iter().map(|o| o.debt_amount).sum();
        prop_assert_eq!(totals.principal, principal);
        prop_assert_eq!(totals.debt, debt);

        let collateral: u64 = loans.iter().map(|l| l.collateral_amount).sum();
        let distributed: u64 = outcomes
            .iter()
            .map(|o| o.liquidator_collateral + o.borrower_compensation + o.protocol_claim)
            .sum();
        prop_assert_eq!(distributed, collateral);

        let collateral_value: u64 = outcomes.iter().map(|o| o.collateral_value).sum();
        let split_value: u64 = outcomes
            .iter()
            .map(|o| o.debt_value.min(o.collateral_value) + o.liquidator_fee + o.remaining_value)
            .sum();
        prop_assert_eq!(split_value, collateral_value);

        // converting leftovers back to collateral loses at most one unit per loan
        let remaining: u64 = outcomes.iter().map(|o| o.remaining_value).sum();
        let mut compensated = 0u64;
        for o in &outcomes {
            compensated += value_in_unit_of_account(&feed, &token(), o.borrower_compensation, Direction::Selling, start())
                .unwrap();
        }
        prop_assert!(compensated <= remaining);
        prop_assert!(compensated + outcomes.len() as u64 >= remaining);
    }
}
