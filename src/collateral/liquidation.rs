use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{trace, warn};

use crate::collateral::fees::{liquidator_fee, platform_fee};
use crate::collateral::health::health_factor;
use crate::collateral::settlement::{ordered_batch, SettlementTotals};
use crate::config::PoolConfig;
use crate::decimal::HealthFactor;
use crate::errors::{LendingError, Result};
use crate::interest::accrued_interest;
use crate::math::{checked_add, checked_sub};
use crate::oracle::{asset_amount_or_raw, value_or_raw, Direction, PriceFeed};
use crate::types::{LoanId, LoanPosition};

/// where collateral left after debt and liquidator fee goes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CompensationPolicy {
    /// pay it to the borrower directly
    #[default]
    PayBorrower,
    /// lock it in a leftover claim the borrower collects later
    LeftoverClaim,
    /// omit the output; only accepted when nothing is owed
    Suppress,
}

/// exact split of a liquidated position
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidationOutcome {
    pub loan_id: LoanId,
    pub principal: u64,
    pub accrued_interest: u64,
    /// principal plus interest, in loan units
    pub debt_amount: u64,
    pub debt_value: u64,
    pub collateral_value: u64,
    pub health_factor: HealthFactor,
    /// unit of account
    pub liquidator_fee: u64,
    /// loan units, taken from the interest
    pub platform_fee: u64,
    /// unit of account
    pub remaining_value: u64,
    /// collateral units paid to the borrower
    pub borrower_compensation: u64,
    /// collateral units locked for later collection
    pub protocol_claim: u64,
    /// collateral units the liquidator walks away with
    pub liquidator_collateral: u64,
}

/// feeds and policy a liquidation is priced with
#[derive(Debug, Clone, Copy)]
pub struct LiquidationPricing<'a> {
    pub loan_feed: Option<&'a PriceFeed>,
    pub collateral_feed: Option<&'a PriceFeed>,
    pub policy: CompensationPolicy,
    pub now: DateTime<Utc>,
}

/// price the liquidation of one loan
pub fn assess_liquidation(
    loan: &LoanPosition,
    config: &PoolConfig,
    pricing: &LiquidationPricing<'_>,
) -> Result<LiquidationOutcome> {
    loan.ensure_active()?;
    let now = pricing.now;

    let interest = accrued_interest(loan, now)?;
    let debt_amount = checked_add(loan.principal, interest, "liquidation debt")?;
    let debt_value = value_or_raw(pricing.loan_feed, &loan.loan_asset, debt_amount, Direction::Buying, now)?;
    let collateral_value = value_or_raw(
        pricing.collateral_feed,
        &loan.collateral_asset,
        loan.collateral_amount,
        Direction::Selling,
        now,
    )?;

    let hf = health_factor(collateral_value, debt_value, loan.terms.threshold)?;
    trace!(
        loan_id = %loan.id,
        debt_value,
        collateral_value,
        health_factor = %hf,
        "assessed position"
    );

    if !hf.is_liquidatable() {
        warn!(loan_id = %loan.id, health_factor = %hf, "refusing to liquidate healthy loan");
        return Err(LendingError::Overcollateralized {
            loan_id: loan.id,
            health_factor: hf.as_decimal(),
        });
    }

    let fee = liquidator_fee(collateral_value, debt_value, loan.terms.fee)?;
    let remaining_value = if collateral_value > debt_value {
        checked_sub(collateral_value - debt_value, fee, "remaining collateral value")?
    } else {
        0
    };
    let owed = if remaining_value > 0 {
        asset_amount_or_raw(pricing.collateral_feed, &loan.collateral_asset, remaining_value, now)?
    } else {
        0
    };

    let (borrower_compensation, protocol_claim) = match pricing.policy {
        CompensationPolicy::PayBorrower => (owed, 0),
        CompensationPolicy::LeftoverClaim => (0, owed),
        CompensationPolicy::Suppress if owed > 0 => {
            warn!(loan_id = %loan.id, owed, "borrower compensation cannot be suppressed");
            return Err(LendingError::BorrowerCompensationOwed {
                loan_id: loan.id,
                owed,
            });
        }
        CompensationPolicy::Suppress => (0, 0),
    };
    let liquidator_collateral = checked_sub(loan.collateral_amount, owed, "liquidator collateral")?;

    let platform_fee = platform_fee(config, loan, interest)?;

    trace!(
        loan_id = %loan.id,
        liquidator_fee = fee,
        platform_fee,
        remaining_value,
        owed,
        "split liquidated collateral"
    );

    Ok(LiquidationOutcome {
        loan_id: loan.id,
        principal: loan.principal,
        accrued_interest: interest,
        debt_amount,
        debt_value,
        collateral_value,
        health_factor: hf,
        liquidator_fee: fee,
        platform_fee,
        remaining_value,
        borrower_compensation,
        protocol_claim,
        liquidator_collateral,
    })
}

/// price the liquidation of several loans against one pool, in id order
///
/// The whole batch fails if any loan is healthy or closed.
pub fn liquidate_batch(
    loans: &[LoanPosition],
    config: &PoolConfig,
    pricing: &LiquidationPricing<'_>,
) -> Result<(Vec<LiquidationOutcome>, SettlementTotals)> {
    let mut totals = SettlementTotals::default();
    let mut outcomes = Vec::with_capacity(loans.len());

    for loan in ordered_batch(loans)? {
        let outcome = assess_liquidation(loan, config, pricing)?;
        totals.add(outcome.principal, outcome.debt_amount)?;
        outcomes.push(outcome);
    }

    Ok((outcomes, totals))
}
