use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::trace;

use crate::collateral::fees::platform_fee;
use crate::config::PoolConfig;
use crate::errors::{LendingError, Result};
use crate::interest::accrued_interest;
use crate::math::checked_add;
use crate::types::{LoanId, LoanPosition};

/// what closing a single loan voluntarily costs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepaymentOutcome {
    pub loan_id: LoanId,
    pub principal: u64,
    pub accrued_interest: u64,
    /// principal plus interest, in loan units, paid into the pool
    pub debt_amount: u64,
    /// paid by the borrower to the fee collector, in loan units
    pub platform_fee: u64,
    /// collateral released to the borrower
    pub collateral_released: u64,
}

/// sums the pool update of a batch is built from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SettlementTotals {
    pub principal: u64,
    pub debt: u64,
}

impl SettlementTotals {
    pub fn add(&mut self, principal: u64, debt: u64) -> Result<()> {
        self.principal = checked_add(self.principal, principal, "settled principal")?;
        self.debt = checked_add(self.debt, debt, "settled debt")?;
        Ok(())
    }
}

/// loans in ascending id order, rejecting duplicates and closed loans
pub fn ordered_batch(loans: &[LoanPosition]) -> Result<Vec<&LoanPosition>> {
    let mut seen = HashSet::with_capacity(loans.len());
    for loan in loans {
        if !seen.insert(loan.id) {
            return Err(LendingError::InconsistentSnapshot {
                message: format!("loan {} appears twice in one batch", loan.id),
            });
        }
        loan.ensure_active()?;
    }

    let mut ordered: Vec<&LoanPosition> = loans.iter().collect();
    ordered.sort_by_key(|loan| loan.id);
    Ok(ordered)
}

/// settle one loan repaid by its borrower
pub fn settle_repayment(
    loan: &LoanPosition,
    config: &PoolConfig,
    now: DateTime<Utc>,
) -> Result<RepaymentOutcome> {
    loan.ensure_active()?;

    let interest = accrued_interest(loan, now)?;
    let debt_amount = checked_add(loan.principal, interest, "repayment debt")?;
    let fee = platform_fee(config, loan, interest)?;

    trace!(
        loan_id = %loan.id,
        principal = loan.principal,
        interest,
        platform_fee = fee,
        "settled repayment"
    );

    Ok(RepaymentOutcome {
        loan_id: loan.id,
        principal: loan.principal,
        accrued_interest: interest,
        debt_amount,
        platform_fee: fee,
        collateral_released: loan.collateral_amount,
    })
}

/// settle several repayments against one pool
pub fn repay_batch(
    loans: &[LoanPosition],
    config: &PoolConfig,
    now: DateTime<Utc>,
) -> Result<(Vec<RepaymentOutcome>, SettlementTotals)> {
    let mut totals = SettlementTotals::default();
    let mut outcomes = Vec::with_capacity(loans.len());

    for loan in ordered_batch(loans)? {
        let outcome = settle_repayment(loan, config, now)?;
        totals.add(outcome.principal, outcome.debt_amount)?;
        outcomes.push(outcome);
    }

    Ok((outcomes, totals))
}
