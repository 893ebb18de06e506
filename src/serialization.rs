/// json import of ledger records and human-readable views of results
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::collateral::LiquidationOutcome;
use crate::effects::Effect;
use crate::errors::{LendingError, Result};
use crate::interest::{accrued_interest, utilization};
use crate::projector::Projection;
use crate::types::{AssetId, LoanId, LoanPosition, LoanStatus, PoolSnapshot};

/// decode and validate a pool snapshot handed over by the ledger reader
pub fn snapshot_from_json(json: &str) -> Result<PoolSnapshot> {
    let snapshot: PoolSnapshot = serde_json::from_str(json).map_err(|e| LendingError::InconsistentSnapshot {
        message: e.to_string(),
    })?;
    snapshot.validate()?;
    Ok(snapshot)
}

/// decode loan records handed over by the ledger reader
pub fn loans_from_json(json: &str) -> Result<Vec<LoanPosition>> {
    serde_json::from_str(json).map_err(|e| LendingError::InconsistentSnapshot {
        message: e.to_string(),
    })
}

/// serializable view of a pool
#[derive(Debug, Serialize, Deserialize)]
pub struct PoolView {
    pub asset: AssetId,
    pub collateral_asset: AssetId,
    pub balance: u64,
    pub lent_out: u64,
    pub total_shares: u64,
    pub total_value: u64,
    /// percent
    pub utilization: Decimal,
    /// pool value per share
    pub share_price: Decimal,
}

impl PoolView {
    pub fn from_snapshot(snapshot: &PoolSnapshot) -> Result<Self> {
        let total_value = snapshot.total_value()?;
        let utilization = if total_value == 0 {
            Decimal::ZERO
        } else {
            utilization(snapshot, 0)?.as_percentage()
        };
        let share_price = if snapshot.total_shares == 0 {
            Decimal::ONE
        } else {
            (Decimal::from(total_value) / Decimal::from(snapshot.total_shares))
                .round_dp(6)
                .normalize()
        };

        Ok(PoolView {
            asset: snapshot.asset.clone(),
            collateral_asset: snapshot.collateral_asset.clone(),
            balance: snapshot.balance,
            lent_out: snapshot.lent_out,
            total_shares: snapshot.total_shares,
            total_value,
            utilization,
            share_price,
        })
    }

    /// convert to pretty-printed json string
    pub fn to_json_pretty(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// serializable view of a loan as of a point in time
#[derive(Debug, Serialize, Deserialize)]
pub struct LoanView {
    pub id: LoanId,
    pub status: LoanStatus,
    pub principal: u64,
    /// annual, percent
    pub interest_rate: Decimal,
    pub accrued_interest: u64,
    pub debt: u64,
    pub collateral_amount: u64,
    pub as_of: DateTime<Utc>,
}

impl LoanView {
    pub fn from_loan(loan: &LoanPosition, now: DateTime<Utc>) -> Result<Self> {
        let interest = accrued_interest(loan, now)?;
        Ok(LoanView {
            id: loan.id,
            status: loan.status,
            principal: loan.principal,
            interest_rate: loan.interest_rate.as_percentage(),
            accrued_interest: interest,
            debt: loan.principal.saturating_add(interest),
            collateral_amount: loan.collateral_amount,
            as_of: now,
        })
    }
}

/// serializable view of a liquidation
#[derive(Debug, Serialize, Deserialize)]
pub struct LiquidationView {
    pub loan_id: LoanId,
    pub health_factor: Decimal,
    pub debt_value: u64,
    pub collateral_value: u64,
    pub liquidator_fee: u64,
    pub platform_fee: u64,
    pub borrower_compensation: u64,
    pub protocol_claim: u64,
}

impl From<&LiquidationOutcome> for LiquidationView {
    fn from(outcome: &LiquidationOutcome) -> Self {
        LiquidationView {
            loan_id: outcome.loan_id,
            health_factor: outcome.health_factor.as_decimal(),
            debt_value: outcome.debt_value,
            collateral_value: outcome.collateral_value,
            liquidator_fee: outcome.liquidator_fee,
            platform_fee: outcome.platform_fee,
            borrower_compensation: outcome.borrower_compensation,
            protocol_claim: outcome.protocol_claim,
        }
    }
}

/// before and after views of a projected action
#[derive(Debug, Serialize, Deserialize)]
pub struct ProjectionView {
    pub before: PoolView,
    pub after: PoolView,
    pub effects: Vec<Effect>,
    pub loans: Vec<LoanId>,
}

impl ProjectionView {
    pub fn new(before: &PoolSnapshot, projection: &Projection) -> Result<Self> {
        Ok(ProjectionView {
            before: PoolView::from_snapshot(before)?,
            after: PoolView::from_snapshot(&projection.next)?,
            effects: projection.effects.clone(),
            loans: projection.loans.iter().map(|loan| loan.id).collect(),
        })
    }

    /// convert to pretty-printed json string
    pub fn to_json_pretty(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
