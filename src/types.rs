use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::decimal::Ppm;
use crate::errors::{LendingError, Result};

/// unique identifier for a loan; batches are settled in ascending id order
pub type LoanId = Uuid;

/// ledger asset identity; an empty policy and name is the native currency
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub struct AssetId {
    pub policy_id: String,
    pub asset_name: String,
}

impl AssetId {
    pub fn new(policy_id: impl Into<String>, asset_name: impl Into<String>) -> Self {
        Self {
            policy_id: policy_id.into(),
            asset_name: asset_name.into(),
        }
    }

    /// the ledger's native currency, which is also the unit of account
    pub fn native() -> Self {
        Self::default()
    }

    pub fn is_native(&self) -> bool {
        self.policy_id.is_empty() && self.asset_name.is_empty()
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_native() {
            write!(f, "native")
        } else {
            write!(f, "{}.{}", self.policy_id, self.asset_name)
        }
    }
}

/// loan lifecycle; both closed states are terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoanStatus {
    Active,
    Repaid,
    Liquidated,
}

/// pool record as of one ledger reference point
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolSnapshot {
    /// loanable funds idle in the pool
    pub balance: u64,
    /// principal currently on loan
    pub lent_out: u64,
    /// claim tokens outstanding
    pub total_shares: u64,
    pub asset: AssetId,
    pub collateral_asset: AssetId,
    pub config_ref: String,
}

impl PoolSnapshot {
    /// create an empty pool
    pub fn open(asset: AssetId, collateral_asset: AssetId, config_ref: impl Into<String>) -> Self {
        Self {
            balance: 0,
            lent_out: 0,
            total_shares: 0,
            asset,
            collateral_asset,
            config_ref: config_ref.into(),
        }
    }

    /// balance plus lent out
    pub fn total_value(&self) -> Result<u64> {
        self.balance
            .checked_add(self.lent_out)
            .ok_or(LendingError::ArithmeticOverflow {
                operation: "pool total value",
            })
    }

    /// outstanding shares must be backed by pool value
    ///
    /// The reverse case, value without shares, is tolerated: pool fees paid
    /// by the last withdrawal stay behind and seed the next bootstrap deposit.
    pub fn validate(&self) -> Result<()> {
        let value = self.total_value()?;
        if self.total_shares != 0 && value == 0 {
            return Err(LendingError::InconsistentSnapshot {
                message: format!("{} shares outstanding against an empty pool", self.total_shares),
            });
        }
        Ok(())
    }
}

/// liquidation parameters copied into the loan when it is opened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidationTerms {
    pub threshold: Ppm,
    pub fee: Ppm,
}

/// open or closed loan against a pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanPosition {
    pub id: LoanId,
    pub principal: u64,
    /// annual rate locked at origination
    pub interest_rate: Ppm,
    pub origination_time: DateTime<Utc>,
    pub collateral_amount: u64,
    pub collateral_asset: AssetId,
    pub loan_asset: AssetId,
    pub status: LoanStatus,
    pub terms: LiquidationTerms,
    /// pool figures before the loan was taken, used for fee tiers
    pub pool_balance_at_origination: u64,
    pub pool_lent_out_at_origination: u64,
}

impl LoanPosition {
    pub fn is_active(&self) -> bool {
        self.status == LoanStatus::Active
    }

    /// fail unless the loan can still be closed
    pub fn ensure_active(&self) -> Result<()> {
        if self.is_active() {
            Ok(())
        } else {
            Err(LendingError::LoanNotActive {
                loan_id: self.id,
                status: self.status,
            })
        }
    }

    /// copy of this loan in a terminal state
    pub fn closed(&self, status: LoanStatus) -> Self {
        Self {
            status,
            ..self.clone()
        }
    }
}
