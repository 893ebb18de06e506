use thiserror::Error;
use uuid::Uuid;

use crate::decimal::Ppm;
use crate::types::{AssetId, LoanStatus};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LendingError {
    #[error("arithmetic overflow while computing {operation}")]
    ArithmeticOverflow {
        operation: &'static str,
    },

    #[error("division by zero while computing {operation}")]
    DivisionByZero {
        operation: &'static str,
    },

    #[error("amount {amount} does not exceed the minimum transition {minimum}")]
    BelowMinimumTransition {
        minimum: u64,
        amount: u64,
    },

    #[error("share request {requested} exceeds the allowed bound {bound}")]
    ExcessiveShareRequest {
        bound: u64,
        requested: u64,
    },

    #[error("invalid time range: {message}")]
    InvalidTimeRange {
        message: String,
    },

    #[error("oracle quote for {asset} expired at {valid_until}, now {now}")]
    OracleExpired {
        asset: AssetId,
        valid_until: chrono::DateTime<chrono::Utc>,
        now: chrono::DateTime<chrono::Utc>,
    },

    #[error("asset {asset} not present in price feed")]
    AssetNotInFeed {
        asset: AssetId,
    },

    #[error("invalid price feed shape: {message}")]
    InvalidFeedShape {
        message: String,
    },

    #[error("loan {loan_id} is not liquidatable: health factor {health_factor} >= 1")]
    Overcollateralized {
        loan_id: Uuid,
        health_factor: rust_decimal::Decimal,
    },

    #[error("loan {loan_id} owes borrower compensation of {owed} that cannot be suppressed")]
    BorrowerCompensationOwed {
        loan_id: Uuid,
        owed: u64,
    },

    #[error("loan amount below minimum: minimum {minimum}, requested {requested}")]
    BelowMinimumLoan {
        minimum: u64,
        requested: u64,
    },

    #[error("insufficient pool balance: available {available}, requested {requested}")]
    InsufficientPoolBalance {
        available: u64,
        requested: u64,
    },

    #[error("insufficient collateral: ratio {ratio} below required {required}")]
    InsufficientCollateral {
        ratio: Ppm,
        required: Ppm,
    },

    #[error("pool reserve of {reserve} cannot cover {requested}")]
    ReserveExhausted {
        reserve: u64,
        requested: u64,
    },

    #[error("loan {loan_id} not active: current status is {status:?}")]
    LoanNotActive {
        loan_id: Uuid,
        status: LoanStatus,
    },

    #[error("asset mismatch: expected {expected}, found {found}")]
    AssetMismatch {
        expected: AssetId,
        found: AssetId,
    },

    #[error("inconsistent pool snapshot: {message}")]
    InconsistentSnapshot {
        message: String,
    },

    #[error("invalid configuration: {message}")]
    InvalidConfiguration {
        message: String,
    },
}

impl LendingError {
    /// whether refetching fresh ledger state or a fresh quote may resolve the failure
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            LendingError::OracleExpired { .. }
                | LendingError::InsufficientPoolBalance { .. }
                | LendingError::LoanNotActive { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, LendingError>;
