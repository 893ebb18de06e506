use serde::{Deserialize, Serialize};

use crate::errors::Result;
use crate::math::checked_add;
use crate::types::{AssetId, LoanId};

/// party a value movement is addressed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Pool,
    Depositor,
    Borrower,
    Liquidator,
    PlatformFeeCollector,
    LeftoverClaim,
}

/// how the value moves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Flow {
    /// paid by the caller into the pool
    IntoPool,
    /// paid out of the pool to the role
    OutOfPool,
    /// paid by the caller directly to the role
    PaidByCaller,
    /// taken from the caller and locked against a loan
    Locked,
    /// freed from a closed loan's collateral
    Released,
    /// claim tokens minted to the role
    Minted,
    /// claim tokens burned by the role
    Burned,
}

/// unit of an effect
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Unit {
    Asset(AssetId),
    /// the pool's claim token
    Shares,
}

/// one value movement the transaction builder turns into an output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Effect {
    pub role: Role,
    pub flow: Flow,
    pub unit: Unit,
    pub amount: u64,
    /// loan the movement belongs to, if any
    pub loan_id: Option<LoanId>,
}

impl Effect {
    pub fn asset(role: Role, flow: Flow, asset: &AssetId, amount: u64) -> Self {
        Self {
            role,
            flow,
            unit: Unit::Asset(asset.clone()),
            amount,
            loan_id: None,
        }
    }

    pub fn shares(role: Role, flow: Flow, amount: u64) -> Self {
        Self {
            role,
            flow,
            unit: Unit::Shares,
            amount,
            loan_id: None,
        }
    }

    pub fn for_loan(mut self, loan_id: LoanId) -> Self {
        self.loan_id = Some(loan_id);
        self
    }
}

/// effects collected while projecting one action; empty movements are dropped
#[derive(Debug, Default)]
pub struct EffectLog {
    effects: Vec<Effect>,
}

impl EffectLog {
    pub fn new() -> Self {
        Self {
            effects: Vec::new(),
        }
    }

    pub fn emit(&mut self, effect: Effect) {
        if effect.amount > 0 {
            self.effects.push(effect);
        }
    }

    pub fn effects(&self) -> &[Effect] {
        &self.effects
    }

    pub fn into_effects(self) -> Vec<Effect> {
        self.effects
    }
}

/// total amount a role receives in `unit` across `effects`
pub fn total_for(effects: &[Effect], role: Role, unit: &Unit) -> Result<u64> {
    effects
        .iter()
        .filter(|e| e.role == role && &e.unit == unit)
        .try_fold(0u64, |acc, e| checked_add(acc, e.amount, "effect total"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_amounts_are_dropped() {
        let mut log = EffectLog::new();
        log.emit(Effect::asset(Role::Pool, Flow::IntoPool, &AssetId::native(), 0));
        log.emit(Effect::shares(Role::Depositor, Flow::Minted, 10));
        assert_eq!(log.effects().len(), 1);
    }

    #[test]
    fn test_totals_by_role() {
        let native = Unit::Asset(AssetId::native());
        let effects = vec![
            Effect::asset(Role::Pool, Flow::IntoPool, &AssetId::native(), 10),
            Effect::asset(Role::Pool, Flow::IntoPool, &AssetId::native(), 5),
            Effect::asset(Role::Borrower, Flow::Released, &AssetId::native(), 7),
            Effect::shares(Role::Pool, Flow::Minted, 100),
        ];
        assert_eq!(total_for(&effects, Role::Pool, &native).unwrap(), 15);
        assert_eq!(total_for(&effects, Role::Pool, &Unit::Shares).unwrap(), 100);
    }

    #[test]
    fn test_total_overflow_is_reported() {
        let effects = vec![
            Effect::shares(Role::Depositor, Flow::Minted, u64::MAX),
            Effect::shares(Role::Depositor, Flow::Minted, 1),
        ];
        let err = total_for(&effects, Role::Depositor, &Unit::Shares).unwrap_err();
        assert!(matches!(err, crate::errors::LendingError::ArithmeticOverflow { .. }));
    }
}
