use crate::config::{PlatformFeeSchedule, PoolConfig};
use crate::decimal::Ppm;
use crate::errors::Result;
use crate::math::{checked_add, mul_div_floor, to_amount, PPM};
use crate::types::LoanPosition;

/// utilization the loan represented against the pool it was taken from
///
/// Uses the pool figures recorded before the loan was opened, so the tier
/// is fixed for the life of the loan.
pub fn origination_utilization(loan: &LoanPosition) -> Result<Ppm> {
    let pool_value = checked_add(
        loan.pool_lent_out_at_origination,
        loan.pool_balance_at_origination,
        "platform fee utilization",
    )?;
    let ratio = mul_div_floor(loan.principal, PPM, pool_value)?;
    Ok(Ppm::new(to_amount(ratio, "platform fee utilization")?))
}

/// fee rate of the first tier whose threshold exceeds `utilization`, else the last
pub fn select_tier(schedule: &PlatformFeeSchedule, utilization: Ppm) -> Ppm {
    let [first, second, third] = schedule.tiers;
    if utilization < first.threshold {
        first.fee
    } else if utilization < second.threshold {
        second.fee
    } else {
        third.fee
    }
}

/// platform fee taken from a loan's accrued interest, capped at `min_fee`
pub fn platform_fee(config: &PoolConfig, loan: &LoanPosition, accrued_interest: u64) -> Result<u64> {
    let rate = select_tier(&config.platform_fees, origination_utilization(loan)?);
    let fee = to_amount(mul_div_floor(accrued_interest, rate.get(), PPM)?, "platform fee")?;
    Ok(fee.min(config.min_fee))
}

/// liquidator's share of the collateral surplus; nothing when there is none
pub fn liquidator_fee(collateral_value: u64, debt_value: u64, fee: Ppm) -> Result<u64> {
    if collateral_value <= debt_value {
        return Ok(0);
    }
    let surplus = collateral_value - debt_value;
    to_amount(mul_div_floor(surplus, fee.get(), PPM)?, "liquidator fee")
}
