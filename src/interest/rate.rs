use crate::config::InterestCurve;
use crate::decimal::Ppm;
use crate::errors::Result;
use crate::math::{checked_add, mul_div_floor, to_amount, PPM};
use crate::types::PoolSnapshot;

/// share of pool value on loan once `loan_amount` is added to `lent_out`
pub fn utilization(pool: &PoolSnapshot, loan_amount: u64) -> Result<Ppm> {
    let on_loan = checked_add(pool.lent_out, loan_amount, "utilization")?;
    let value = pool.total_value()?;
    let ratio = mul_div_floor(on_loan, PPM, value)?;
    Ok(Ppm::new(to_amount(ratio, "utilization")?))
}

/// annual borrow rate from the kinked curve
///
/// Each product is floored on its own before being summed, so the rate may
/// sit a unit below the one obtained by flooring the exact sum.
pub fn rate_for_utilization(curve: &InterestCurve, utilization: Ppm) -> Result<Ppm> {
    let base = curve.base_rate.get();
    let u = utilization.get();
    let optimal = curve.optimal_utilization.get();

    let rate = if u <= optimal {
        let charge = to_amount(
            mul_div_floor(u, curve.slope_below_optimal.get(), PPM)?,
            "interest rate",
        )?;
        checked_add(base, charge, "interest rate")?
    } else {
        let low = to_amount(
            mul_div_floor(optimal, curve.slope_below_optimal.get(), PPM)?,
            "interest rate",
        )?;
        let high = to_amount(
            mul_div_floor(u - optimal, curve.slope_above_optimal.get(), PPM)?,
            "interest rate",
        )?;
        checked_add(checked_add(base, low, "interest rate")?, high, "interest rate")?
    };

    Ok(Ppm::new(rate))
}

/// annual rate a loan of `loan_amount` is priced at against `pool`
pub fn interest_rate(curve: &InterestCurve, loan_amount: u64, pool: &PoolSnapshot) -> Result<Ppm> {
    let u = utilization(pool, loan_amount)?;
    rate_for_utilization(curve, u)
}
