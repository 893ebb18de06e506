use crate::decimal::{HealthFactor, Ppm};
use crate::errors::Result;
use crate::math::{mul_div_floor, to_amount, PPM};

/// health factor of a position, both values in the unit of account
pub fn health_factor(collateral_value: u64, debt_value: u64, threshold: Ppm) -> Result<HealthFactor> {
    let scaled_ratio = mul_div_floor(collateral_value, PPM, debt_value)?;
    Ok(HealthFactor::new(scaled_ratio, threshold))
}

/// collateral value / debt value in ppm, as checked when a loan is opened
pub fn collateral_ratio(collateral_value: u64, debt_value: u64) -> Result<Ppm> {
    let ratio = mul_div_floor(collateral_value, PPM, debt_value)?;
    Ok(Ppm::new(to_amount(ratio, "collateral ratio")?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::LendingError;

    #[test]
    fn test_health_factor_at_threshold() {
        // 120 / 100 against a 120% threshold is exactly one
        let hf = health_factor(1_200, 1_000, Ppm::from_percentage(120)).unwrap();
        assert_eq!(hf.scaled_ratio, 1_200_000);
        assert!(!hf.is_liquidatable());

        let hf = health_factor(1_199, 1_000, Ppm::from_percentage(120)).unwrap();
        assert!(hf.is_liquidatable());
    }

    #[test]
    fn test_zero_debt() {
        let err = health_factor(1_000, 0, Ppm::from_percentage(120)).unwrap_err();
        assert!(matches!(err, LendingError::DivisionByZero { .. }));
    }

    #[test]
    fn test_collateral_ratio_overflow() {
        assert_eq!(collateral_ratio(150, 100).unwrap(), Ppm::from_percentage(150));
        assert_eq!(
            collateral_ratio(u64::MAX, 1).unwrap_err(),
            LendingError::ArithmeticOverflow { operation: "collateral ratio" }
        );
    }
}
