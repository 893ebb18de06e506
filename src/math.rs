/// exact integer arithmetic; rates and percentages are scaled by `PPM`
use num_bigint::BigUint;
use num_traits::{ToPrimitive, Zero};

use crate::errors::{LendingError, Result};

/// parts-per-million denominator for rates and percentages
pub const PPM: u64 = 1_000_000;

/// seconds in a 365 day year
pub const SECONDS_PER_YEAR: u64 = 31_536_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rounding {
    Floor,
    Ceil,
}

/// a * b / c rounded toward negative infinity
pub fn mul_div_floor(a: impl Into<u128>, b: impl Into<u128>, c: impl Into<u128>) -> Result<u128> {
    mul_div(a.into(), b.into(), c.into(), Rounding::Floor)
}

/// a * b / c rounded toward positive infinity
pub fn mul_div_ceil(a: impl Into<u128>, b: impl Into<u128>, c: impl Into<u128>) -> Result<u128> {
    mul_div(a.into(), b.into(), c.into(), Rounding::Ceil)
}

fn mul_div(a: u128, b: u128, c: u128, rounding: Rounding) -> Result<u128> {
    if c == 0 {
        return Err(LendingError::DivisionByZero {
            operation: "mul_div",
        });
    }

    if let Some(product) = a.checked_mul(b) {
        let quotient = product / c;
        let bump = rounding == Rounding::Ceil && product % c != 0;
        return Ok(if bump { quotient + 1 } else { quotient });
    }

    // wide path
    let product = BigUint::from(a) * BigUint::from(b);
    let divisor = BigUint::from(c);
    let mut quotient = &product / &divisor;
    if rounding == Rounding::Ceil && !(&product % &divisor).is_zero() {
        quotient += 1u32;
    }

    quotient.to_u128().ok_or(LendingError::ArithmeticOverflow {
        operation: "mul_div",
    })
}

/// narrow a wide intermediate back to a ledger quantity
pub fn to_amount(value: u128, operation: &'static str) -> Result<u64> {
    u64::try_from(value).map_err(|_| LendingError::ArithmeticOverflow { operation })
}

pub fn checked_add(a: u64, b: u64, operation: &'static str) -> Result<u64> {
    a.checked_add(b)
        .ok_or(LendingError::ArithmeticOverflow { operation })
}

pub fn checked_sub(a: u64, b: u64, operation: &'static str) -> Result<u64> {
    a.checked_sub(b)
        .ok_or(LendingError::ArithmeticOverflow { operation })
}
