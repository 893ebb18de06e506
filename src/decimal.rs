use num_traits::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::math::PPM;

/// rate or percentage in parts-per-million (1_000_000 = 100%)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct Ppm(u64);

impl Ppm {
    pub const ZERO: Ppm = Ppm(0);
    pub const ONE: Ppm = Ppm(PPM);

    /// create from raw parts-per-million
    pub const fn new(ppm: u64) -> Self {
        Ppm(ppm)
    }

    /// create from percentage (e.g., 5 for 5%)
    pub const fn from_percentage(p: u64) -> Self {
        Ppm(p * 10_000)
    }

    /// create from basis points (e.g., 500 for 5%)
    pub const fn from_bps(bps: u64) -> Self {
        Ppm(bps * 100)
    }

    /// raw parts-per-million
    pub const fn get(self) -> u64 {
        self.0
    }

    /// as decimal fraction (0.05 for 5%), for display only
    pub fn as_decimal(&self) -> Decimal {
        Decimal::from(self.0) / Decimal::from(PPM)
    }

    /// as percentage (5 for 5%), for display only
    pub fn as_percentage(&self) -> Decimal {
        Decimal::from(self.0) / Decimal::from(10_000u64)
    }
}

impl fmt::Display for Ppm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.as_percentage().normalize())
    }
}

impl From<u64> for Ppm {
    fn from(ppm: u64) -> Self {
        Ppm(ppm)
    }
}

/// health factor kept as the exact ratio the validator compares
///
/// `scaled_ratio` is floor(collateral_value * 1e6 / debt_value) and
/// `threshold` the liquidation threshold in ppm. The position is
/// liquidatable when `scaled_ratio / threshold < 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthFactor {
    pub scaled_ratio: u128,
    pub threshold: Ppm,
}

impl HealthFactor {
    pub fn new(scaled_ratio: u128, threshold: Ppm) -> Self {
        Self {
            scaled_ratio,
            threshold,
        }
    }

    /// below one
    pub fn is_liquidatable(&self) -> bool {
        self.scaled_ratio < u128::from(self.threshold.get())
    }

    /// as decimal, truncated to six places, for display only
    pub fn as_decimal(&self) -> Decimal {
        let ratio = Decimal::from_u128(self.scaled_ratio).unwrap_or(Decimal::MAX);
        ratio
            .checked_div(Decimal::from(self.threshold.get()))
            .unwrap_or(Decimal::MAX)
            .round_dp_with_strategy(6, RoundingStrategy::ToZero)
    }
}

impl fmt::Display for HealthFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_decimal())
    }
}
