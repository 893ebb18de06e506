use serde::{Deserialize, Serialize};

use crate::decimal::Ppm;
use crate::errors::{LendingError, Result};
use crate::math::PPM;
use crate::types::LiquidationTerms;

/// pool configuration, updated only by governance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolConfig {
    pub interest: InterestCurve,
    /// fixed fee paid into the pool on every interaction
    pub pool_fee: u64,
    /// cap on the platform fee taken from a loan's interest
    pub min_fee: u64,
    /// deposits and withdrawals must exceed this amount
    pub min_transition: u64,
    pub min_loan: u64,
    /// collateral value / debt value below which a loan is liquidatable
    pub liquidation_threshold: Ppm,
    /// share of the collateral surplus paid to the liquidator
    pub liquidation_fee: Ppm,
    /// collateral value / loan value required to open a loan
    pub initial_collateral_ratio: Ppm,
    pub platform_fees: PlatformFeeSchedule,
}

/// kinked interest curve parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterestCurve {
    pub base_rate: Ppm,
    pub optimal_utilization: Ppm,
    pub slope_below_optimal: Ppm,
    pub slope_above_optimal: Ppm,
}

/// one platform fee tier; applies while utilization is below `threshold`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeTier {
    pub threshold: Ppm,
    /// share of accrued interest
    pub fee: Ppm,
}

/// three ascending platform fee tiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformFeeSchedule {
    pub tiers: [FeeTier; 3],
}

impl PlatformFeeSchedule {
    pub fn new(tier_1: FeeTier, tier_2: FeeTier, tier_3: FeeTier) -> Self {
        Self {
            tiers: [tier_1, tier_2, tier_3],
        }
    }

    /// fee schedule that never charges
    pub fn free() -> Self {
        let tier = FeeTier {
            threshold: Ppm::ONE,
            fee: Ppm::ZERO,
        };
        Self::new(tier, tier, tier)
    }
}

impl PoolConfig {
    /// configuration the protocol deploys pools with
    pub fn standard() -> Self {
        Self {
            interest: InterestCurve {
                base_rate: Ppm::from_percentage(3),
                optimal_utilization: Ppm::from_percentage(60),
                slope_below_optimal: Ppm::new(75_000),
                slope_above_optimal: Ppm::new(300_000),
            },
            pool_fee: 2_000_000,
            min_fee: 9_000_000,
            min_transition: 200,
            min_loan: 2_000_000,
            liquidation_threshold: Ppm::from_percentage(120),
            liquidation_fee: Ppm::from_percentage(25),
            initial_collateral_ratio: Ppm::from_percentage(150),
            platform_fees: PlatformFeeSchedule::new(
                FeeTier {
                    threshold: Ppm::from_percentage(25),
                    fee: Ppm::from_percentage(10),
                },
                FeeTier {
                    threshold: Ppm::from_percentage(50),
                    fee: Ppm::from_percentage(45),
                },
                FeeTier {
                    threshold: Ppm::ONE,
                    fee: Ppm::from_percentage(60),
                },
            ),
        }
    }

    /// configuration without any fees, for pricing pure pool arithmetic
    pub fn fee_free() -> Self {
        Self {
            pool_fee: 0,
            min_fee: 0,
            platform_fees: PlatformFeeSchedule::free(),
            ..Self::standard()
        }
    }

    /// load from json and validate
    pub fn from_json(json: &str) -> Result<Self> {
        let config: PoolConfig =
            serde_json::from_str(json).map_err(|e| LendingError::InvalidConfiguration {
                message: e.to_string(),
            })?;
        config.validate()?;
        Ok(config)
    }

    /// liquidation terms a new loan locks in
    pub fn liquidation_terms(&self) -> LiquidationTerms {
        LiquidationTerms {
            threshold: self.liquidation_threshold,
            fee: self.liquidation_fee,
        }
    }

    /// check parameters the engine divides by or compares against
    pub fn validate(&self) -> Result<()> {
        if self.interest.optimal_utilization.get() > PPM {
            return Err(LendingError::InvalidConfiguration {
                message: format!(
                    "optimal utilization {} exceeds 100%",
                    self.interest.optimal_utilization
                ),
            });
        }

        if self.liquidation_threshold == Ppm::ZERO {
            return Err(LendingError::InvalidConfiguration {
                message: "liquidation threshold cannot be zero".to_string(),
            });
        }

        if self.liquidation_fee.get() > PPM {
            return Err(LendingError::InvalidConfiguration {
                message: format!("liquidation fee {} exceeds 100%", self.liquidation_fee),
            });
        }

        let tiers = &self.platform_fees.tiers;
        if tiers.windows(2).any(|pair| pair[0].threshold > pair[1].threshold) {
            return Err(LendingError::InvalidConfiguration {
                message: "platform fee thresholds must be ascending".to_string(),
            });
        }

        if tiers.iter().any(|tier| tier.fee.get() > PPM) {
            return Err(LendingError::InvalidConfiguration {
                message: "platform fee cannot exceed 100% of interest".to_string(),
            });
        }

        Ok(())
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_are_valid() {
        assert!(PoolConfig::standard().validate().is_ok());
        assert!(PoolConfig::fee_free().validate().is_ok());
        assert_eq!(PoolConfig::fee_free().pool_fee, 0);
        assert_eq!(PoolConfig::default(), PoolConfig::standard());
    }

    #[test]
    fn test_rejects_descending_tiers() {
        let mut config = PoolConfig::standard();
        config.platform_fees.tiers[1].threshold = Ppm::from_percentage(10);

        let err = config.validate().unwrap_err();
        assert!(matches!(err, LendingError::InvalidConfiguration { .. }));
    }

    #[test]
    fn test_rejects_zero_threshold() {
        let mut config = PoolConfig::standard();
        config.liquidation_threshold = Ppm::ZERO;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_json_round_trip() {
        let config = PoolConfig::standard();
        let json = serde_json::to_string(&config).unwrap();
        let loaded = PoolConfig::from_json(&json).unwrap();
        assert_eq!(loaded, config);

        // ppm values are plain integers on the wire
        assert!(json.contains("\"liquidation_fee\":250000"));
    }

    #[test]
    fn test_json_rejects_garbage() {
        let err = PoolConfig::from_json("{\"pool_fee\": 1}").unwrap_err();
        assert!(matches!(err, LendingError::InvalidConfiguration { .. }));
    }
}
