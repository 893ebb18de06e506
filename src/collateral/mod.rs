pub mod fees;
pub mod health;
pub mod liquidation;
pub mod settlement;

pub use fees::{liquidator_fee, origination_utilization, platform_fee, select_tier};
pub use health::{collateral_ratio, health_factor};
pub use liquidation::{
    assess_liquidation, liquidate_batch, CompensationPolicy, LiquidationOutcome, LiquidationPricing,
};
pub use settlement::{ordered_batch, repay_batch, settle_repayment, RepaymentOutcome, SettlementTotals};
