pub mod collateral;
pub mod config;
pub mod decimal;
pub mod effects;
pub mod errors;
pub mod interest;
pub mod liquidity;
pub mod math;
pub mod oracle;
pub mod projector;
pub mod serialization;
pub mod types;

// re-export key types
pub use collateral::{CompensationPolicy, LiquidationOutcome, RepaymentOutcome};
pub use config::{FeeTier, InterestCurve, PlatformFeeSchedule, PoolConfig};
pub use decimal::{HealthFactor, Ppm};
pub use effects::{Effect, Flow, Role, Unit};
pub use errors::{LendingError, Result};
pub use liquidity::ShareQuote;
pub use oracle::{AggregatedQuote, Direction, PooledQuote, PriceFeed};
pub use projector::{
    borrow, deposit, liquidate, project, repay, sweep_fees, withdraw, ActionDetail, PoolAction,
    Projection, ProjectionContext, WithdrawRequest,
};
pub use types::{AssetId, LiquidationTerms, LoanId, LoanPosition, LoanStatus, PoolSnapshot};

// re-export external dependencies that users will need
pub use chrono;
pub use hourglass_rs::{SafeTimeProvider, TimeSource};
pub use rust_decimal::Decimal;
pub use uuid::Uuid;
