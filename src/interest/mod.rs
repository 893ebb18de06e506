pub mod accrual;
pub mod rate;

pub use accrual::{accrue, accrued_interest, accrued_interest_at, elapsed_seconds};
pub use rate::{interest_rate, rate_for_utilization, utilization};
