use chrono::{DateTime, Utc};
use hourglass_rs::SafeTimeProvider;

use crate::decimal::Ppm;
use crate::errors::{LendingError, Result};
use crate::math::{mul_div_ceil, to_amount, PPM, SECONDS_PER_YEAR};
use crate::types::LoanPosition;

/// whole seconds between origination and `now`
pub fn elapsed_seconds(origination: DateTime<Utc>, now: DateTime<Utc>) -> Result<u64> {
    if now < origination {
        return Err(LendingError::InvalidTimeRange {
            message: format!("now {} is before origination {}", now, origination),
        });
    }
    // non-negative after the check above
    Ok((now - origination).num_seconds().unsigned_abs())
}

/// simple interest owed on `principal` since `origination`
///
/// Rounded up, and never less than one unit: the validator charges at least
/// one unit even for a loan closed in the block it was opened.
pub fn accrue(
    principal: u64,
    annual_rate: Ppm,
    origination: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Result<u64> {
    let elapsed = elapsed_seconds(origination, now)?;
    let rate_time = u128::from(annual_rate.get()) * u128::from(elapsed);
    let year = u128::from(SECONDS_PER_YEAR) * u128::from(PPM);

    let interest = to_amount(mul_div_ceil(principal, rate_time, year)?, "interest accrual")?;
    Ok(interest.max(1))
}

/// interest a loan owes at `now`
pub fn accrued_interest(loan: &LoanPosition, now: DateTime<Utc>) -> Result<u64> {
    accrue(loan.principal, loan.interest_rate, loan.origination_time, now)
}

/// interest a loan owes at the provider's current time
pub fn accrued_interest_at(loan: &LoanPosition, time_provider: &SafeTimeProvider) -> Result<u64> {
    accrued_interest(loan, time_provider.now())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use hourglass_rs::TimeSource;

    #[test]
    fn test_one_year_simple_interest() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let end = start + Duration::seconds(SECONDS_PER_YEAR as i64);

        let interest = accrue(4_500_000, Ppm::from_percentage(5), start, end).unwrap();
        assert_eq!(interest, 225_000);
    }

    #[test]
    fn test_interest_rounds_up() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        // 1_000_000 * 5% * 1s / year = 0.0015..
        let interest = accrue(1_000_000, Ppm::from_percentage(5), start, start + Duration::seconds(1))
            .unwrap();
        assert_eq!(interest, 1);

        // 100_000_000 * 10% * 1 day / year = 27_397.26..
        let interest = accrue(100_000_000, Ppm::from_percentage(10), start, start + Duration::days(1))
            .unwrap();
        assert_eq!(interest, 27_398);
    }

    #[test]
    fn test_minimum_one_unit() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(accrue(1_000_000, Ppm::from_percentage(5), start, start).unwrap(), 1);
        assert_eq!(accrue(0, Ppm::from_percentage(5), start, start + Duration::days(30)).unwrap(), 1);
    }

    #[test]
    fn test_rejects_time_travel() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let err = accrue(1_000_000, Ppm::from_percentage(5), start, start - Duration::seconds(1))
            .unwrap_err();
        assert!(matches!(err, LendingError::InvalidTimeRange { .. }));
    }

    #[test]
    fn test_accrual_with_time_manipulation() {
        let time = SafeTimeProvider::new(TimeSource::Test(
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
        ));
        let control = time.test_control().unwrap();
        let start = time.now();

        let loan = LoanPosition {
            id: uuid::Uuid::new_v4(),
            principal: 36_500_000,
            interest_rate: Ppm::from_percentage(10),
            origination_time: start,
            collateral_amount: 100_000_000,
            collateral_asset: crate::types::AssetId::native(),
            loan_asset: crate::types::AssetId::new("aa", "bb"),
            status: crate::types::LoanStatus::Active,
            terms: crate::config::PoolConfig::standard().liquidation_terms(),
            pool_balance_at_origination: 100_000_000,
            pool_lent_out_at_origination: 0,
        };

        // advance 10 days: 36_500_000 * 10% * 10 / 365 = 100_000
        control.advance(Duration::days(10));
        assert_eq!(accrued_interest_at(&loan, &time).unwrap(), 100_000);
    }
}
