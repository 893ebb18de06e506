/// claim-token accounting for deposits and withdrawals, rounded in the pool's favour
use serde::{Deserialize, Serialize};

use crate::errors::{LendingError, Result};
use crate::math::{mul_div_floor, to_amount};
use crate::types::PoolSnapshot;

/// shares moved and the asset amount the validator expects for them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareQuote {
    pub shares: u64,
    pub amount: u64,
}

fn ensure_above_minimum(amount: u64, min_transition: u64) -> Result<()> {
    if amount <= min_transition {
        return Err(LendingError::BelowMinimumTransition {
            minimum: min_transition,
            amount,
        });
    }
    Ok(())
}

/// shares worth at most `amount`, and what those shares are worth
fn quote_for_amount(pool: &PoolSnapshot, amount: u64) -> Result<ShareQuote> {
    let value = pool.total_value()?;
    let shares = to_amount(mul_div_floor(amount, pool.total_shares, value)?, "share quote")?;
    let amount = to_amount(mul_div_floor(shares, value, pool.total_shares)?, "share quote")?;
    Ok(ShareQuote { shares, amount })
}

/// quote a deposit of `amount`
///
/// `max_shares` bounds the shares minted and defaults to `amount`.
pub fn deposit(
    pool: &PoolSnapshot,
    amount: u64,
    max_shares: Option<u64>,
    min_transition: u64,
) -> Result<ShareQuote> {
    pool.validate()?;
    ensure_above_minimum(amount, min_transition)?;

    let quote = if pool.total_shares == 0 {
        // bootstrap mints one share per unit
        ShareQuote { shares: amount, amount }
    } else {
        quote_for_amount(pool, amount)?
    };

    if quote.shares == 0 {
        return Err(LendingError::BelowMinimumTransition {
            minimum: min_transition,
            amount: quote.amount,
        });
    }

    let bound = max_shares.unwrap_or(amount);
    if quote.shares > bound {
        return Err(LendingError::ExcessiveShareRequest {
            bound,
            requested: quote.shares,
        });
    }

    Ok(quote)
}

fn ensure_withdrawable(pool: &PoolSnapshot, quote: &ShareQuote) -> Result<()> {
    if quote.amount > pool.balance {
        return Err(LendingError::InsufficientPoolBalance {
            available: pool.balance,
            requested: quote.amount,
        });
    }
    Ok(())
}

/// quote burning `shares`
pub fn withdraw_shares(pool: &PoolSnapshot, shares: u64, min_transition: u64) -> Result<ShareQuote> {
    pool.validate()?;
    if shares > pool.total_shares {
        return Err(LendingError::ExcessiveShareRequest {
            bound: pool.total_shares,
            requested: shares,
        });
    }
    if pool.total_shares == 0 {
        return Err(LendingError::BelowMinimumTransition {
            minimum: min_transition,
            amount: 0,
        });
    }

    let value = pool.total_value()?;
    let amount = to_amount(mul_div_floor(shares, value, pool.total_shares)?, "withdrawal")?;
    ensure_above_minimum(amount, min_transition)?;

    let quote = ShareQuote { shares, amount };
    ensure_withdrawable(pool, &quote)?;
    Ok(quote)
}

/// quote withdrawing at most `amount`
pub fn withdraw_amount(pool: &PoolSnapshot, amount: u64, min_transition: u64) -> Result<ShareQuote> {
    pool.validate()?;
    ensure_above_minimum(amount, min_transition)?;

    if pool.total_shares == 0 {
        return Err(LendingError::ExcessiveShareRequest {
            bound: 0,
            requested: amount,
        });
    }

    let quote = quote_for_amount(pool, amount)?;
    if quote.shares == 0 {
        return Err(LendingError::BelowMinimumTransition {
            minimum: min_transition,
            amount: quote.amount,
        });
    }
    if quote.shares > pool.total_shares {
        return Err(LendingError::ExcessiveShareRequest {
            bound: pool.total_shares,
            requested: quote.shares,
        });
    }

    ensure_withdrawable(pool, &quote)?;
    Ok(quote)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AssetId;

    fn pool(balance: u64, lent_out: u64, total_shares: u64) -> PoolSnapshot {
        PoolSnapshot {
            balance,
            lent_out,
            total_shares,
            ..PoolSnapshot::open(AssetId::native(), AssetId::native(), "cfg")
        }
    }

    #[test]
    fn test_deposit_into_balanced_pool() {
        let p = pool(90_000_000, 0, 90_000_000);
        let quote = deposit(&p, 10_000_000, None, 200).unwrap();
        assert_eq!(quote, ShareQuote { shares: 10_000_000, amount: 10_000_000 });
    }

    #[test]
    fn test_deposit_two_step_floor() {
        // value 3, shares 2: 10 units buy ⌊20/3⌋ = 6 shares worth ⌊18/2⌋ = 9
        let p = pool(2, 1, 2);
        let quote = deposit(&p, 10, None, 0).unwrap();
        assert_eq!(quote, ShareQuote { shares: 6, amount: 9 });
    }

    #[test]
    fn test_bootstrap_deposit() {
        let p = pool(0, 0, 0);
        let quote = deposit(&p, 5_000, None, 200).unwrap();
        assert_eq!(quote, ShareQuote { shares: 5_000, amount: 5_000 });
    }

    #[test]
    fn test_deposit_below_minimum() {
        let p = pool(90_000_000, 0, 90_000_000);
        let err = deposit(&p, 200, None, 200).unwrap_err();
        assert!(matches!(err, LendingError::BelowMinimumTransition { .. }));
    }

    #[test]
    fn test_deposit_share_bound() {
        // shares are cheaper than one unit: 1_000 units buy 2_000 shares
        let p = pool(1_000, 0, 2_000);
        let err = deposit(&p, 1_000, None, 0).unwrap_err();
        assert_eq!(err, LendingError::ExcessiveShareRequest { bound: 1_000, requested: 2_000 });

        let quote = deposit(&p, 1_000, Some(2_000), 0).unwrap();
        assert_eq!(quote.shares, 2_000);
    }

    #[test]
    fn test_deposit_too_small_for_one_share() {
        let p = pool(1_000_000, 0, 1);
        let err = deposit(&p, 500, None, 0).unwrap_err();
        assert!(matches!(err, LendingError::BelowMinimumTransition { .. }));
    }

    #[test]
    fn test_withdraw_shares() {
        let p = pool(50_000_000, 50_000_000, 80_000_000);
        let quote = withdraw_shares(&p, 8_000_000, 200).unwrap();
        assert_eq!(quote.amount, 10_000_000);
    }

    #[test]
    fn test_withdraw_more_than_outstanding() {
        let p = pool(100, 0, 100);
        let err = withdraw_shares(&p, 101, 0).unwrap_err();
        assert_eq!(err, LendingError::ExcessiveShareRequest { bound: 100, requested: 101 });
    }

    #[test]
    fn test_withdraw_limited_by_idle_balance() {
        let p = pool(1_000, 99_000, 100_000);
        let err = withdraw_amount(&p, 5_000, 0).unwrap_err();
        assert!(matches!(err, LendingError::InsufficientPoolBalance { .. }));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_withdraw_amount_rounds_down() {
        // value 3, shares 2: asking for 2 burns ⌊4/3⌋ = 1 share worth ⌊3/2⌋ = 1
        let p = pool(3, 0, 2);
        let quote = withdraw_amount(&p, 2, 0).unwrap();
        assert_eq!(quote, ShareQuote { shares: 1, amount: 1 });
    }

    #[test]
    fn test_withdraw_from_empty_pool() {
        let p = pool(0, 0, 0);
        assert!(withdraw_amount(&p, 1_000, 0).is_err());
        assert!(withdraw_shares(&p, 1_000, 0).is_err());
    }
}
