use chrono::{DateTime, Utc};

use crate::errors::{LendingError, Result};
use crate::math::{mul_div_floor, to_amount};
use crate::oracle::feed::{AggregatedQuote, Direction, PooledQuote, PriceFeed};
use crate::types::AssetId;

/// swap fee of the pooled feed, as 997 / 1000
const SWAP_NUMERATOR: u128 = 997;
const SWAP_DENOMINATOR: u128 = 1000;

fn ensure_fresh(asset: &AssetId, valid_until: DateTime<Utc>, now: DateTime<Utc>) -> Result<()> {
    if now > valid_until {
        return Err(LendingError::OracleExpired {
            asset: asset.clone(),
            valid_until,
            now,
        });
    }
    Ok(())
}

fn priced_aggregated<'a>(feed: &'a PriceFeed, asset: &AssetId, now: DateTime<Utc>) -> Result<&'a AggregatedQuote> {
    let quote = feed
        .aggregated_quote(asset)
        .ok_or_else(|| LendingError::AssetNotInFeed { asset: asset.clone() })?;
    ensure_fresh(asset, quote.valid_until, now)?;
    if quote.numerator == 0 || quote.denominator == 0 {
        return Err(LendingError::DivisionByZero {
            operation: "aggregated price",
        });
    }
    Ok(quote)
}

fn priced_pooled<'a>(feed: &'a PriceFeed, asset: &AssetId, now: DateTime<Utc>) -> Result<&'a PooledQuote> {
    let quote = feed
        .pooled_quote(asset)
        .ok_or_else(|| LendingError::AssetNotInFeed { asset: asset.clone() })?;
    ensure_fresh(asset, quote.valid_until, now)?;
    if quote.reserve_asset == 0 || quote.reserve_quote == 0 {
        return Err(LendingError::DivisionByZero {
            operation: "pooled reserves",
        });
    }
    Ok(quote)
}

/// value of `amount` of `asset` in the unit of account
///
/// Pooled feeds price the trade against the reserves: buying pays the
/// amount needed to take `amount` out of the pool, selling receives what
/// putting `amount` in returns.
pub fn value_in_unit_of_account(
    feed: &PriceFeed,
    asset: &AssetId,
    amount: u64,
    direction: Direction,
    now: DateTime<Utc>,
) -> Result<u64> {
    let value = match feed {
        PriceFeed::Aggregated(_) => {
            let quote = priced_aggregated(feed, asset, now)?;
            mul_div_floor(amount, quote.numerator, quote.denominator)?
        }
        PriceFeed::Pooled(_) => {
            let quote = priced_pooled(feed, asset, now)?;
            let reserve_asset = u128::from(quote.reserve_asset);
            let reserve_quote = u128::from(quote.reserve_quote);
            let traded = u128::from(amount);

            match direction {
                Direction::Buying => {
                    if traded > reserve_asset {
                        return Err(LendingError::ReserveExhausted {
                            reserve: quote.reserve_asset,
                            requested: amount,
                        });
                    }
                    // draining the whole reserve leaves a zero divisor
                    let divisor = (reserve_asset - traded) * SWAP_NUMERATOR;
                    mul_div_floor(traded * SWAP_DENOMINATOR, reserve_quote, divisor)?
                }
                Direction::Selling => {
                    let divisor = reserve_asset * SWAP_DENOMINATOR + traded * SWAP_NUMERATOR;
                    mul_div_floor(traded * SWAP_NUMERATOR, reserve_quote, divisor)?
                }
            }
        }
    };

    to_amount(value, "oracle value")
}

/// amount of `asset` obtained by selling `value` units of account into the feed
pub fn asset_amount_for_value(
    feed: &PriceFeed,
    asset: &AssetId,
    value: u64,
    now: DateTime<Utc>,
) -> Result<u64> {
    let amount = match feed {
        PriceFeed::Aggregated(_) => {
            let quote = priced_aggregated(feed, asset, now)?;
            mul_div_floor(value, quote.denominator, quote.numerator)?
        }
        PriceFeed::Pooled(_) => {
            let quote = priced_pooled(feed, asset, now)?;
            let value = u128::from(value);
            let divisor =
                u128::from(quote.reserve_quote) * SWAP_DENOMINATOR + value * SWAP_NUMERATOR;
            mul_div_floor(value * SWAP_NUMERATOR, quote.reserve_asset, divisor)?
        }
    };

    to_amount(amount, "oracle inverse value")
}

/// value through `feed` when present, else one unit of account per unit
///
/// The native asset is the unit of account and never needs a quote.
pub fn value_or_raw(
    feed: Option<&PriceFeed>,
    asset: &AssetId,
    amount: u64,
    direction: Direction,
    now: DateTime<Utc>,
) -> Result<u64> {
    match feed {
        Some(feed) if !asset.is_native() => value_in_unit_of_account(feed, asset, amount, direction, now),
        _ => Ok(amount),
    }
}

/// inverse of [`value_or_raw`]
pub fn asset_amount_or_raw(
    feed: Option<&PriceFeed>,
    asset: &AssetId,
    value: u64,
    now: DateTime<Utc>,
) -> Result<u64> {
    match feed {
        Some(feed) if !asset.is_native() => asset_amount_for_value(feed, asset, value, now),
        _ => Ok(value),
    }
}
