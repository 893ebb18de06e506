use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{LendingError, Result};
use crate::types::AssetId;

/// side of the trade the pooled quote is priced for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    /// acquiring the asset with the unit of account, used for debts
    Buying,
    /// disposing of the asset for the unit of account, used for collateral
    Selling,
}

/// rational price: one unit of `asset` is worth `numerator / denominator`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregatedQuote {
    pub asset: AssetId,
    pub numerator: u64,
    pub denominator: u64,
    pub valid_until: DateTime<Utc>,
}

/// constant-product pool reserves
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PooledQuote {
    pub asset: AssetId,
    /// reserve of the priced asset
    pub reserve_asset: u64,
    /// reserve of the unit of account
    pub reserve_quote: u64,
    pub valid_until: DateTime<Utc>,
}

/// signed oracle observation, one variant per feed kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PriceFeed {
    Aggregated(Vec<AggregatedQuote>),
    Pooled(Vec<PooledQuote>),
}

impl PriceFeed {
    /// decode a feed from json; unknown tags are rejected
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| LendingError::InvalidFeedShape {
            message: e.to_string(),
        })
    }

    pub fn aggregated_quote(&self, asset: &AssetId) -> Option<&AggregatedQuote> {
        match self {
            PriceFeed::Aggregated(quotes) => quotes.iter().find(|q| &q.asset == asset),
            PriceFeed::Pooled(_) => None,
        }
    }

    pub fn pooled_quote(&self, asset: &AssetId) -> Option<&PooledQuote> {
        match self {
            PriceFeed::Pooled(quotes) => quotes.iter().find(|q| &q.asset == asset),
            PriceFeed::Aggregated(_) => None,
        }
    }

    /// expiry of the quote for `asset`
    pub fn valid_until(&self, asset: &AssetId) -> Option<DateTime<Utc>> {
        match self {
            PriceFeed::Aggregated(_) => self.aggregated_quote(asset).map(|q| q.valid_until),
            PriceFeed::Pooled(_) => self.pooled_quote(asset).map(|q| q.valid_until),
        }
    }

    pub fn contains(&self, asset: &AssetId) -> bool {
        self.valid_until(asset).is_some()
    }
}
