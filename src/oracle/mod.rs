pub mod feed;
pub mod resolver;

pub use feed::{AggregatedQuote, Direction, PooledQuote, PriceFeed};
pub use resolver::{asset_amount_for_value, asset_amount_or_raw, value_in_unit_of_account, value_or_raw};
