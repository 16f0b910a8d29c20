use async_trait::async_trait;

use crate::errors::MarketDataError;
use crate::models::Quote;

/// A source of latest prices, e.g. Yahoo Finance.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Stable tag recorded as the quote source.
    fn id(&self) -> &'static str;

    /// Lower runs first in a [`ProviderChain`](crate::provider::chain::ProviderChain).
    fn priority(&self) -> u8 {
        10
    }

    async fn get_latest_quote(&self, symbol: &str) -> Result<Quote, MarketDataError>;
}
