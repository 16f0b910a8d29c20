use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::errors::Result;

/// Source of current market prices for priced investment assets.
#[async_trait]
pub trait MarketPriceLookupTrait: Send + Sync {
    /// Latest price for `ticker`.
    ///
    /// Returns `Error::Transient` when the price is only temporarily unavailable.
    async fn get_current_price(&self, ticker: &str) -> Result<Decimal>;
}
