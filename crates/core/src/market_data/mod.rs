//! Market data module - current price lookup for priced assets.

mod market_data_traits;
mod price_lookup;

pub use market_data_traits::MarketPriceLookupTrait;
pub use price_lookup::ProviderPriceLookup;
