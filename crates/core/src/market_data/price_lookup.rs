use std::sync::Arc;

use async_trait::async_trait;
use ledgerly_market_data::{MarketDataError, MarketDataProvider, RetryClass};
use log::debug;
use rust_decimal::Decimal;

use super::market_data_traits::MarketPriceLookupTrait;
use crate::errors::{Error, Result};

/// Price lookup backed by a market data provider (usually a `ProviderChain`).
pub struct ProviderPriceLookup {
    provider: Arc<dyn MarketDataProvider>,
}

impl ProviderPriceLookup {
    pub fn new(provider: Arc<dyn MarketDataProvider>) -> Self {
        Self { provider }
    }
}

fn to_core_error(err: MarketDataError) -> Error {
    match err.retry_class() {
        RetryClass::Never => Error::MarketData(err),
        RetryClass::NextProvider | RetryClass::RetryLater => Error::Transient(err.to_string()),
    }
}

#[async_trait]
impl MarketPriceLookupTrait for ProviderPriceLookup {
    async fn get_current_price(&self, ticker: &str) -> Result<Decimal> {
        let quote = self
            .provider
            .get_latest_quote(ticker)
            .await
            .map_err(to_core_error)?;
        debug!(
            "Quote for {} from {}: {} at {}",
            ticker, quote.source, quote.close, quote.timestamp
        );
        Ok(quote.close)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use ledgerly_market_data::Quote;
    use rust_decimal_macros::dec;

    struct FixedProvider {
        result: fn(&str) -> std::result::Result<Quote, MarketDataError>,
    }

    #[async_trait]
    impl MarketDataProvider for FixedProvider {
        fn id(&self) -> &'static str {
            "FIXED"
        }

        async fn get_latest_quote(&self, symbol: &str) -> std::result::Result<Quote, MarketDataError> {
            (self.result)(symbol)
        }
    }

    #[tokio::test]
    async fn test_returns_quote_close() {
        let lookup = ProviderPriceLookup::new(Arc::new(FixedProvider {
            result: |s| Ok(Quote::new(s, Utc::now(), dec!(37.25), "FIXED")),
        }));
        assert_eq!(lookup.get_current_price("ITSA4").await.unwrap(), dec!(37.25));
    }

    #[tokio::test]
    async fn test_unavailable_provider_is_transient() {
        let lookup = ProviderPriceLookup::new(Arc::new(FixedProvider {
            result: |_| {
                Err(MarketDataError::RateLimited {
                    provider: "FIXED".to_string(),
                })
            },
        }));
        let err = lookup.get_current_price("ITSA4").await.unwrap_err();
        assert!(matches!(err, Error::Transient(_)));
    }

    #[tokio::test]
    async fn test_unknown_symbol_is_not_transient() {
        let lookup = ProviderPriceLookup::new(Arc::new(FixedProvider {
            result: |s| Err(MarketDataError::SymbolNotFound(s.to_string())),
        }));
        let err = lookup.get_current_price("NOPE").await.unwrap_err();
        assert!(matches!(err, Error::MarketData(MarketDataError::SymbolNotFound(_))));
        assert!(!err.is_transient());
    }
}
