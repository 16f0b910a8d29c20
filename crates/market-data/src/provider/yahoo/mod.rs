//! Yahoo Finance market data provider.
//!
//! Fetches the latest traded price for equities, REITs, ETFs and
//! cryptocurrencies (e.g. `AAPL`, `HGLG11.SA`, `BTC-USD`).

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use tracing::{debug, warn};
use yahoo_finance_api as yahoo;

use crate::errors::MarketDataError;
use crate::models::Quote;
use crate::provider::MarketDataProvider;

const SOURCE: &str = "YAHOO";

pub struct YahooProvider {
    connector: yahoo::YahooConnector,
}

impl YahooProvider {
    pub fn new() -> Result<Self, MarketDataError> {
        yahoo::YahooConnector::new()
            .map(|connector| Self { connector })
            .map_err(|e| provider_error(format!("connector setup: {}", e)))
    }
}

fn provider_error(message: String) -> MarketDataError {
    MarketDataError::ProviderError {
        provider: SOURCE.to_string(),
        message,
    }
}

/// Converts a provider float into a non-negative decimal price.
fn price_from_f64(value: f64) -> Result<Decimal, MarketDataError> {
    if !value.is_finite() || value < 0.0 {
        return Err(MarketDataError::ValidationFailed {
            message: format!("close {} is not a price", value),
        });
    }
    Decimal::from_f64_retain(value)
        .map(|d| d.round_dp(8))
        .ok_or_else(|| MarketDataError::ValidationFailed {
            message: format!("close {} does not fit a decimal", value),
        })
}

fn quote_time(epoch_seconds: i64) -> Result<DateTime<Utc>, MarketDataError> {
    Utc.timestamp_opt(epoch_seconds, 0)
        .single()
        .ok_or_else(|| MarketDataError::ValidationFailed {
            message: format!("quote timestamp {} out of range", epoch_seconds),
        })
}

#[async_trait]
impl MarketDataProvider for YahooProvider {
    fn id(&self) -> &'static str {
        SOURCE
    }

    fn priority(&self) -> u8 {
        1
    }

    async fn get_latest_quote(&self, symbol: &str) -> Result<Quote, MarketDataError> {
        debug!("Yahoo latest quote for {}", symbol);

        let response = match self.connector.get_latest_quotes(symbol, "1d").await {
            Ok(response) => response,
            Err(yahoo::YahooError::NoQuotes | yahoo::YahooError::NoResult) => {
                return Err(MarketDataError::SymbolNotFound(symbol.to_string()))
            }
            Err(e) => return Err(provider_error(e.to_string())),
        };

        let last = response.last_quote().map_err(|e| {
            warn!("Yahoo returned no bars for {}: {}", symbol, e);
            MarketDataError::SymbolNotFound(symbol.to_string())
        })?;

        Ok(Quote::new(
            symbol,
            quote_time(last.timestamp as i64)?,
            price_from_f64(last.close)?,
            SOURCE,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_price_from_f64_accepts_regular_prices() {
        assert_eq!(price_from_f64(10.5).unwrap(), dec!(10.5));
        assert_eq!(price_from_f64(0.0).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn test_price_from_f64_rejects_invalid_values() {
        assert!(matches!(
            price_from_f64(-1.0),
            Err(MarketDataError::ValidationFailed { .. })
        ));
        assert!(price_from_f64(f64::NAN).is_err());
        assert!(price_from_f64(f64::INFINITY).is_err());
    }

    #[test]
    fn test_quote_time_from_epoch() {
        let t = quote_time(1_735_689_600).unwrap();
        assert_eq!(t, Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap());
    }
}
