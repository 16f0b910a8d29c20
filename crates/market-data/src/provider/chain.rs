//! Ordered provider chain with failover.
//!
//! Providers are tried by ascending priority. A terminal error
//! (`RetryClass::Never`, e.g. unknown symbol) stops the chain; any other
//! failure falls through to the next provider.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::errors::{MarketDataError, RetryClass};
use crate::models::Quote;
use crate::provider::MarketDataProvider;

pub struct ProviderChain {
    providers: Vec<Arc<dyn MarketDataProvider>>,
}

impl ProviderChain {
    pub fn new(mut providers: Vec<Arc<dyn MarketDataProvider>>) -> Self {
        providers.sort_by_key(|p| p.priority());
        Self { providers }
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

#[async_trait]
impl MarketDataProvider for ProviderChain {
    fn id(&self) -> &'static str {
        "CHAIN"
    }

    async fn get_latest_quote(&self, symbol: &str) -> Result<Quote, MarketDataError> {
        if self.providers.is_empty() {
            return Err(MarketDataError::NoProvidersAvailable);
        }

        for provider in &self.providers {
            match provider.get_latest_quote(symbol).await {
                Ok(quote) => return Ok(quote),
                Err(e) if e.retry_class() == RetryClass::Never => {
                    debug!("{} returned terminal error for {}: {}", provider.id(), symbol, e);
                    return Err(e);
                }
                Err(e) => {
                    warn!("{} failed for {}: {}; trying next provider", provider.id(), symbol, e);
                }
            }
        }

        Err(MarketDataError::AllProvidersFailed(symbol.to_string()))
    }
}
