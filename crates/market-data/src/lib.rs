//! Ledgerly Market Data Crate
//!
//! Provider-agnostic fetching of current market prices for the investment
//! positions tracked by the ledger.
//!
//! # Architecture
//!
//! ```text
//! +------------------+     +------------------+
//! |   Ledger core    | --> |  ProviderChain   |  (priority order, failover)
//! +------------------+     +------------------+
//!                                  |
//!                                  v
//!                          +------------------+
//!                          |    Provider      |  (Yahoo, ...)
//!                          +------------------+
//!                                  |
//!                                  v
//!                          +------------------+
//!                          |     Quote        |
//!                          +------------------+
//! ```
//!
//! Errors carry a [`RetryClass`] so callers can tell a bad ticker from a
//! provider that is only temporarily unavailable.

pub mod errors;
pub mod models;
pub mod provider;

pub use errors::{MarketDataError, RetryClass};
pub use models::Quote;
pub use provider::chain::ProviderChain;
pub use provider::yahoo::YahooProvider;
pub use provider::MarketDataProvider;
