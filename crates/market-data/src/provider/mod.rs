//! Market data provider abstractions and implementations.
//!
//! This module contains:
//! - The `MarketDataProvider` trait that all providers implement
//! - `ProviderChain`, which tries providers in priority order
//! - Concrete provider implementations (Yahoo)

pub mod chain;
mod traits;
pub mod yahoo;

pub use traits::MarketDataProvider;
