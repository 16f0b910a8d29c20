//! Ledgerly Core - Domain entities, engines, services, and traits.
//!
//! This crate contains the financial consistency engine of the ledger:
//! weighted-average cost accounting for investment positions, the credit-card
//! invoice lifecycle and the recurrence scheduler, plus the worker that drives
//! them on a schedule. It is database-agnostic and defines traits that are
//! implemented by the `storage-sqlite` crate.

pub mod accounts;
pub mod clock;
pub mod constants;
pub mod errors;
pub mod investments;
pub mod invoices;
pub mod market_data;
pub mod recurring;
pub mod scheduler;
pub mod transactions;
pub mod utils;

#[cfg(test)]
pub(crate) mod testing;

// Re-export error types
pub use errors::Error;
pub use errors::Result;
