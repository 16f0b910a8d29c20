//! SQLite storage implementation for the Ledgerly engine.
//!
//! This crate provides all database-related functionality using Diesel ORM with SQLite.
//! It implements the repository traits defined in `ledgerly-core` and contains:
//! - Database connection pooling and the single-writer actor
//! - Diesel migrations
//! - Repository implementations for every ledger entity
//! - Database-specific model types (with Diesel derives)
//!
//! # Architecture
//!
//! ```text
//!   core (domain, services, scheduler)
//!                  │
//!                  ▼
//!          storage-sqlite (this crate)
//!                  │
//!                  ▼
//!              SQLite DB
//! ```
//!
//! Every multi-row write (closing an invoice and opening the next, recording a
//! payment with its transfer, materializing a recurring occurrence) runs as one
//! job on the writer actor, inside a single immediate transaction.

pub mod db;
pub mod errors;
pub mod schema;
pub mod utils;

// Repository implementations
pub mod accounts;
pub mod investments;
pub mod invoices;
pub mod recurring;
pub mod scheduler;
pub mod transactions;

#[cfg(test)]
pub(crate) mod test_support;

pub use db::{
    create_pool, get_connection, get_db_path, init, run_migrations, spawn_writer, DbConnection,
    DbPool, WriteHandle,
};

pub use errors::{IntoCore, StorageError};

pub use ledgerly_core::errors::{DatabaseError, Error, Result};

pub use accounts::AccountRepository;
pub use investments::InvestmentAssetRepository;
pub use invoices::InvoiceRepository;
pub use recurring::RecurringTemplateRepository;
pub use scheduler::SchedulerStateRepository;
pub use transactions::TransactionRepository;
