//! SQLite storage implementation for investment positions and their ledger.

mod model;
mod repository;

pub use model::{InvestmentAssetDB, InvestmentTransactionDB};
pub use repository::InvestmentAssetRepository;
