//! Cash transactions - models and repository trait.

mod transactions_model;
mod transactions_traits;

pub use transactions_model::{NewTransaction, Transaction, TransactionType};
pub use transactions_traits::TransactionRepositoryTrait;
