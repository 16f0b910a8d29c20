//! Accounts module - domain models and the repository trait.

mod accounts_model;
mod accounts_traits;


// Re-export the public interface
pub use accounts_model::{Account, AccountType, BillingDays, NewAccount};
pub use accounts_traits::AccountRepositoryTrait;
