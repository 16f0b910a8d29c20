//! Account repository trait.
//!
//! These traits define the contract for account operations without any
//! database-specific types, allowing for different storage implementations.

use async_trait::async_trait;

use super::accounts_model::{Account, AccountType, NewAccount};
use crate::errors::Result;

/// Trait defining the contract for Account repository operations.
#[async_trait]
pub trait AccountRepositoryTrait: Send + Sync {
    /// Creates a new account.
    async fn create(&self, new_account: NewAccount) -> Result<Account>;

    /// Replaces an existing account.
    async fn replace(&self, account: Account) -> Result<Account>;

    /// Marks an account as deleted.
    async fn soft_delete(&self, account_id: &str) -> Result<()>;

    /// Retrieves an account by its ID. Soft-deleted accounts are still returned.
    async fn get_by_id(&self, account_id: &str) -> Result<Account>;

    /// Lists the non-deleted accounts of one owner.
    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<Account>>;

    /// Lists active, non-deleted accounts of a given type across all owners.
    async fn list_active_by_type(&self, account_type: AccountType) -> Result<Vec<Account>>;
}
