use async_trait::async_trait;
use chrono::NaiveDate;

use super::transactions_model::{NewTransaction, Transaction};
use crate::errors::Result;

/// Trait defining the contract for Transaction repository operations.
#[async_trait]
pub trait TransactionRepositoryTrait: Send + Sync {
    async fn insert(&self, new_transaction: NewTransaction) -> Result<Transaction>;

    async fn replace(&self, transaction: Transaction) -> Result<Transaction>;

    async fn soft_delete(&self, transaction_id: &str) -> Result<()>;

    async fn get_by_id(&self, transaction_id: &str) -> Result<Transaction>;

    /// Non-deleted transactions of one owner, newest first.
    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<Transaction>>;

    /// Non-deleted transactions of an account dated within `[start, end]`, oldest first.
    async fn list_by_account_and_date_range(
        &self,
        account_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Transaction>>;
}
