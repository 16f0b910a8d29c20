use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use super::recurring_model::{
    NewRecurringTemplate, RecurrenceRunSummary, RecurringTemplateUpdate,
    RecurringTransactionTemplate,
};
use crate::errors::Result;
use crate::transactions::{NewTransaction, Transaction};

/// Persistence contract for recurring templates.
#[async_trait]
pub trait RecurringTemplateRepositoryTrait: Send + Sync {
    async fn insert(
        &self,
        template: RecurringTransactionTemplate,
    ) -> Result<RecurringTransactionTemplate>;

    /// Writes the editable terms of `update` plus `updated_at`. The due
    /// pointer and the active flags keep their stored values.
    async fn update_terms(
        &self,
        update: RecurringTemplateUpdate,
        updated_at: DateTime<Utc>,
    ) -> Result<RecurringTransactionTemplate>;

    /// Clears `is_active` and stamps `updated_at`, nothing else.
    async fn deactivate(
        &self,
        template_id: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<RecurringTransactionTemplate>;

    async fn soft_delete(&self, template_id: &str) -> Result<()>;

    async fn get_by_id(&self, template_id: &str) -> Result<RecurringTransactionTemplate>;

    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<RecurringTransactionTemplate>>;

    /// Active, non-deleted templates with `next_due_date <= as_of`.
    async fn list_due(&self, as_of: NaiveDate) -> Result<Vec<RecurringTransactionTemplate>>;

    /// Inserts the materialized transaction and advances the template in one
    /// atomic write. Only `next_due_date`, `last_materialized_date` and
    /// `updated_at` are taken from `template`. The stored template must still
    /// be active, undeleted and due on `expected_next_due`; otherwise nothing
    /// is written and `Error::Conflict` is returned.
    async fn record_occurrence(
        &self,
        transaction: NewTransaction,
        template: RecurringTransactionTemplate,
        expected_next_due: NaiveDate,
    ) -> Result<Transaction>;
}

#[async_trait]
pub trait RecurrenceServiceTrait: Send + Sync {
    /// Materializes the occurrence due on `due_date` and advances the template.
    async fn materialize(
        &self,
        template: &RecurringTransactionTemplate,
        due_date: NaiveDate,
    ) -> Result<Transaction>;

    /// Materializes every pending occurrence of every due template.
    async fn process_due(&self, as_of: NaiveDate) -> Result<RecurrenceRunSummary>;

    async fn create_template(
        &self,
        new_template: NewRecurringTemplate,
    ) -> Result<RecurringTransactionTemplate>;

    async fn update_template(
        &self,
        update: RecurringTemplateUpdate,
    ) -> Result<RecurringTransactionTemplate>;

    async fn deactivate_template(&self, template_id: &str) -> Result<RecurringTransactionTemplate>;

    async fn delete_template(&self, template_id: &str) -> Result<()>;

    async fn get_template(&self, template_id: &str) -> Result<RecurringTransactionTemplate>;

    async fn list_templates(&self, owner_id: &str) -> Result<Vec<RecurringTransactionTemplate>>;
}
