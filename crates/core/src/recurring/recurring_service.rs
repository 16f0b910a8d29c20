use async_trait::async_trait;
use chrono::NaiveDate;
use log::{debug, error, info, warn};
use std::sync::Arc;
use uuid::Uuid;

use super::recurrence::{advance, find_due, occurrences_until};
use super::recurring_model::{
    NewRecurringTemplate, RecurrenceRunSummary, RecurringTemplateUpdate,
    RecurringTransactionTemplate,
};
use super::recurring_traits::{RecurrenceServiceTrait, RecurringTemplateRepositoryTrait};
use crate::clock::Clock;
use crate::errors::{Error, Result};
use crate::invoices::InvoiceServiceTrait;
use crate::transactions::{NewTransaction, Transaction};

/// Turns due recurring templates into transactions.
pub struct RecurrenceService {
    template_repository: Arc<dyn RecurringTemplateRepositoryTrait>,
    invoice_service: Arc<dyn InvoiceServiceTrait>,
    clock: Arc<dyn Clock>,
}

/// Outcome of catching one template up.
#[derive(Default)]
struct CatchUp {
    created: usize,
    assigned: usize,
    conflicted: bool,
}

impl RecurrenceService {
    pub fn new(
        template_repository: Arc<dyn RecurringTemplateRepositoryTrait>,
        invoice_service: Arc<dyn InvoiceServiceTrait>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            template_repository,
            invoice_service,
            clock,
        }
    }

    fn occurrence_of(template: &RecurringTransactionTemplate, due_date: NaiveDate) -> NewTransaction {
        NewTransaction {
            id: None,
            owner_id: template.owner_id.clone(),
            account_id: template.account_id.clone(),
            category_id: template.category_id.clone(),
            transaction_type: template.transaction_type,
            amount: template.amount,
            description: template.description.clone(),
            date: due_date,
            tags: template.tags.clone(),
            recurring_template_id: Some(template.id.clone()),
            invoice_id: None,
        }
    }

    /// Writes one occurrence and returns it with the advanced template.
    async fn materialize_one(
        &self,
        template: &RecurringTransactionTemplate,
        due_date: NaiveDate,
    ) -> Result<(Transaction, RecurringTransactionTemplate)> {
        if due_date != template.next_due_date {
            return Err(Error::Recurrence(format!(
                "Template {} is due on {}, not {}",
                template.id, template.next_due_date, due_date
            )));
        }

        let mut advanced = template.clone();
        advanced.next_due_date = advance(due_date, template.frequency, template.anchor_day())?;
        advanced.last_materialized_date = Some(due_date);
        advanced.updated_at = self.clock.now();

        let transaction = self
            .template_repository
            .record_occurrence(
                Self::occurrence_of(template, due_date),
                advanced.clone(),
                template.next_due_date,
            )
            .await?;
        Ok((transaction, advanced))
    }

    async fn catch_up(
        &self,
        template: &RecurringTransactionTemplate,
        as_of: NaiveDate,
    ) -> Result<CatchUp> {
        let mut outcome = CatchUp::default();
        let mut current = template.clone();

        for due_date in occurrences_until(template, as_of)? {
            let (transaction, advanced) = match self.materialize_one(&current, due_date).await {
                Ok(done) => done,
                Err(Error::Conflict(msg)) => {
                    debug!("Template {} changed elsewhere: {}", template.id, msg);
                    outcome.conflicted = true;
                    break;
                }
                Err(e) => return Err(e),
            };
            outcome.created += 1;
            current = advanced;

            match self.invoice_service.assign_transaction(&transaction).await {
                Ok(Some(_)) => outcome.assigned += 1,
                Ok(None) => {}
                Err(e) => warn!(
                    "Could not assign transaction {} to an invoice: {}",
                    transaction.id, e
                ),
            }
        }
        Ok(outcome)
    }
}

#[async_trait]
impl RecurrenceServiceTrait for RecurrenceService {
    async fn materialize(
        &self,
        template: &RecurringTransactionTemplate,
        due_date: NaiveDate,
    ) -> Result<Transaction> {
        let (transaction, _) = self.materialize_one(template, due_date).await?;
        Ok(transaction)
    }

    async fn process_due(&self, as_of: NaiveDate) -> Result<RecurrenceRunSummary> {
        let candidates = self.template_repository.list_due(as_of).await?;
        let mut summary = RecurrenceRunSummary::default();

        for template in find_due(&candidates, as_of) {
            summary.templates_processed += 1;
            match self.catch_up(template, as_of).await {
                Ok(outcome) => {
                    summary.transactions_created += outcome.created;
                    summary.transactions_assigned += outcome.assigned;
                    if outcome.conflicted {
                        summary.conflicts += 1;
                    }
                }
                Err(e) => {
                    error!("Failed to materialize template {}: {}", template.id, e);
                    summary.failures += 1;
                }
            }
        }

        info!(
            "Recurrence pass for {}: {} templates, {} transactions created, {} failures",
            as_of, summary.templates_processed, summary.transactions_created, summary.failures
        );
        Ok(summary)
    }

    async fn create_template(
        &self,
        new_template: NewRecurringTemplate,
    ) -> Result<RecurringTransactionTemplate> {
        new_template.validate()?;
        let now = self.clock.now();
        let template = RecurringTransactionTemplate {
            id: Uuid::new_v4().to_string(),
            owner_id: new_template.owner_id,
            account_id: new_template.account_id,
            category_id: new_template.category_id,
            transaction_type: new_template.transaction_type,
            amount: new_template.amount,
            description: new_template.description,
            frequency: new_template.frequency,
            start_date: new_template.start_date,
            end_date: new_template.end_date,
            day_of_month: new_template.day_of_month,
            tags: new_template.tags,
            next_due_date: new_template.start_date,
            last_materialized_date: None,
            is_active: true,
            is_deleted: false,
            created_at: now,
            updated_at: now,
        };
        self.template_repository.insert(template).await
    }

    async fn update_template(
        &self,
        update: RecurringTemplateUpdate,
    ) -> Result<RecurringTransactionTemplate> {
        let template = self.template_repository.get_by_id(&update.id).await?;
        update.validate(template.start_date)?;
        self.template_repository
            .update_terms(update, self.clock.now())
            .await
    }

    async fn deactivate_template(&self, template_id: &str) -> Result<RecurringTransactionTemplate> {
        let deactivated = self
            .template_repository
            .deactivate(template_id, self.clock.now())
            .await?;
        info!("Deactivated recurring template {}", template_id);
        Ok(deactivated)
    }

    async fn delete_template(&self, template_id: &str) -> Result<()> {
        self.template_repository.soft_delete(template_id).await
    }

    async fn get_template(&self, template_id: &str) -> Result<RecurringTransactionTemplate> {
        self.template_repository.get_by_id(template_id).await
    }

    async fn list_templates(&self, owner_id: &str) -> Result<Vec<RecurringTransactionTemplate>> {
        self.template_repository.list_by_owner(owner_id).await
    }
}
