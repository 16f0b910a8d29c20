//! The jobs run by the background worker.

use async_trait::async_trait;
use chrono_tz::Tz;
use log::warn;
use std::sync::Arc;

use super::schedule::Slot;
use super::scheduler_traits::ScheduledJob;
use crate::errors::Result;
use crate::investments::{InvestmentAssetRepositoryTrait, InvestmentServiceTrait, PriceRefreshSummary};
use crate::invoices::InvoiceServiceTrait;
use crate::recurring::RecurrenceServiceTrait;
use crate::utils::time_utils::business_date_from_utc;

pub const RECURRENCE_JOB: &str = "recurrence";
pub const INVOICE_CLOSURE_JOB: &str = "invoice_closure";
pub const PRICE_REFRESH_JOB: &str = "price_refresh";

/// Materializes due recurring transactions, then closes invoices so the
/// closure sees them.
pub struct RecurrenceJob {
    recurrence_service: Arc<dyn RecurrenceServiceTrait>,
    invoice_service: Arc<dyn InvoiceServiceTrait>,
    time_zone: Tz,
}

impl RecurrenceJob {
    pub fn new(
        recurrence_service: Arc<dyn RecurrenceServiceTrait>,
        invoice_service: Arc<dyn InvoiceServiceTrait>,
        time_zone: Tz,
    ) -> Self {
        Self {
            recurrence_service,
            invoice_service,
            time_zone,
        }
    }
}

#[async_trait]
impl ScheduledJob for RecurrenceJob {
    fn name(&self) -> &'static str {
        RECURRENCE_JOB
    }

    async fn run(&self, slot: &Slot) -> Result<String> {
        let as_of = business_date_from_utc(slot.start, self.time_zone);
        let recurrence = self.recurrence_service.process_due(as_of).await?;
        let closure = self.invoice_service.close_due_invoices(as_of).await?;
        Ok(format!(
            "{} transactions from {} templates ({} failed); {} invoices closed",
            recurrence.transactions_created,
            recurrence.templates_processed,
            recurrence.failures,
            closure.invoices_closed
        ))
    }
}

/// Daily invoice closure and overdue marking.
pub struct InvoiceClosureJob {
    invoice_service: Arc<dyn InvoiceServiceTrait>,
    time_zone: Tz,
}

impl InvoiceClosureJob {
    pub fn new(invoice_service: Arc<dyn InvoiceServiceTrait>, time_zone: Tz) -> Self {
        Self {
            invoice_service,
            time_zone,
        }
    }
}

#[async_trait]
impl ScheduledJob for InvoiceClosureJob {
    fn name(&self) -> &'static str {
        INVOICE_CLOSURE_JOB
    }

    async fn run(&self, slot: &Slot) -> Result<String> {
        let as_of = business_date_from_utc(slot.start, self.time_zone);
        let closure = self.invoice_service.close_due_invoices(as_of).await?;
        let overdue = self.invoice_service.mark_overdue(as_of).await?;
        Ok(format!(
            "{} accounts, {} invoices closed, {} opened, {} overdue, {} failed",
            closure.accounts_processed,
            closure.invoices_closed,
            closure.invoices_opened,
            overdue,
            closure.failures
        ))
    }
}

/// Refreshes market prices of every owner's priced assets.
pub struct PriceRefreshJob {
    investment_service: Arc<dyn InvestmentServiceTrait>,
    asset_repository: Arc<dyn InvestmentAssetRepositoryTrait>,
}

impl PriceRefreshJob {
    pub fn new(
        investment_service: Arc<dyn InvestmentServiceTrait>,
        asset_repository: Arc<dyn InvestmentAssetRepositoryTrait>,
    ) -> Self {
        Self {
            investment_service,
            asset_repository,
        }
    }
}

#[async_trait]
impl ScheduledJob for PriceRefreshJob {
    fn name(&self) -> &'static str {
        PRICE_REFRESH_JOB
    }

    async fn run(&self, _slot: &Slot) -> Result<String> {
        let owners = self.asset_repository.list_owners_with_priced_assets().await?;
        let mut total = PriceRefreshSummary::default();
        for owner_id in &owners {
            match self.investment_service.refresh_market_prices(owner_id).await {
                Ok(summary) => total.merge(&summary),
                Err(e) => warn!("Price refresh failed for owner {}: {}", owner_id, e),
            }
        }
        Ok(format!(
            "{} owners, {} prices updated, {} failed, {} skipped",
            owners.len(),
            total.updated,
            total.failed,
            total.skipped
        ))
    }
}
